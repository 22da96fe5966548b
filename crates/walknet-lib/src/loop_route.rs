//! Closed walking loops through a via point.
//!
//! A loop is built from four shortest-path legs: start -> A -> via -> B ->
//! start. Waypoints A and B sit on either side of the start/via axis, pushed
//! off the midpoint by `straight distance * deviation factor`. The factor grows
//! with the distance the caller asks for beyond the bare there-and-back
//! minimum, which stretches the loop towards the target without an iterative
//! search. Routing straight there and back would reuse the same edges.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geo::{destination_point, haversine_m, initial_bearing, midpoint, Coordinate};
use crate::path::{
    find_path, path_points, walking_seconds, DistanceCost, PathPoint, RoutePreferences,
};
use crate::registry::Snapshot;

/// Start and via closer than this cannot form a meaningful loop.
pub const MIN_VIA_DISTANCE_M: f64 = 500.0;

/// Below this the start/via bearing is undefined.
pub const MIN_AXIS_DISTANCE_M: f64 = 1.0;

pub const MIN_DEVIATION_FACTOR: f64 = 0.1;
pub const MAX_DEVIATION_FACTOR: f64 = 1.5;

pub const START_LABEL: &str = "start";
pub const VIA_LABEL: &str = "via";
pub const WAYPOINT_A_LABEL: &str = "waypoint-a";
pub const WAYPOINT_B_LABEL: &str = "waypoint-b";

/// Feasibility report for a prospective loop.
///
/// Distances are kilometers rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopEstimate {
    pub feasible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_loop_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub straight_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_min_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_max_km: Option<f64>,
    pub message: String,
}

impl LoopEstimate {
    fn infeasible(straight_km: Option<f64>, message: &str) -> Self {
        Self {
            feasible: false,
            min_loop_km: None,
            straight_km: straight_km.map(round2),
            recommended_min_km: None,
            recommended_max_km: None,
            message: message.to_string(),
        }
    }
}

/// Input of [`generate_loop`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopRequest {
    pub start: Coordinate,
    pub via: Coordinate,
    pub target_km: f64,
    /// Accepted deviation as a percentage of the target; engine default when absent.
    #[serde(default)]
    pub tolerance_percent: Option<f64>,
    #[serde(default)]
    pub preferences: RoutePreferences,
}

/// One leg of a generated loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSegment {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub node_count: usize,
}

/// Auxiliary waypoints as computed geometrically, before snapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoopWaypoints {
    pub a: Coordinate,
    pub b: Coordinate,
}

/// Generated loop, returned whether or not it met the tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopRoute {
    pub actual_km: f64,
    pub target_km: f64,
    /// Absolute difference between actual and target.
    pub tolerance_km: f64,
    pub tolerance_percent: f64,
    pub within_tolerance: bool,
    pub deviation_factor: f64,
    pub waypoints: LoopWaypoints,
    pub path: Vec<PathPoint>,
    pub segments: Vec<LoopSegment>,
    pub estimated_seconds: u64,
    pub message: String,
}

/// How far the auxiliary waypoints are pushed off the start/via axis, as a
/// fraction of the straight distance. Always within `[0.1, 1.5]`.
pub fn deviation_factor(straight_km: f64, target_km: f64) -> f64 {
    let min_loop_km = 2.0 * straight_km;
    if target_km <= min_loop_km || straight_km <= 0.0 {
        return MIN_DEVIATION_FACTOR;
    }
    let extra_km = target_km - min_loop_km;
    let ratio = extra_km / straight_km;
    (0.2 + ratio * 0.4).min(MAX_DEVIATION_FACTOR)
}

/// Report whether a loop through `via` is possible and which target range
/// makes sense for it.
pub fn estimate_loop(snapshot: &Snapshot, start: Coordinate, via: Coordinate) -> LoopEstimate {
    let straight_m = haversine_m(start, via);
    let straight_km = straight_m / 1000.0;

    let (Ok(start_node), Ok(via_node)) = (
        snapshot.resolve(start, START_LABEL),
        snapshot.resolve(via, VIA_LABEL),
    ) else {
        return LoopEstimate::infeasible(None, "no nearby walkable network");
    };

    if straight_m < MIN_VIA_DISTANCE_M {
        return LoopEstimate::infeasible(
            Some(straight_km),
            "via point is too close to the start; keep them at least 500 m apart",
        );
    }

    let graph = &snapshot.graph;
    let outbound = find_path(graph, start_node.id.as_str(), via_node.id.as_str(), &DistanceCost);
    let inbound = find_path(graph, via_node.id.as_str(), start_node.id.as_str(), &DistanceCost);
    let (Some(outbound), Some(inbound)) = (outbound, inbound) else {
        return LoopEstimate::infeasible(
            Some(straight_km),
            "no walkable path between start and via point",
        );
    };

    let min_loop_km = (outbound.distance_m + inbound.distance_m) / 1000.0;
    let recommended_min_km = (min_loop_km * 1.1).max(straight_km * 2.5);
    let recommended_max_km = straight_km * 7.0;

    debug!(
        straight_km,
        min_loop_km, recommended_min_km, recommended_max_km, "estimated loop"
    );

    LoopEstimate {
        feasible: true,
        min_loop_km: Some(round2(min_loop_km)),
        straight_km: Some(round2(straight_km)),
        recommended_min_km: Some(round2(recommended_min_km)),
        recommended_max_km: Some(round2(recommended_max_km)),
        message: "loop route can be generated".to_string(),
    }
}

/// Build a loop of roughly `request.target_km`.
///
/// Fails fast when a point cannot be snapped to the network or a leg has no
/// path. Missing the tolerance is not an error: the loop is still returned
/// with `within_tolerance = false` and a best-effort message.
pub fn generate_loop(
    snapshot: &Snapshot,
    request: &LoopRequest,
    default_tolerance_percent: f64,
) -> Result<LoopRoute> {
    let target_km = request.target_km;
    if !target_km.is_finite() || target_km <= 0.0 {
        return Err(Error::invalid_input("target distance must be a positive number of kilometers"));
    }
    let tolerance_percent = request
        .tolerance_percent
        .unwrap_or(default_tolerance_percent);
    if !tolerance_percent.is_finite() || tolerance_percent < 0.0 {
        return Err(Error::invalid_input("tolerance percent must not be negative"));
    }

    let graph = &snapshot.graph;
    let start = snapshot.resolve(request.start, START_LABEL)?;
    let via = snapshot.resolve(request.via, VIA_LABEL)?;
    let p1 = node_coordinate(snapshot, &start.id)?;
    let p2 = node_coordinate(snapshot, &via.id)?;

    let straight_m = haversine_m(p1, p2);
    if straight_m < MIN_AXIS_DISTANCE_M {
        return Err(Error::invalid_input(
            "start and via resolve to the same place; choose a via point further away",
        ));
    }
    let straight_km = straight_m / 1000.0;

    let factor = deviation_factor(straight_km, target_km);
    let center = midpoint(p1, p2);
    let bearing = initial_bearing(p1, p2);
    let offset_m = straight_m * factor;
    let waypoints = LoopWaypoints {
        a: destination_point(center, bearing + 90.0, offset_m),
        b: destination_point(center, bearing - 90.0, offset_m),
    };

    let a = snapshot.resolve(waypoints.a, WAYPOINT_A_LABEL)?;
    let b = snapshot.resolve(waypoints.b, WAYPOINT_B_LABEL)?;

    let legs = [
        (&start.id, &a.id, START_LABEL, WAYPOINT_A_LABEL),
        (&a.id, &via.id, WAYPOINT_A_LABEL, VIA_LABEL),
        (&via.id, &b.id, VIA_LABEL, WAYPOINT_B_LABEL),
        (&b.id, &start.id, WAYPOINT_B_LABEL, START_LABEL),
    ];

    let mut nodes = Vec::new();
    let mut segments = Vec::with_capacity(legs.len());
    let mut actual_m = 0.0;
    for (from, to, from_label, to_label) in legs {
        let leg = find_path(graph, from.as_str(), to.as_str(), &request.preferences).ok_or_else(
            || Error::PathNotFound {
                start: from_label.to_string(),
                goal: to_label.to_string(),
            },
        )?;

        // Consecutive legs share their boundary node.
        let skip = usize::from(!nodes.is_empty());
        nodes.extend(leg.nodes.iter().skip(skip).cloned());
        actual_m += leg.distance_m;
        segments.push(LoopSegment {
            from: from_label.to_string(),
            to: to_label.to_string(),
            distance_km: round2(leg.distance_m / 1000.0),
            node_count: leg.nodes.len(),
        });
    }

    let actual_km = actual_m / 1000.0;
    let deviation_km = (actual_km - target_km).abs();
    let within_tolerance = deviation_km <= target_km * tolerance_percent / 100.0;
    let message = if within_tolerance {
        "loop generated within tolerance".to_string()
    } else {
        format!(
            "best-effort loop: {:.2} km is {:.2} km away from the {:.2} km target",
            actual_km, deviation_km, target_km
        )
    };

    debug!(
        target_km,
        actual_km,
        factor,
        within_tolerance,
        nodes = nodes.len(),
        "generated loop"
    );

    Ok(LoopRoute {
        actual_km: round2(actual_km),
        target_km,
        tolerance_km: round2(deviation_km),
        tolerance_percent,
        within_tolerance,
        deviation_factor: factor,
        waypoints,
        path: path_points(graph, &nodes),
        segments,
        estimated_seconds: walking_seconds(actual_m),
        message,
    })
}

fn node_coordinate(snapshot: &Snapshot, id: &crate::id::NodeId) -> Result<Coordinate> {
    snapshot
        .graph
        .node(id.as_str())
        .map(|node| node.coordinate)
        .ok_or_else(|| Error::NodeResolutionFailed {
            point: id.to_string(),
        })
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
