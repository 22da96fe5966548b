use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::{Edge, Graph};
use crate::id::NodeId;
use crate::network::FacilityFlags;

pub const PARK_MULTIPLIER: f64 = 0.7;
pub const OVERPASS_MULTIPLIER: f64 = 1.5;
pub const TUNNEL_MULTIPLIER: f64 = 1.5;
pub const INDOOR_MULTIPLIER: f64 = 0.8;

/// Walking speed used for duration estimates (4 km/h).
pub const WALKING_SPEED_MPS: f64 = 1.11;

/// Per-edge search cost.
///
/// Costs must be positive and finite for the search to stay correct.
pub trait CostModel {
    fn edge_cost(&self, edge: &Edge) -> f64;
}

/// Plain physical distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceCost;

impl CostModel for DistanceCost {
    fn edge_cost(&self, edge: &Edge) -> f64 {
        edge.distance_m
    }
}

/// Routing preferences. Every applicable multiplier is applied, so a park
/// edge inside a tunnel costs `0.7 * 1.5` of its length when both
/// `prefer_park` and `avoid_tunnel` are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutePreferences {
    pub prefer_park: bool,
    pub avoid_overpass: bool,
    pub avoid_tunnel: bool,
    pub prefer_indoor: bool,
}

impl RoutePreferences {
    pub fn modifier(&self, flags: &FacilityFlags) -> f64 {
        let mut factor = 1.0;
        if self.prefer_park && flags.park {
            factor *= PARK_MULTIPLIER;
        }
        if self.avoid_overpass && flags.overpass {
            factor *= OVERPASS_MULTIPLIER;
        }
        if self.avoid_tunnel && flags.tunnel {
            factor *= TUNNEL_MULTIPLIER;
        }
        if self.prefer_indoor && flags.building {
            factor *= INDOOR_MULTIPLIER;
        }
        factor
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

impl CostModel for RoutePreferences {
    fn edge_cost(&self, edge: &Edge) -> f64 {
        edge.distance_m * self.modifier(&edge.flags)
    }
}

/// Outcome of a successful search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    pub nodes: Vec<NodeId>,
    /// Sum of unmodified link lengths along `nodes`.
    pub distance_m: f64,
    /// Sum of modified edge costs; equals `distance_m` without preferences.
    pub cost: f64,
    /// Nodes finalized before the goal was reached.
    pub settled: usize,
}

/// Coordinate of one node along a returned path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathPoint {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

/// Attach coordinates to a node sequence. Ids missing from `graph` are skipped.
pub fn path_points(graph: &Graph, nodes: &[NodeId]) -> Vec<PathPoint> {
    nodes
        .iter()
        .filter_map(|id| graph.node(id.as_str()))
        .map(|node| PathPoint {
            id: node.id.clone(),
            lat: node.coordinate.lat,
            lon: node.coordinate.lon,
        })
        .collect()
}

/// Seconds needed to walk `distance_m`, rounded to the nearest second.
pub fn walking_seconds(distance_m: f64) -> u64 {
    (distance_m / WALKING_SPEED_MPS).round() as u64
}

/// Lowest-cost path from `start` to `goal`, or `None` when either node is
/// unknown or the two lie in different components.
pub fn find_path(
    graph: &Graph,
    start: &str,
    goal: &str,
    cost: &dyn CostModel,
) -> Option<PathResult> {
    find_path_observed(graph, start, goal, cost, |_, _| {})
}

/// Same search as [`find_path`], calling `observer` with each node as it is
/// finalized together with its final cost.
pub fn find_path_observed<F>(
    graph: &Graph,
    start: &str,
    goal: &str,
    cost: &dyn CostModel,
    mut observer: F,
) -> Option<PathResult>
where
    F: FnMut(&NodeId, f64),
{
    let start = &graph.node(start)?.id;
    let goal = &graph.node(goal)?.id;

    let mut best: HashMap<&NodeId, f64> = HashMap::new();
    let mut parents: HashMap<&NodeId, (&NodeId, f64)> = HashMap::new();
    let mut settled: HashSet<&NodeId> = HashSet::new();
    let mut queue = BinaryHeap::new();

    best.insert(start, 0.0);
    queue.push(QueueEntry::new(start, 0.0));

    while let Some(entry) = queue.pop() {
        if settled.contains(entry.node) {
            continue;
        }
        if let Some(&recorded) = best.get(entry.node) {
            if entry.cost.0 > recorded {
                continue;
            }
        }

        settled.insert(entry.node);
        observer(entry.node, entry.cost.0);

        if entry.node == goal {
            let (nodes, distance_m) = reconstruct_path(&parents, start, goal);
            return Some(PathResult {
                nodes,
                distance_m,
                cost: entry.cost.0,
                settled: settled.len(),
            });
        }

        for edge in graph.edges(entry.node.as_str()) {
            let next = &edge.target;
            if settled.contains(next) {
                continue;
            }

            let next_cost = entry.cost.0 + cost.edge_cost(edge);
            if next_cost < *best.get(next).unwrap_or(&f64::INFINITY) {
                best.insert(next, next_cost);
                parents.insert(next, (entry.node, edge.distance_m));
                queue.push(QueueEntry::new(next, next_cost));
            }
        }
    }

    None
}

fn reconstruct_path(
    parents: &HashMap<&NodeId, (&NodeId, f64)>,
    start: &NodeId,
    goal: &NodeId,
) -> (Vec<NodeId>, f64) {
    let mut path = vec![goal.clone()];
    let mut distance = 0.0;
    let mut current = goal;
    while current != start {
        let Some(&(parent, length)) = parents.get(current) else {
            break;
        };
        distance += length;
        path.push(parent.clone());
        current = parent;
    }
    path.reverse();
    (path, distance)
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct QueueEntry<'a> {
    node: &'a NodeId,
    cost: FloatOrd,
}

impl<'a> QueueEntry<'a> {
    fn new(node: &'a NodeId, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost, and the
        // lexicographically smaller id wins among equal costs.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(self.node))
    }
}

impl PartialOrd for QueueEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
