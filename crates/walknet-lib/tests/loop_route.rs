mod common;

use common::{engine_for, grid_coordinate, grid_store};
use walknet_lib::{Coordinate, Error, LoopRequest, RoutePreferences};

const SPACING_M: f64 = 100.0;

fn request(start: Coordinate, via: Coordinate, target_km: f64) -> LoopRequest {
    LoopRequest {
        start,
        via,
        target_km,
        tolerance_percent: None,
        preferences: RoutePreferences::default(),
    }
}

#[test]
fn estimate_rejects_via_points_that_are_too_close() {
    let engine = engine_for(grid_store(5, 20, SPACING_M));
    let estimate = engine
        .estimate_loop(
            grid_coordinate(2, 2, SPACING_M),
            grid_coordinate(2, 6, SPACING_M),
        )
        .unwrap();

    assert!(!estimate.feasible);
    assert!(estimate.message.contains("too close"));
    assert!(estimate.recommended_min_km.is_none());
    assert_eq!(estimate.straight_km, Some(0.4));
}

#[test]
fn estimate_recommends_range_above_minimal_loop() {
    let engine = engine_for(grid_store(5, 20, SPACING_M));
    let estimate = engine
        .estimate_loop(
            grid_coordinate(2, 2, SPACING_M),
            grid_coordinate(2, 12, SPACING_M),
        )
        .unwrap();

    assert!(estimate.feasible);
    let min_loop = estimate.min_loop_km.unwrap();
    let recommended_min = estimate.recommended_min_km.unwrap();
    assert!((min_loop - 2.0).abs() < 0.011);
    // Both sides are rounded to two decimals.
    assert!(recommended_min + 0.005 >= min_loop * 1.1);
    assert!((estimate.recommended_max_km.unwrap() - 7.0).abs() < 0.011);
    assert_eq!(estimate.straight_km, Some(1.0));
}

#[test]
fn estimate_reports_unreachable_via_as_infeasible() {
    let mut nodes = grid_store(3, 3, SPACING_M).nodes().to_vec();
    let mut edges = grid_store(3, 3, SPACING_M).edges().to_vec();
    let far = grid_coordinate(0, 20, SPACING_M);
    let farther = grid_coordinate(1, 20, SPACING_M);
    nodes.push(walknet_lib::RawNode::new("island-1", far.lat, far.lon));
    nodes.push(walknet_lib::RawNode::new("island-2", farther.lat, farther.lon));
    edges.push(walknet_lib::RawEdge::new("island", "island-1", "island-2", 100.0));
    let engine = engine_for(walknet_lib::MemoryStore::new(nodes, edges));

    let estimate = engine
        .estimate_loop(grid_coordinate(1, 1, SPACING_M), far)
        .unwrap();
    assert!(!estimate.feasible);
    assert_eq!(estimate.message, "no walkable path between start and via point");
}

#[test]
fn one_kilometer_axis_with_three_kilometer_target_uses_factor_point_six() {
    let engine = engine_for(grid_store(31, 31, SPACING_M));
    let start = grid_coordinate(15, 10, SPACING_M);
    let via = grid_coordinate(15, 20, SPACING_M);

    let route = engine.generate_loop(&request(start, via, 3.0)).unwrap();

    assert!((route.deviation_factor - 0.6).abs() < 1e-3);
    assert_eq!(route.segments.len(), 4);
    let labels: Vec<(&str, &str)> = route
        .segments
        .iter()
        .map(|s| (s.from.as_str(), s.to.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("start", "waypoint-a"),
            ("waypoint-a", "via"),
            ("via", "waypoint-b"),
            ("waypoint-b", "start"),
        ]
    );
    assert!(route.segments.iter().all(|s| s.node_count > 1));

    // Closed loop with no duplicated joints.
    assert_eq!(route.path.first().unwrap().id, route.path.last().unwrap().id);
    let expected_points: usize =
        route.segments.iter().map(|s| s.node_count).sum::<usize>() - 3;
    assert_eq!(route.path.len(), expected_points);
    assert!(route.path.windows(2).all(|w| w[0].id != w[1].id));

    let segment_total: f64 = route.segments.iter().map(|s| s.distance_km).sum();
    assert!((segment_total - route.actual_km).abs() < 0.03);
}

#[test]
fn short_target_is_accepted_within_tolerance() {
    let engine = engine_for(grid_store(31, 31, SPACING_M));
    let start = grid_coordinate(15, 10, SPACING_M);
    let via = grid_coordinate(15, 20, SPACING_M);

    // Below the bare there-and-back length, so the minimal factor applies.
    let mut req = request(start, via, 1.9);
    req.tolerance_percent = Some(30.0);
    let route = engine.generate_loop(&req).unwrap();

    assert!((route.deviation_factor - 0.1).abs() < 1e-12);
    assert!((route.actual_km - 2.4).abs() < 0.02);
    assert!(route.within_tolerance);
    assert_eq!(route.message, "loop generated within tolerance");
}

#[test]
fn missing_the_tolerance_still_returns_a_loop() {
    let engine = engine_for(grid_store(31, 31, SPACING_M));
    let start = grid_coordinate(15, 10, SPACING_M);
    let via = grid_coordinate(15, 20, SPACING_M);

    let mut req = request(start, via, 2.0);
    req.tolerance_percent = Some(0.0);
    let route = engine.generate_loop(&req).unwrap();

    assert!(!route.within_tolerance);
    assert!(route.message.starts_with("best-effort loop"));
    assert!(!route.path.is_empty());
    assert!(route.tolerance_km > 0.0);
}

#[test]
fn invalid_targets_are_rejected() {
    let engine = engine_for(grid_store(5, 20, SPACING_M));
    let start = grid_coordinate(2, 2, SPACING_M);
    let via = grid_coordinate(2, 12, SPACING_M);

    for target in [0.0, -1.0, f64::NAN] {
        let err = engine.generate_loop(&request(start, via, target)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }), "target {target}");
    }

    let mut negative = request(start, via, 3.0);
    negative.tolerance_percent = Some(-5.0);
    assert!(matches!(
        engine.generate_loop(&negative).unwrap_err(),
        Error::InvalidInput { .. }
    ));
}

#[test]
fn start_and_via_on_the_same_node_is_invalid() {
    let engine = engine_for(grid_store(5, 5, SPACING_M));
    let start = grid_coordinate(2, 2, SPACING_M);
    let err = engine.generate_loop(&request(start, start, 3.0)).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));
}

#[test]
fn unreachable_waypoint_names_the_failing_leg() {
    // Start and via on one row; the rows above and below are separate islands,
    // so the leg towards waypoint A cannot be walked.
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for row in 0..3 {
        for col in 0..11 {
            let at = grid_coordinate(row * 5, col, SPACING_M);
            nodes.push(walknet_lib::RawNode::new(common::grid_id(row, col), at.lat, at.lon));
            if col > 0 {
                edges.push(walknet_lib::RawEdge::new(
                    format!("{row}-{col}"),
                    common::grid_id(row, col - 1),
                    common::grid_id(row, col),
                    SPACING_M,
                ));
            }
        }
    }
    let engine = engine_for(walknet_lib::MemoryStore::new(nodes, edges));

    let err = engine
        .generate_loop(&request(
            grid_coordinate(5, 0, SPACING_M),
            grid_coordinate(5, 10, SPACING_M),
            3.0,
        ))
        .unwrap_err();

    match err {
        Error::PathNotFound { start, goal } => {
            assert_eq!(start, "start");
            assert_eq!(goal, "waypoint-a");
        }
        other => panic!("expected PathNotFound, got {other:?}"),
    }
}
