mod common;

use std::sync::Arc;

use common::{diamond_store, grid_store, sqlite_catalog};
use walknet_lib::{
    build_graph, Coordinate, EngineConfig, Error, GraphRegistry, MemoryStore, NetworkStore,
    RawEdge, RawNode, ResolverKind, SqliteStore, WalkEngine,
};

fn messy_store() -> MemoryStore {
    let mut nodes = vec![
        RawNode::new("100", 37.50, 127.00).with_district("Jongno-gu"),
        RawNode::new("101.0", 37.501, 127.00).with_district("Jongno-gu"),
        RawNode::new("102", 37.502, 127.00).with_district("Jung-gu"),
        RawNode::new("103", 37.503, 127.00).with_district("Jung-gu"),
    ];
    // Same node emitted again by the feed as a float.
    nodes.push(RawNode::new("100.0", 10.0, 10.0));

    let mut no_length = RawEdge::new("l5", "100", "103", 1.0);
    no_length.distance_meters = None;

    let edges = vec![
        RawEdge::new("l1", "100", "101", 111.0),
        RawEdge::new("l2", "101", "102.0", 111.0),
        RawEdge::new("l3", "102", "999", 111.0),
        RawEdge::new("l4", "102", "103", 0.0),
        no_length,
        RawEdge::new("l6", "103", "103.0", 20.0),
        RawEdge::new("l7", "1.03E2", "102", 111.0),
    ];
    MemoryStore::new(nodes, edges)
}

#[test]
fn every_accepted_link_is_stored_in_both_directions() {
    let store = messy_store();
    let (graph, report) = build_graph(&store, 2).expect("build succeeds");

    assert_eq!(report.link_count, 3);
    assert_eq!(graph.edge_count(), 6);

    for (u, v, d) in [("100", "101", 111.0), ("101", "102", 111.0), ("103", "102", 111.0)] {
        assert!(
            graph.edges(u).iter().any(|e| e.target.as_str() == v && e.distance_m == d),
            "missing {u} -> {v}"
        );
        assert!(
            graph.edges(v).iter().any(|e| e.target.as_str() == u && e.distance_m == d),
            "missing {v} -> {u}"
        );
    }
}

#[test]
fn edge_targets_always_exist_as_nodes() {
    let (graph, _) = build_graph(&messy_store(), 3).expect("build succeeds");
    for node in graph.nodes() {
        for edge in graph.edges(node.id.as_str()) {
            assert!(graph.node(edge.target.as_str()).is_some());
        }
    }
}

#[test]
fn rejections_and_duplicates_are_counted() {
    let (graph, report) = build_graph(&messy_store(), 100).expect("build succeeds");

    assert_eq!(report.duplicate_nodes, 1);
    assert_eq!(graph.node("100").unwrap().coordinate.lat, 37.50);
    assert_eq!(report.rejected_edges.missing_endpoint, 1);
    assert_eq!(report.rejected_edges.invalid_distance, 2);
    assert_eq!(report.rejected_edges.self_loop, 1);
    assert_eq!(report.component_count, 1);
    assert_eq!(report.largest_component_size, 4);
}

#[test]
fn page_size_does_not_change_the_result() {
    let store = grid_store(6, 7, 80.0);
    let (small, small_report) = build_graph(&store, 1).unwrap();
    let (large, large_report) = build_graph(&store, 5_000).unwrap();

    assert_eq!(small.node_count(), large.node_count());
    assert_eq!(small.edge_count(), large.edge_count());
    assert_eq!(small_report.rejected_edges, large_report.rejected_edges);
    assert_eq!(small_report.degree_histogram, large_report.degree_histogram);
}

#[test]
fn rebuild_is_idempotent() {
    let registry = GraphRegistry::new();
    let config = EngineConfig::default().with_page_size(3);
    let store = messy_store();

    let first = registry.rebuild(&store, &config).unwrap();
    let second = registry.rebuild(&store, &config).unwrap();

    assert_eq!(first.node_count, second.node_count);
    assert_eq!(first.edge_count, second.edge_count);
    assert_eq!(first.rejected_edges, second.rejected_edges);
    assert_eq!(first.component_count, second.component_count);
}

#[test]
fn grid_degree_histogram() {
    let (_, report) = build_graph(&grid_store(3, 3, 100.0), 10).unwrap();
    // Four corners, four edge midpoints, one centre.
    assert_eq!(report.degree_histogram.get(&2), Some(&4));
    assert_eq!(report.degree_histogram.get(&3), Some(&4));
    assert_eq!(report.degree_histogram.get(&4), Some(&1));
    assert_eq!(report.isolated_nodes, 0);
}

#[test]
fn sqlite_catalog_builds_the_same_graph() {
    let store = diamond_store();
    let (_dir, path) = sqlite_catalog(&store);
    let catalog = SqliteStore::open(&path).expect("catalog opens");

    let (from_sqlite, sqlite_report) = build_graph(&catalog, 2).unwrap();
    let (from_memory, memory_report) = build_graph(&store, 2).unwrap();

    assert_eq!(from_sqlite.node_count(), from_memory.node_count());
    assert_eq!(from_sqlite.edge_count(), from_memory.edge_count());
    assert_eq!(sqlite_report.rejected_edges, memory_report.rejected_edges);
    assert_eq!(from_sqlite.edges("C").len(), 2);
}

#[test]
fn failing_store_leaves_previous_snapshot_queryable() {
    struct FlakyStore {
        inner: MemoryStore,
        fail: std::sync::atomic::AtomicBool,
    }

    impl NetworkStore for FlakyStore {
        fn node_page(
            &self,
            request: walknet_lib::PageRequest,
        ) -> walknet_lib::Result<walknet_lib::Page<RawNode>> {
            self.inner.node_page(request)
        }

        fn edge_page(
            &self,
            request: walknet_lib::PageRequest,
        ) -> walknet_lib::Result<walknet_lib::Page<RawEdge>> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(Error::Io(std::io::Error::other("connection reset")));
            }
            self.inner.edge_page(request)
        }
    }

    let store = Arc::new(FlakyStore {
        inner: diamond_store(),
        fail: std::sync::atomic::AtomicBool::new(false),
    });
    let engine = walknet_lib::WalkEngine::open(store.clone(), EngineConfig::default()).unwrap();
    let before = engine.stats().unwrap();

    store.fail.store(true, std::sync::atomic::Ordering::SeqCst);
    let err = engine.rebuild().unwrap_err();
    assert!(!err.is_recoverable());

    assert_eq!(engine.stats().unwrap(), before);
}

#[test]
fn kd_tree_engine_builds_with_stacked_nodes() {
    // Forty crossings exported at one position, each linked to its own partner.
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for i in 0..40 {
        nodes.push(RawNode::new(format!("{}", 1000 + i), 37.5, 127.0));
        nodes.push(RawNode::new(format!("{}", 2000 + i), 37.5 + 0.0005 * (i + 1) as f64, 127.0));
        edges.push(RawEdge::new(
            format!("l{i}"),
            format!("{}", 1000 + i),
            format!("{}", 2000 + i),
            55.5 * (i + 1) as f64,
        ));
    }
    let store = Arc::new(MemoryStore::new(nodes, edges));
    let config = EngineConfig::default().with_resolver(ResolverKind::KdTree);

    let engine = WalkEngine::open(store, config).expect("stacked nodes build");
    let report = engine.rebuild().expect("stacked nodes rebuild");
    assert_eq!(report.node_count, 80);

    let snapshot = engine.snapshot().unwrap();
    let found = snapshot
        .resolver
        .nearest(&snapshot.graph, Coordinate::new(37.5, 127.0))
        .expect("a connected node");
    assert_eq!(found.id.as_str(), "1000");
}
