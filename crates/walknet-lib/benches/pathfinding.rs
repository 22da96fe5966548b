use criterion::{criterion_group, criterion_main, Criterion};
use once_cell::sync::Lazy;
use std::hint::black_box;
use std::sync::Arc;
use walknet_lib::geo::EARTH_RADIUS_M;
use walknet_lib::{
    build_graph, find_path, haversine_m, nearest_linear, Coordinate, DistanceCost, EngineConfig,
    Graph, LoopRequest, MemoryStore, RawEdge, RawNode, RoutePreferences, WalkEngine,
};

const ROWS: usize = 60;
const COLS: usize = 60;
const SPACING_M: f64 = 50.0;

fn cell(row: usize, col: usize) -> Coordinate {
    let meters_per_degree = EARTH_RADIUS_M.to_radians();
    Coordinate::new(
        37.5 + row as f64 * SPACING_M / meters_per_degree,
        127.0 + col as f64 * SPACING_M / (meters_per_degree * 37.5f64.to_radians().cos()),
    )
}

fn id(row: usize, col: usize) -> String {
    format!("{row:03}-{col:03}")
}

fn grid() -> MemoryStore {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for row in 0..ROWS {
        for col in 0..COLS {
            let here = cell(row, col);
            nodes.push(RawNode::new(id(row, col), here.lat, here.lon));
            if col + 1 < COLS {
                edges.push(RawEdge::new(
                    format!("h{row}-{col}"),
                    id(row, col),
                    id(row, col + 1),
                    haversine_m(here, cell(row, col + 1)),
                ));
            }
            if row + 1 < ROWS {
                edges.push(RawEdge::new(
                    format!("v{row}-{col}"),
                    id(row, col),
                    id(row + 1, col),
                    haversine_m(here, cell(row + 1, col)),
                ));
            }
        }
    }
    MemoryStore::new(nodes, edges)
}

static STORE: Lazy<MemoryStore> = Lazy::new(grid);
static GRAPH: Lazy<Graph> = Lazy::new(|| build_graph(&*STORE, 5_000).expect("grid builds").0);
static ENGINE: Lazy<WalkEngine> = Lazy::new(|| {
    WalkEngine::open(Arc::new(grid()), EngineConfig::default()).expect("engine builds")
});

fn benchmark_pathfinding(c: &mut Criterion) {
    let graph = &*GRAPH;

    c.bench_function("build_grid_60x60", |b| {
        b.iter(|| {
            let (graph, report) = build_graph(&*STORE, 5_000).expect("grid builds");
            black_box((graph.edge_count(), report.component_count))
        });
    });

    c.bench_function("dijkstra_corner_to_corner", |b| {
        let start = id(0, 0);
        let goal = id(ROWS - 1, COLS - 1);
        b.iter(|| {
            let path = find_path(graph, &start, &goal, &DistanceCost).expect("path exists");
            black_box(path.distance_m)
        });
    });

    c.bench_function("dijkstra_with_preferences", |b| {
        let start = id(5, 5);
        let goal = id(40, 50);
        let prefs = RoutePreferences {
            prefer_park: true,
            avoid_tunnel: true,
            ..RoutePreferences::default()
        };
        b.iter(|| {
            let path = find_path(graph, &start, &goal, &prefs).expect("path exists");
            black_box(path.settled)
        });
    });

    c.bench_function("nearest_linear_scan", |b| {
        let query = cell(31, 17);
        b.iter(|| black_box(nearest_linear(graph, query)));
    });

    c.bench_function("route_between_coordinates", |b| {
        let engine = &*ENGINE;
        b.iter(|| {
            let route = engine
                .shortest_path(cell(2, 3), cell(50, 44), &RoutePreferences::default())
                .expect("route exists");
            black_box(route.distance_meters)
        });
    });

    c.bench_function("generate_loop_3km", |b| {
        let engine = &*ENGINE;
        let request = LoopRequest {
            start: cell(30, 20),
            via: cell(30, 40),
            target_km: 3.0,
            tolerance_percent: None,
            preferences: RoutePreferences::default(),
        };
        b.iter(|| {
            let route = engine.generate_loop(&request).expect("loop generates");
            black_box(route.actual_km)
        });
    });
}

criterion_group!(benches, benchmark_pathfinding);
criterion_main!(benches);
