//! Fixtures for handler tests: a small in-memory grid network.
//!
//! The grid has [`GRID_ROWS`] x [`GRID_COLS`] nodes spaced [`GRID_SPACING_M`]
//! apart, south-west corner at (37.5, 127.0). Rows go north, columns east.

use std::sync::{Arc, OnceLock};

use walknet_lib::geo::EARTH_RADIUS_M;
use walknet_lib::{
    haversine_m, Coordinate, EngineConfig, MemoryStore, RawEdge, RawNode, WalkEngine,
};

use crate::state::AppState;

pub const GRID_ROWS: usize = 9;
pub const GRID_COLS: usize = 21;
pub const GRID_SPACING_M: f64 = 100.0;

static TEST_STATE: OnceLock<AppState> = OnceLock::new();

/// Coordinate of grid cell (`row`, `col`).
pub fn grid_point(row: usize, col: usize) -> Coordinate {
    let meters_per_degree = EARTH_RADIUS_M.to_radians();
    Coordinate::new(
        37.5 + row as f64 * GRID_SPACING_M / meters_per_degree,
        127.0 + col as f64 * GRID_SPACING_M / (meters_per_degree * 37.5f64.to_radians().cos()),
    )
}

pub fn grid_node_id(row: usize, col: usize) -> String {
    format!("{row:03}-{col:03}")
}

pub fn grid_store() -> MemoryStore {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            let here = grid_point(row, col);
            nodes.push(RawNode::new(grid_node_id(row, col), here.lat, here.lon).with_district("grid"));
            if col + 1 < GRID_COLS {
                edges.push(RawEdge::new(
                    format!("h{row}-{col}"),
                    grid_node_id(row, col),
                    grid_node_id(row, col + 1),
                    haversine_m(here, grid_point(row, col + 1)),
                ));
            }
            if row + 1 < GRID_ROWS {
                edges.push(RawEdge::new(
                    format!("v{row}-{col}"),
                    grid_node_id(row, col),
                    grid_node_id(row + 1, col),
                    haversine_m(here, grid_point(row + 1, col)),
                ));
            }
        }
    }
    MemoryStore::new(nodes, edges)
}

/// Fresh state over its own grid engine; use when a test rebuilds.
///
/// # Panics
///
/// Panics if the grid fails to build, which indicates a broken fixture.
pub fn fresh_state() -> AppState {
    let engine = WalkEngine::open(Arc::new(grid_store()), EngineConfig::default())
        .unwrap_or_else(|e| panic!("grid fixture failed to build: {e}"));
    AppState::from_engine(engine)
}

/// Shared state over the grid, built once per test binary.
pub fn test_state() -> AppState {
    TEST_STATE.get_or_init(fresh_state).clone()
}

/// State whose engine has no snapshot yet.
pub fn unready_state() -> AppState {
    AppState::from_engine(WalkEngine::new(
        Arc::new(MemoryStore::new(Vec::new(), Vec::new())),
        EngineConfig::default(),
    ))
}

pub fn test_request_id() -> String {
    format!("test-{}", crate::RequestId::generate())
}
