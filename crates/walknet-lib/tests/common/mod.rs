//! Shared fixtures for integration tests: synthetic walking networks and
//! SQLite catalogs in temporary directories.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use walknet_lib::geo::EARTH_RADIUS_M;
use walknet_lib::{
    haversine_m, Coordinate, EngineConfig, MemoryStore, RawEdge, RawNode, SqliteStore, WalkEngine,
};

/// South-west corner of synthetic grids (central Seoul).
pub const GRID_ORIGIN: Coordinate = Coordinate::new(37.5, 127.0);

/// A–B=100, A–C=150, B–D=100, C–D=100.
#[allow(dead_code)]
pub fn diamond_store() -> MemoryStore {
    MemoryStore::new(
        vec![
            RawNode::new("A", 37.5000, 127.0000),
            RawNode::new("B", 37.5009, 127.0000),
            RawNode::new("C", 37.5000, 127.0017),
            RawNode::new("D", 37.5009, 127.0011),
        ],
        vec![
            RawEdge::new("ab", "A", "B", 100.0),
            RawEdge::new("ac", "A", "C", 150.0),
            RawEdge::new("bd", "B", "D", 100.0),
            RawEdge::new("cd", "C", "D", 100.0),
        ],
    )
}

/// Two linked pairs far apart: {A, B} and {C, D}.
#[allow(dead_code)]
pub fn disconnected_store() -> MemoryStore {
    MemoryStore::new(
        vec![
            RawNode::new("A", 37.50, 127.00),
            RawNode::new("B", 37.501, 127.00),
            RawNode::new("C", 37.60, 127.10),
            RawNode::new("D", 37.601, 127.10),
        ],
        vec![
            RawEdge::new("ab", "A", "B", 111.0),
            RawEdge::new("cd", "C", "D", 111.0),
        ],
    )
}

#[allow(dead_code)]
pub fn grid_id(row: usize, col: usize) -> String {
    format!("{row:03}-{col:03}")
}

/// Coordinate of grid cell (`row`, `col`); rows go north, columns east.
#[allow(dead_code)]
pub fn grid_coordinate(row: usize, col: usize, spacing_m: f64) -> Coordinate {
    let meters_per_degree = EARTH_RADIUS_M.to_radians();
    let d_lat = spacing_m / meters_per_degree;
    let d_lon = spacing_m / (meters_per_degree * GRID_ORIGIN.lat.to_radians().cos());
    Coordinate::new(
        GRID_ORIGIN.lat + row as f64 * d_lat,
        GRID_ORIGIN.lon + col as f64 * d_lon,
    )
}

/// Fully connected 4-neighbour grid; link lengths are the haversine distance
/// between their endpoints.
#[allow(dead_code)]
pub fn grid_store(rows: usize, cols: usize, spacing_m: f64) -> MemoryStore {
    let mut nodes = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let at = grid_coordinate(row, col, spacing_m);
            nodes.push(RawNode::new(grid_id(row, col), at.lat, at.lon).with_district("grid"));
        }
    }

    let mut edges = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            let here = grid_coordinate(row, col, spacing_m);
            if col + 1 < cols {
                let east = grid_coordinate(row, col + 1, spacing_m);
                edges.push(RawEdge::new(
                    format!("h{row}-{col}"),
                    grid_id(row, col),
                    grid_id(row, col + 1),
                    haversine_m(here, east),
                ));
            }
            if row + 1 < rows {
                let north = grid_coordinate(row + 1, col, spacing_m);
                edges.push(RawEdge::new(
                    format!("v{row}-{col}"),
                    grid_id(row, col),
                    grid_id(row + 1, col),
                    haversine_m(here, north),
                ));
            }
        }
    }

    MemoryStore::new(nodes, edges)
}

#[allow(dead_code)]
pub fn engine_for(store: MemoryStore) -> WalkEngine {
    WalkEngine::open(Arc::new(store), EngineConfig::default()).expect("engine builds")
}

/// Copy `store` into a fresh SQLite catalog. Keep the returned `TempDir`
/// alive for as long as the path is used.
#[allow(dead_code)]
pub fn sqlite_catalog(store: &MemoryStore) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("network.db");
    let catalog = SqliteStore::initialize(&path).expect("initialize catalog");
    catalog.insert_nodes(store.nodes()).expect("insert nodes");
    catalog.insert_edges(store.edges()).expect("insert edges");
    (dir, path)
}
