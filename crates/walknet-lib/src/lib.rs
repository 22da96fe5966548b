//! walknet library entry points.
//!
//! This crate builds an in-memory walking-network graph from a paged node/link
//! catalog, resolves coordinates to connected nodes, answers shortest-path
//! queries under routing preferences, and plans closed walking loops of a
//! requested length. Higher-level consumers (CLI, HTTP service) should go
//! through [`WalkEngine`] instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod graph;
pub mod id;
pub mod loop_route;
pub mod nearest;
pub mod network;
pub mod path;
pub mod registry;
pub mod sqlite;

pub use config::EngineConfig;
pub use engine::{RouteResult, WalkEngine};
pub use error::{Error, Result};
pub use geo::{haversine_m, Coordinate};
pub use graph::{build_graph, BuildReport, Edge, Graph, GraphBuilder, GraphStats, Node};
pub use id::{normalize_id, NodeId};
pub use loop_route::{
    deviation_factor, estimate_loop, generate_loop, LoopEstimate, LoopRequest, LoopRoute,
    LoopSegment,
};
pub use nearest::{nearest_linear, NearestNode, NearestNodeResolver, ResolverKind};
pub use network::{FacilityFlags, MemoryStore, NetworkStore, Page, PageRequest, RawEdge, RawNode};
pub use path::{find_path, find_path_observed, CostModel, DistanceCost, PathPoint, PathResult, RoutePreferences};
pub use registry::{GraphRegistry, Snapshot};
pub use sqlite::SqliteStore;
