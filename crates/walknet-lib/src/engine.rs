use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::graph::{BuildReport, GraphStats, Node};
use crate::id::NodeId;
use crate::loop_route::{self, LoopEstimate, LoopRequest, LoopRoute};
use crate::network::NetworkStore;
use crate::path::{find_path, path_points, walking_seconds, PathPoint, RoutePreferences};
use crate::registry::{GraphRegistry, Snapshot};

/// Point-to-point route between two coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub distance_meters: f64,
    pub estimated_seconds: u64,
    pub path: Vec<PathPoint>,
}

/// Query and rebuild surface over one network catalog.
///
/// All queries run synchronously on the calling thread against the snapshot
/// that is live when they start.
pub struct WalkEngine {
    store: Arc<dyn NetworkStore>,
    registry: GraphRegistry,
    config: EngineConfig,
}

impl std::fmt::Debug for WalkEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkEngine")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WalkEngine {
    /// Engine without a snapshot; queries fail with `GraphNotReady` until
    /// [`WalkEngine::rebuild`] succeeds.
    pub fn new(store: Arc<dyn NetworkStore>, config: EngineConfig) -> Self {
        Self {
            store,
            registry: GraphRegistry::new(),
            config,
        }
    }

    /// Create an engine and run the initial build.
    pub fn open(store: Arc<dyn NetworkStore>, config: EngineConfig) -> Result<Self> {
        let engine = Self::new(store, config);
        engine.rebuild()?;
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.registry.is_ready()
    }

    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.registry.snapshot()
    }

    /// Rebuild from the store and publish the result.
    pub fn rebuild(&self) -> Result<BuildReport> {
        self.registry.rebuild(self.store.as_ref(), &self.config)
    }

    pub fn stats(&self) -> Result<GraphStats> {
        Ok(self.snapshot()?.graph.stats())
    }

    pub fn nodes_in_district(&self, district: &str) -> Result<Vec<Node>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot
            .graph
            .nodes_in_district(district)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn shortest_path(
        &self,
        start: Coordinate,
        end: Coordinate,
        preferences: &RoutePreferences,
    ) -> Result<RouteResult> {
        validate_coordinate(start, "start")?;
        validate_coordinate(end, "end")?;

        let snapshot = self.snapshot()?;
        let from = snapshot.resolve(start, "start")?;
        let to = snapshot.resolve(end, "end")?;
        debug!(start = %from.id, end = %to.id, ?preferences, "resolved route endpoints");

        let found = find_path(
            &snapshot.graph,
            from.id.as_str(),
            to.id.as_str(),
            preferences,
        )
        .ok_or_else(|| Error::PathNotFound {
            start: from.id.to_string(),
            goal: to.id.to_string(),
        })?;

        Ok(RouteResult {
            path: path_points(&snapshot.graph, &found.nodes),
            distance_meters: found.distance_m,
            estimated_seconds: walking_seconds(found.distance_m),
            start_node: from.id,
            end_node: to.id,
        })
    }

    pub fn estimate_loop(&self, start: Coordinate, via: Coordinate) -> Result<LoopEstimate> {
        validate_coordinate(start, "start")?;
        validate_coordinate(via, "via")?;
        let snapshot = self.snapshot()?;
        Ok(loop_route::estimate_loop(&snapshot, start, via))
    }

    pub fn generate_loop(&self, request: &LoopRequest) -> Result<LoopRoute> {
        validate_coordinate(request.start, "start")?;
        validate_coordinate(request.via, "via")?;
        let snapshot = self.snapshot()?;
        loop_route::generate_loop(&snapshot, request, self.config.default_tolerance_percent)
    }
}

fn validate_coordinate(point: Coordinate, label: &str) -> Result<()> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "{label} coordinate ({}, {}) is out of range",
            point.lat, point.lon
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{MemoryStore, RawEdge, RawNode};

    fn engine() -> WalkEngine {
        let store = MemoryStore::new(
            vec![
                RawNode::new("1", 37.5000, 127.0000).with_district("Seocho-gu"),
                RawNode::new("2", 37.5010, 127.0000).with_district("Seocho-gu"),
                RawNode::new("3", 37.5020, 127.0000).with_district("Gangnam-gu"),
            ],
            vec![
                RawEdge::new("a", "1", "2", 111.2),
                RawEdge::new("b", "2", "3", 111.2),
            ],
        );
        WalkEngine::open(Arc::new(store), EngineConfig::default()).unwrap()
    }

    #[test]
    fn queries_fail_before_first_build() {
        let engine = WalkEngine::new(Arc::new(MemoryStore::default()), EngineConfig::default());
        let err = engine
            .shortest_path(
                Coordinate::new(37.5, 127.0),
                Coordinate::new(37.5, 127.0),
                &RoutePreferences::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::GraphNotReady));
        assert!(matches!(engine.stats(), Err(Error::GraphNotReady)));
    }

    #[test]
    fn routes_between_snapped_coordinates() {
        let route = engine()
            .shortest_path(
                Coordinate::new(37.49995, 127.00001),
                Coordinate::new(37.50205, 126.99999),
                &RoutePreferences::default(),
            )
            .unwrap();
        assert_eq!(route.start_node.as_str(), "1");
        assert_eq!(route.end_node.as_str(), "3");
        assert!((route.distance_meters - 222.4).abs() < 1e-9);
        assert_eq!(route.path.len(), 3);
        assert_eq!(route.estimated_seconds, 200);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = engine()
            .estimate_loop(Coordinate::new(120.0, 0.0), Coordinate::new(37.5, 127.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[test]
    fn district_listing() {
        let engine = engine();
        let nodes = engine.nodes_in_district("Seocho-gu").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(engine.stats().unwrap().districts, vec!["Gangnam-gu", "Seocho-gu"]);
    }
}
