//! Coordinate-to-node resolution.
//!
//! Only *connected* nodes (degree >= 1) are candidates: an isolated node can
//! never start or end a path, so snapping to one would turn every query into a
//! spurious "path not found".
//!
//! Two strategies share one contract:
//!
//! - [`ResolverKind::Linear`] scans every connected node with the haversine
//!   distance. O(n) per query; the reference behavior.
//! - [`ResolverKind::KdTree`] keeps a `kiddo` KD-tree over connected nodes
//!   projected onto the unit sphere. Chord length grows monotonically with
//!   great-circle distance, so the nearest chord is the nearest node. A few
//!   candidates are re-ranked with haversine so ties resolve like the scan.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo::{haversine_m, Coordinate};
use crate::graph::Graph;
use crate::id::NodeId;

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// Candidates pulled from the KD-tree before exact re-ranking.
const KD_CANDIDATES: usize = 4;

/// Resolution strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolverKind {
    #[default]
    Linear,
    KdTree,
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ResolverKind::Linear => "linear",
            ResolverKind::KdTree => "kd-tree",
        };
        f.write_str(value)
    }
}

impl FromStr for ResolverKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(ResolverKind::Linear),
            "kd-tree" | "kdtree" | "kd_tree" => Ok(ResolverKind::KdTree),
            other => Err(format!("unknown resolver '{other}' (expected linear or kd-tree)")),
        }
    }
}

/// Resolved node and its great-circle distance from the query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestNode {
    pub id: NodeId,
    pub distance_m: f64,
}

/// Resolver bound to one snapshot.
#[derive(Debug)]
pub struct NearestNodeResolver {
    kind: ResolverKind,
    index: Option<SpatialIndex>,
}

impl NearestNodeResolver {
    pub fn build(graph: &Graph, kind: ResolverKind) -> Self {
        let index = match kind {
            ResolverKind::Linear => None,
            ResolverKind::KdTree => Some(SpatialIndex::build(graph)),
        };
        Self { kind, index }
    }

    pub fn kind(&self) -> ResolverKind {
        self.kind
    }

    /// Nearest connected node to `point`, or `None` when the graph has no
    /// connected nodes at all.
    pub fn nearest(&self, graph: &Graph, point: Coordinate) -> Option<NearestNode> {
        match &self.index {
            Some(index) => index.nearest(graph, point),
            None => nearest_linear(graph, point),
        }
    }
}

/// Linear scan over connected nodes. Equal distances resolve to the smaller id.
pub fn nearest_linear(graph: &Graph, point: Coordinate) -> Option<NearestNode> {
    let mut best: Option<(&NodeId, f64)> = None;

    for node in graph.connected_nodes() {
        let distance = haversine_m(point, node.coordinate);
        best = match best {
            Some((id, current)) if current < distance || (current == distance && id < &node.id) => {
                Some((id, current))
            }
            _ => Some((&node.id, distance)),
        };
    }

    best.map(|(id, distance_m)| NearestNode {
        id: id.clone(),
        distance_m,
    })
}

/// KD-tree over distinct positions. kiddo refuses more than a bucket's worth
/// of items at one exact point, so co-located nodes share a single item and
/// `sites[item]` lists their ids in ascending order.
struct SpatialIndex {
    tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32>,
    sites: Vec<Vec<NodeId>>,
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("sites", &self.sites.len())
            .finish()
    }
}

impl SpatialIndex {
    fn build(graph: &Graph) -> Self {
        let mut tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32> = KdTree::new();
        let mut sites: Vec<Vec<NodeId>> = Vec::new();
        let mut by_position: HashMap<[u64; 3], usize> = HashMap::new();
        let mut indexed = 0usize;

        for node in graph.connected_nodes() {
            let position = node.coordinate.to_unit_vector();
            let key = position.map(f64::to_bits);
            let item = *by_position.entry(key).or_insert_with(|| {
                tree.add(&position, sites.len());
                sites.push(Vec::new());
                sites.len() - 1
            });
            sites[item].push(node.id.clone());
            indexed += 1;
        }
        for ids in &mut sites {
            ids.sort();
        }

        debug!(indexed, sites = sites.len(), "built nearest-node KD-tree");
        Self { tree, sites }
    }

    fn nearest(&self, graph: &Graph, point: Coordinate) -> Option<NearestNode> {
        if self.sites.is_empty() {
            return None;
        }

        let query = point.to_unit_vector();
        let candidates = self
            .tree
            .nearest_n::<SquaredEuclidean>(&query, KD_CANDIDATES);

        let mut best: Option<NearestNode> = None;
        for candidate in candidates {
            let Some(id) = self.sites.get(candidate.item).and_then(|ids| ids.first()) else {
                continue;
            };
            let Some(node) = graph.node(id.as_str()) else {
                continue;
            };
            let distance_m = haversine_m(point, node.coordinate);
            let better = match &best {
                None => true,
                Some(current) => {
                    distance_m < current.distance_m
                        || (distance_m == current.distance_m && id < &current.id)
                }
            };
            if better {
                best = Some(NearestNode {
                    id: id.clone(),
                    distance_m,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::network::{RawEdge, RawNode};

    fn sample_graph() -> Graph {
        let mut builder = GraphBuilder::new();
        builder.add_node(RawNode::new("hub", 37.5665, 126.9780));
        builder.add_node(RawNode::new("east", 37.5665, 126.9900));
        builder.add_node(RawNode::new("north", 37.5800, 126.9781));
        // Isolated node sitting right on top of the query point below.
        builder.add_node(RawNode::new("lonely", 37.5700, 126.9850));
        builder.add_edge(&RawEdge::new("l1", "hub", "east", 1_060.0)).unwrap();
        builder.add_edge(&RawEdge::new("l2", "hub", "north", 1_500.0)).unwrap();
        builder.finish().0
    }

    #[test]
    fn linear_scan_ignores_isolated_nodes() {
        let graph = sample_graph();
        let found = nearest_linear(&graph, Coordinate::new(37.5700, 126.9850)).unwrap();
        assert_ne!(found.id.as_str(), "lonely");
        assert!(graph.degree(found.id.as_str()) > 0);
    }

    #[test]
    fn linear_scan_picks_closest() {
        let graph = sample_graph();
        let found = nearest_linear(&graph, Coordinate::new(37.5790, 126.9790)).unwrap();
        assert_eq!(found.id.as_str(), "north");
    }

    #[test]
    fn equal_distances_prefer_smaller_id() {
        let mut builder = GraphBuilder::new();
        builder.add_node(RawNode::new("b", 0.0, 0.001));
        builder.add_node(RawNode::new("a", 0.0, -0.001));
        builder.add_edge(&RawEdge::new("l", "a", "b", 220.0)).unwrap();
        let graph = builder.finish().0;

        let found = nearest_linear(&graph, Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(found.id.as_str(), "a");
    }

    #[test]
    fn empty_graph_resolves_nothing() {
        let graph = Graph::default();
        assert!(nearest_linear(&graph, Coordinate::new(0.0, 0.0)).is_none());
        let resolver = NearestNodeResolver::build(&graph, ResolverKind::KdTree);
        assert!(resolver.nearest(&graph, Coordinate::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn kd_tree_matches_linear_scan() {
        let graph = sample_graph();
        let resolver = NearestNodeResolver::build(&graph, ResolverKind::KdTree);
        for point in [
            Coordinate::new(37.5700, 126.9850),
            Coordinate::new(37.5790, 126.9790),
            Coordinate::new(37.5600, 126.9950),
        ] {
            assert_eq!(
                resolver.nearest(&graph, point),
                nearest_linear(&graph, point)
            );
        }
    }

    #[test]
    fn kd_tree_handles_many_nodes_at_one_position() {
        let mut builder = GraphBuilder::new();
        for i in 0..40 {
            builder.add_node(RawNode::new(format!("c{i:02}"), 37.5, 127.0));
            builder.add_node(RawNode::new(
                format!("p{i:02}"),
                37.5 + 0.001 * (i + 1) as f64,
                127.0,
            ));
            builder
                .add_edge(&RawEdge::new(
                    format!("l{i}"),
                    format!("c{i:02}"),
                    format!("p{i:02}"),
                    111.0 * (i + 1) as f64,
                ))
                .unwrap();
        }
        let graph = builder.finish().0;
        let resolver = NearestNodeResolver::build(&graph, ResolverKind::KdTree);

        for point in [
            Coordinate::new(37.5, 127.0),
            Coordinate::new(37.4999, 127.0001),
            Coordinate::new(37.5052, 127.0),
        ] {
            assert_eq!(
                resolver.nearest(&graph, point),
                nearest_linear(&graph, point)
            );
        }
        let found = resolver.nearest(&graph, Coordinate::new(37.5, 127.0)).unwrap();
        assert_eq!(found.id.as_str(), "c00");
    }

    #[test]
    fn parses_resolver_names() {
        assert_eq!("kd-tree".parse::<ResolverKind>().unwrap(), ResolverKind::KdTree);
        assert_eq!("Linear".parse::<ResolverKind>().unwrap(), ResolverKind::Linear);
        assert!("grid".parse::<ResolverKind>().is_err());
        assert_eq!(ResolverKind::KdTree.to_string(), "kd-tree");
    }
}
