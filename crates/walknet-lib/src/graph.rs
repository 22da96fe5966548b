use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::geo::Coordinate;
use crate::id::NodeId;
use crate::network::{FacilityFlags, NetworkStore, PageRequest, RawEdge, RawNode};

/// Walkable point in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub coordinate: Coordinate,
    pub district: String,
    pub flags: FacilityFlags,
}

/// Directed half of an undirected catalog link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub target: NodeId,
    pub distance_m: f64,
    pub flags: FacilityFlags,
}

/// Why a catalog link was left out of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingEndpoint,
    InvalidDistance,
    SelfLoop,
}

/// Per-reason counts of rejected links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedEdges {
    pub missing_endpoint: usize,
    pub invalid_distance: usize,
    pub self_loop: usize,
}

impl RejectedEdges {
    pub fn total(&self) -> usize {
        self.missing_endpoint + self.invalid_distance + self.self_loop
    }

    fn record(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::MissingEndpoint => self.missing_endpoint += 1,
            RejectReason::InvalidDistance => self.invalid_distance += 1,
            RejectReason::SelfLoop => self.self_loop += 1,
        }
    }
}

/// Summary of a graph build, surfaced to the rebuild caller.
///
/// Connectivity and degree figures are diagnostics only; a fragmented network
/// still builds successfully.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub node_count: usize,
    /// Directed edges, i.e. twice the number of accepted links.
    pub edge_count: usize,
    pub link_count: usize,
    pub duplicate_nodes: usize,
    pub rejected_edges: RejectedEdges,
    pub component_count: usize,
    pub largest_component_size: usize,
    pub isolated_nodes: usize,
    /// Degree -> number of nodes with that degree.
    pub degree_histogram: BTreeMap<usize, usize>,
    pub duration_ms: u64,
}

/// Node/edge counts and districts of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub districts: Vec<String>,
}

/// Immutable walking-network snapshot.
///
/// Every adjacency key and every edge target has a matching node entry, and
/// each accepted link is stored in both directions with the same distance.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: HashMap<NodeId, Node>,
    adjacency: HashMap<NodeId, Vec<Edge>>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Outgoing edges of `id`; empty when the node is unknown or isolated.
    pub fn edges(&self, id: &str) -> &[Edge] {
        self.adjacency
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Nodes with at least one edge; the only valid route endpoints.
    pub fn connected_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(move |node| !self.edges(node.id.as_str()).is_empty())
    }

    pub fn degree(&self, id: &str) -> usize {
        self.edges(id).len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        let districts: BTreeSet<&str> = self
            .nodes
            .values()
            .map(|node| node.district.as_str())
            .filter(|district| !district.is_empty())
            .collect();

        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            districts: districts.into_iter().map(str::to_string).collect(),
        }
    }

    /// Nodes of one district, ordered by id.
    pub fn nodes_in_district(&self, district: &str) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self
            .nodes
            .values()
            .filter(|node| node.district == district)
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }
}

/// Accumulates catalog rows into a new [`Graph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: HashMap<NodeId, Node>,
    adjacency: HashMap<NodeId, Vec<Edge>>,
    duplicate_nodes: usize,
    links: usize,
    rejected: RejectedEdges,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node; returns `false` when the normalized id was already seen.
    /// The first occurrence wins.
    pub fn add_node(&mut self, raw: RawNode) -> bool {
        let id = NodeId::new(&raw.id);
        if self.nodes.contains_key(&id) {
            self.duplicate_nodes += 1;
            return false;
        }

        let node = Node {
            id: id.clone(),
            coordinate: Coordinate::new(raw.latitude, raw.longitude),
            district: raw.district,
            flags: raw.flags,
        };
        self.nodes.insert(id, node);
        true
    }

    /// Insert both directions of a link, or record why it was rejected.
    pub fn add_edge(&mut self, raw: &RawEdge) -> std::result::Result<(), RejectReason> {
        let outcome = self.try_add_edge(raw);
        if let Err(reason) = outcome {
            self.rejected.record(reason);
        }
        outcome
    }

    fn try_add_edge(&mut self, raw: &RawEdge) -> std::result::Result<(), RejectReason> {
        let start = NodeId::new(&raw.start_node_id);
        let end = NodeId::new(&raw.end_node_id);

        if !self.nodes.contains_key(&start) || !self.nodes.contains_key(&end) {
            return Err(RejectReason::MissingEndpoint);
        }

        let distance = match raw.distance_meters {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => return Err(RejectReason::InvalidDistance),
        };

        if start == end {
            return Err(RejectReason::SelfLoop);
        }

        self.adjacency.entry(start.clone()).or_default().push(Edge {
            target: end.clone(),
            distance_m: distance,
            flags: raw.flags,
        });
        self.adjacency.entry(end).or_default().push(Edge {
            target: start,
            distance_m: distance,
            flags: raw.flags,
        });
        self.links += 1;
        Ok(())
    }

    /// Freeze the builder and compute connectivity diagnostics.
    pub fn finish(self) -> (Graph, BuildReport) {
        let graph = Graph {
            nodes: self.nodes,
            adjacency: self.adjacency,
        };
        let connectivity = connectivity(&graph);
        let degree_histogram = degree_histogram(&graph);
        let isolated_nodes = degree_histogram.get(&0).copied().unwrap_or(0);

        let report = BuildReport {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            link_count: self.links,
            duplicate_nodes: self.duplicate_nodes,
            rejected_edges: self.rejected,
            component_count: connectivity.component_count,
            largest_component_size: connectivity.largest_component_size,
            isolated_nodes,
            degree_histogram,
            duration_ms: 0,
        };
        (graph, report)
    }
}

/// Build a complete snapshot by paging through `store`: all nodes first,
/// then all links.
pub fn build_graph(store: &dyn NetworkStore, page_size: usize) -> Result<(Graph, BuildReport)> {
    let started = Instant::now();
    let mut builder = GraphBuilder::new();

    let mut request = PageRequest::first(page_size);
    loop {
        let page = store.node_page(request)?;
        debug!(page = request.page, rows = page.items.len(), "loaded node page");
        for raw in page.items {
            builder.add_node(raw);
        }
        if !page.has_next {
            break;
        }
        request = request.next();
    }

    let mut request = PageRequest::first(page_size);
    loop {
        let page = store.edge_page(request)?;
        debug!(page = request.page, rows = page.items.len(), "loaded link page");
        for raw in &page.items {
            // Rejections are tallied by the builder and reported once below.
            let _ = builder.add_edge(raw);
        }
        if !page.has_next {
            break;
        }
        request = request.next();
    }

    let (graph, mut report) = builder.finish();
    report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    if report.duplicate_nodes > 0 {
        warn!(
            duplicate_nodes = report.duplicate_nodes,
            "ignored duplicate node ids after normalization"
        );
    }
    if report.rejected_edges.total() > 0 {
        warn!(
            missing_endpoint = report.rejected_edges.missing_endpoint,
            invalid_distance = report.rejected_edges.invalid_distance,
            self_loop = report.rejected_edges.self_loop,
            "rejected walking links"
        );
    }
    info!(
        nodes = report.node_count,
        edges = report.edge_count,
        components = report.component_count,
        largest_component = report.largest_component_size,
        isolated = report.isolated_nodes,
        duration_ms = report.duration_ms,
        "walking network graph built"
    );

    Ok((graph, report))
}

struct Connectivity {
    component_count: usize,
    largest_component_size: usize,
}

fn connectivity(graph: &Graph) -> Connectivity {
    let mut visited: HashSet<&str> = HashSet::with_capacity(graph.node_count());
    let mut queue = VecDeque::new();
    let mut component_count = 0;
    let mut largest_component_size = 0;

    for node in graph.nodes() {
        let root = node.id.as_str();
        if !visited.insert(root) {
            continue;
        }

        component_count += 1;
        let mut size = 0;
        queue.push_back(root);
        while let Some(current) = queue.pop_front() {
            size += 1;
            for edge in graph.edges(current) {
                if visited.insert(edge.target.as_str()) {
                    queue.push_back(edge.target.as_str());
                }
            }
        }
        largest_component_size = largest_component_size.max(size);
    }

    Connectivity {
        component_count,
        largest_component_size,
    }
}

fn degree_histogram(graph: &Graph) -> BTreeMap<usize, usize> {
    let mut histogram = BTreeMap::new();
    for node in graph.nodes() {
        *histogram.entry(graph.degree(node.id.as_str())).or_insert(0) += 1;
    }
    histogram
}
