//! Read-only seam over the persisted walking-network catalog.
//!
//! The graph builder never talks to a database directly: it pulls nodes and
//! links page by page through [`NetworkStore`]. [`MemoryStore`] backs tests and
//! embedding callers; [`crate::sqlite::SqliteStore`] reads an on-disk catalog.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Boolean facility attributes carried by catalog nodes and links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacilityFlags {
    #[serde(default)]
    pub park: bool,
    #[serde(default)]
    pub overpass: bool,
    #[serde(default)]
    pub tunnel: bool,
    #[serde(default)]
    pub building: bool,
    #[serde(default)]
    pub bridge: bool,
    #[serde(default)]
    pub crosswalk: bool,
}

impl FacilityFlags {
    pub fn park() -> Self {
        Self {
            park: true,
            ..Self::default()
        }
    }

    pub fn overpass() -> Self {
        Self {
            overpass: true,
            ..Self::default()
        }
    }

    pub fn tunnel() -> Self {
        Self {
            tunnel: true,
            ..Self::default()
        }
    }

    pub fn building() -> Self {
        Self {
            building: true,
            ..Self::default()
        }
    }
}

/// Node row as persisted in the catalog, before identifier normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub district: String,
    #[serde(default)]
    pub flags: FacilityFlags,
}

impl RawNode {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            district: String::new(),
            flags: FacilityFlags::default(),
        }
    }

    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = district.into();
        self
    }
}

/// Undirected link row as persisted in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    pub id: String,
    pub start_node_id: String,
    pub end_node_id: String,
    /// Physical length; `None` when the upstream feed omitted it.
    pub distance_meters: Option<f64>,
    #[serde(default)]
    pub flags: FacilityFlags,
}

impl RawEdge {
    pub fn new(
        id: impl Into<String>,
        start_node_id: impl Into<String>,
        end_node_id: impl Into<String>,
        distance_meters: f64,
    ) -> Self {
        Self {
            id: id.into(),
            start_node_id: start_node_id.into(),
            end_node_id: end_node_id.into(),
            distance_meters: Some(distance_meters),
            flags: FacilityFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: FacilityFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn first(size: usize) -> Self {
        Self {
            page: 0,
            size: size.max(1),
        }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            size: self.size,
        }
    }

    pub fn offset(&self) -> usize {
        self.page * self.size
    }
}

/// One page of catalog rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Slice a page out of an in-memory collection.
    pub fn slice(all: &[T], request: PageRequest) -> Self
    where
        T: Clone,
    {
        let start = request.offset().min(all.len());
        let end = start.saturating_add(request.size).min(all.len());
        Self {
            items: all[start..end].to_vec(),
            has_next: end < all.len(),
        }
    }
}

/// Paged bulk-read access to the network catalog.
///
/// Implementations must return rows in a stable order so that repeated builds
/// from an unchanged catalog produce identical snapshots.
pub trait NetworkStore: Send + Sync {
    fn node_page(&self, request: PageRequest) -> Result<Page<RawNode>>;

    fn edge_page(&self, request: PageRequest) -> Result<Page<RawEdge>>;
}

impl<S: NetworkStore + ?Sized> NetworkStore for std::sync::Arc<S> {
    fn node_page(&self, request: PageRequest) -> Result<Page<RawNode>> {
        (**self).node_page(request)
    }

    fn edge_page(&self, request: PageRequest) -> Result<Page<RawEdge>> {
        (**self).edge_page(request)
    }
}

/// Vector-backed catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: Vec<RawNode>,
    edges: Vec<RawEdge>,
}

impl MemoryStore {
    pub fn new(nodes: Vec<RawNode>, edges: Vec<RawEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[RawNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[RawEdge] {
        &self.edges
    }
}

impl NetworkStore for MemoryStore {
    fn node_page(&self, request: PageRequest) -> Result<Page<RawNode>> {
        Ok(Page::slice(&self.nodes, request))
    }

    fn edge_page(&self, request: PageRequest) -> Result<Page<RawEdge>> {
        Ok(Page::slice(&self.edges, request))
    }
}
