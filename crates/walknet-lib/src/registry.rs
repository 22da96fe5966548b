//! Atomically published graph snapshots.
//!
//! Queries clone the current `Arc<Snapshot>` and keep working against it for
//! their whole lifetime. A rebuild assembles a complete new snapshot off to the
//! side and only takes the write lock for the pointer swap, so readers never see
//! a half-built graph and a failed build leaves the previous snapshot live.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::graph::{build_graph, BuildReport, Graph};
use crate::nearest::{NearestNode, NearestNodeResolver};
use crate::network::NetworkStore;

/// One complete, immutable build: graph, resolver and the build report.
#[derive(Debug)]
pub struct Snapshot {
    pub graph: Graph,
    pub resolver: NearestNodeResolver,
    pub report: BuildReport,
    /// Monotonic publication counter, starting at 1.
    pub version: u64,
}

impl Snapshot {
    pub fn new(graph: Graph, report: BuildReport, config: &EngineConfig, version: u64) -> Self {
        let resolver = NearestNodeResolver::build(&graph, config.resolver);
        Self {
            graph,
            resolver,
            report,
            version,
        }
    }

    /// Nearest connected node to `point`; `label` names the point in the error.
    pub fn resolve(&self, point: Coordinate, label: &str) -> Result<NearestNode> {
        self.resolver
            .nearest(&self.graph, point)
            .ok_or_else(|| Error::NodeResolutionFailed {
                point: label.to_string(),
            })
    }
}

/// Holder of the live snapshot.
#[derive(Debug, Default)]
pub struct GraphRegistry {
    current: RwLock<Option<Arc<Snapshot>>>,
    rebuild_slot: Mutex<()>,
    versions: AtomicU64,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, or [`Error::GraphNotReady`] when nothing usable has
    /// been published.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        match self.current.read().as_ref() {
            Some(snapshot) if !snapshot.graph.is_empty() => Ok(Arc::clone(snapshot)),
            _ => Err(Error::GraphNotReady),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().is_ok()
    }

    /// Build a new snapshot from `store` and publish it.
    ///
    /// Rebuilds are serialized: a call made while another rebuild is running
    /// fails with [`Error::RebuildInProgress`]. When the build fails the
    /// previously published snapshot stays active.
    pub fn rebuild(&self, store: &dyn NetworkStore, config: &EngineConfig) -> Result<BuildReport> {
        let Some(_slot) = self.rebuild_slot.try_lock() else {
            return Err(Error::RebuildInProgress);
        };

        let (graph, report) = match build_graph(store, config.page_size) {
            Ok(built) => built,
            Err(err) => {
                error!(error = %err, "graph rebuild failed; keeping previous snapshot");
                return Err(err);
            }
        };

        let version = self.versions.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(Snapshot::new(graph, report.clone(), config, version));
        self.publish(snapshot);

        info!(version, nodes = report.node_count, "published graph snapshot");
        Ok(report)
    }

    /// Replace the live snapshot with an externally built one.
    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        *self.current.write() = Some(snapshot);
    }
}
