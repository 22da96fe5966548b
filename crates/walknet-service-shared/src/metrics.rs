//! Prometheus metrics for the walknet service.
//!
//! ```no_run
//! use walknet_service_shared::metrics::{init_metrics, metrics_handler, MetricsConfig};
//! use axum::{routing::get, Router};
//!
//! init_metrics(&MetricsConfig::default()).expect("failed to initialize metrics");
//! let app: Router = Router::new().route("/metrics", get(metrics_handler));
//! ```

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Route that serves the exposition text.
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// `METRICS_ENABLED` (anything but "false" enables) and `METRICS_PATH`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("METRICS_ENABLED")
                .map(|v| !v.trim().eq_ignore_ascii_case("false"))
                .unwrap_or(defaults.enabled),
            path: std::env::var("METRICS_PATH").unwrap_or(defaults.path),
        }
    }
}

/// Install the Prometheus recorder. Must run before anything is recorded;
/// a second call fails with [`MetricsError::AlreadyInitialized`].
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }
    if PROMETHEUS_HANDLE.get().is_some() {
        return Err(MetricsError::AlreadyInitialized);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)
}

/// `GET /metrics` in Prometheus exposition format.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# metrics not initialized\n".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => write!(f, "failed to install metrics recorder: {e}"),
        }
    }
}

impl std::error::Error for MetricsError {}

// Business metrics. Without an installed recorder these are no-ops.

/// Count a successful query; `kind` is `route`, `loop_estimate` or `loop`.
pub fn record_route_planned(kind: &'static str) {
    metrics::counter!("walknet_routes_planned_total", "kind" => kind).increment(1);
}

/// Count a failed query by [`crate::failure_reason`].
pub fn record_query_failed(kind: &'static str, reason: &'static str) {
    metrics::counter!(
        "walknet_queries_failed_total",
        "kind" => kind,
        "reason" => reason
    )
    .increment(1);
}

/// Physical length of a returned route or loop.
pub fn record_route_distance(kind: &'static str, meters: f64) {
    metrics::histogram!("walknet_route_distance_meters", "kind" => kind).record(meters);
}

/// Outcome and duration of a graph rebuild.
pub fn record_rebuild(succeeded: bool, duration_secs: f64) {
    let outcome = if succeeded { "success" } else { "failure" };
    metrics::counter!("walknet_rebuilds_total", "outcome" => outcome).increment(1);
    metrics::histogram!("walknet_rebuild_duration_seconds").record(duration_secs);
}
