//! Liveness and readiness probe handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Body of `/health/live` and `/health/ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// "ok" or "not_ready: <reason>".
    pub status: String,

    pub service: String,

    pub version: String,

    /// RFC 3339 time at which the probe was answered.
    pub checked_at: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes_loaded: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges_loaded: Option<usize>,

    /// Monotonic version of the live snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_version: Option<u64>,
}

impl HealthStatus {
    fn base(status: String, service: &str, version: &str) -> Self {
        Self {
            status,
            service: service.to_string(),
            version: version.to_string(),
            checked_at: chrono::Utc::now().to_rfc3339(),
            nodes_loaded: None,
            edges_loaded: None,
            snapshot_version: None,
        }
    }

    pub fn alive(service: &str, version: &str) -> Self {
        Self::base("ok".to_string(), service, version)
    }

    pub fn ready(service: &str, version: &str, nodes: usize, edges: usize, snapshot: u64) -> Self {
        Self {
            nodes_loaded: Some(nodes),
            edges_loaded: Some(edges),
            snapshot_version: Some(snapshot),
            ..Self::base("ok".to_string(), service, version)
        }
    }

    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self::base(format!("not_ready: {reason}"), service, version)
    }
}

/// `GET /health/live`: 200 while the process is running.
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// `GET /health/ready`: 200 once a non-empty snapshot is live, 503 before.
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    match state.engine().snapshot() {
        Ok(snapshot) => {
            let status = HealthStatus::ready(
                service,
                version,
                snapshot.graph.node_count(),
                snapshot.graph.edge_count(),
                snapshot.version,
            );
            (StatusCode::OK, Json(status)).into_response()
        }
        Err(err) => {
            let status = HealthStatus::not_ready(service, version, &err.to_string());
            (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
        }
    }
}
