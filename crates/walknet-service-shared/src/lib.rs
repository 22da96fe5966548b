//! Shared infrastructure for the walknet HTTP service.
//!
//! - [`AppState`]: the [`walknet_lib::WalkEngine`] shared by all handlers
//! - [`health`]: liveness and readiness probe handlers
//! - [`ProblemDetails`]: RFC 9457 Problem Details for error responses
//! - [`metrics`]: Prometheus metrics infrastructure
//! - [`logging`]: structured logging setup
//! - [`middleware`]: request id propagation and HTTP metrics
//! - Request types with validation for each endpoint
//!
//! Handlers stay thin: parse and validate the request, call the engine on a
//! blocking worker, and map library errors to problem responses. All routing
//! behavior lives in `walknet-lib`.
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides an in-memory grid network for handler
//! tests. Enable the `test-utils` feature to access it from dependent crates.

#![deny(warnings)]

mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_query_failed, record_rebuild, record_route_distance,
    record_route_planned, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId};
pub use problem::{
    failure_reason, from_lib_error, ProblemDetails, PROBLEM_INTERNAL_ERROR,
    PROBLEM_INVALID_REQUEST, PROBLEM_NO_NEARBY_NETWORK, PROBLEM_PATH_NOT_FOUND,
    PROBLEM_REBUILD_IN_PROGRESS, PROBLEM_SERVICE_UNAVAILABLE,
};
pub use request::{LoopEstimateRequest, RouteRequest, Validate};
pub use state::{AppState, AppStateError};
