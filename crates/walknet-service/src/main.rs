//! walknet walking-route HTTP service.
//!
//! # Endpoints
//!
//! - `POST /api/v1/route` - shortest walking route between two coordinates
//! - `POST /api/v1/loop/estimate` - feasibility and suggested length of a loop
//! - `POST /api/v1/loop` - closed loop through a via point
//! - `GET /api/v1/stats` - node/edge counts and districts of the live graph
//! - `GET /api/v1/districts/{district}/nodes` - nodes of one district
//! - `POST /api/v1/admin/rebuild` - rebuild the graph from the catalog
//! - `GET /metrics` - Prometheus metrics endpoint
//! - `GET /health/live`, `GET /health/ready` - probes
//!
//! # Configuration
//!
//! - `WALKNET_DATABASE` - SQLite network catalog (default: /data/walknet.db)
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `WALKNET_PAGE_SIZE`, `WALKNET_RESOLVER` - engine settings
//! - `RUST_LOG`, `LOG_FORMAT` - logging
//! - `METRICS_ENABLED`, `METRICS_PATH` - metrics

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use walknet_lib::{
    BuildReport, EngineConfig, Error as LibError, GraphStats, LoopEstimate, LoopRequest,
    LoopRoute, Node, RouteResult,
};
use walknet_service_shared::{
    failure_reason, from_lib_error, health_live, health_ready, init_logging, init_metrics,
    metrics_handler, record_query_failed, record_rebuild, record_route_distance,
    record_route_planned, AppState, LoggingConfig, LoopEstimateRequest, MetricsConfig,
    MetricsLayer, ProblemDetails, RequestId, RouteRequest, Validate,
};

const DEFAULT_DATABASE: &str = "/data/walknet.db";
const DEFAULT_PORT: u16 = 8080;

type ApiResult<T> = Result<Json<T>, ProblemDetails>;

#[derive(Debug, Clone, PartialEq)]
struct ServiceConfig {
    database: PathBuf,
    port: u16,
}

impl ServiceConfig {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = match lookup("SERVICE_PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "ignoring invalid SERVICE_PORT");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        Self {
            database: lookup("WALKNET_DATABASE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            port,
        }
    }
}

/// Body of a successful rebuild.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RebuildResponse {
    report: BuildReport,
    snapshot_version: Option<u64>,
    completed_at: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LoggingConfig::from_env().with_service("walknet"));

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        warn!(error = %e, "continuing without metrics");
    }

    let config = ServiceConfig::from_env();
    let engine_config = EngineConfig::from_env();
    info!(
        database = %config.database.display(),
        port = config.port,
        page_size = engine_config.page_size,
        resolver = %engine_config.resolver,
        "starting walknet service"
    );

    let database = config.database.clone();
    let state = tokio::task::spawn_blocking(move || AppState::load(&database, engine_config))
        .await?
        .map_err(|e| {
            error!(error = %e, "failed to load application state");
            e
        })?;

    if let Ok(stats) = state.engine().stats() {
        info!(
            nodes = stats.node_count,
            edges = stats.edge_count,
            districts = stats.districts.len(),
            "walking network loaded"
        );
    }

    let app = router(state, &metrics_config.path);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

fn router(state: AppState, metrics_path: &str) -> Router {
    Router::new()
        .route("/api/v1/route", post(route_handler))
        .route("/api/v1/loop/estimate", post(loop_estimate_handler))
        .route("/api/v1/loop", post(loop_handler))
        .route("/api/v1/stats", get(stats_handler))
        .route("/api/v1/districts/{district}/nodes", get(district_handler))
        .route("/api/v1/admin/rebuild", post(rebuild_handler))
        .route(metrics_path, get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(MetricsLayer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}

/// Log, count and convert a failed query.
fn failed(kind: &'static str, error: &LibError, request_id: &RequestId) -> ProblemDetails {
    if error.is_recoverable() {
        info!(%request_id, kind, error = %error, "query rejected");
    } else {
        error!(%request_id, kind, error = %error, "query failed");
    }
    record_query_failed(kind, failure_reason(error));
    from_lib_error(error, request_id.as_str())
}

fn invalid(kind: &'static str, problem: Box<ProblemDetails>) -> ProblemDetails {
    record_query_failed(kind, "invalid_input");
    *problem
}

/// Handle POST /api/v1/route requests.
async fn route_handler(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<RouteRequest>,
) -> ApiResult<RouteResult> {
    info!(%request_id, from = ?request.from, to = ?request.to, "handling route request");
    request
        .validate(request_id.as_str())
        .map_err(|problem| invalid("route", problem))?;

    let RouteRequest {
        from,
        to,
        preferences,
    } = request;
    let route = state
        .run(move |engine| engine.shortest_path(from, to, &preferences))
        .await
        .map_err(|e| failed("route", &e, &request_id))?;

    record_route_planned("route");
    record_route_distance("route", route.distance_meters);
    info!(
        %request_id,
        start = %route.start_node,
        end = %route.end_node,
        meters = route.distance_meters,
        points = route.path.len(),
        "route computed"
    );
    Ok(Json(route))
}

/// Handle POST /api/v1/loop/estimate requests.
///
/// An infeasible loop is still a 200; the body says why.
async fn loop_estimate_handler(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<LoopEstimateRequest>,
) -> ApiResult<LoopEstimate> {
    request
        .validate(request_id.as_str())
        .map_err(|problem| invalid("loop_estimate", problem))?;

    let LoopEstimateRequest { start, via } = request;
    let estimate = state
        .run(move |engine| engine.estimate_loop(start, via))
        .await
        .map_err(|e| failed("loop_estimate", &e, &request_id))?;

    record_route_planned("loop_estimate");
    info!(%request_id, feasible = estimate.feasible, message = %estimate.message, "loop estimated");
    Ok(Json(estimate))
}

/// Handle POST /api/v1/loop requests.
async fn loop_handler(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<LoopRequest>,
) -> ApiResult<LoopRoute> {
    info!(%request_id, target_km = request.target_km, "handling loop request");
    request
        .validate(request_id.as_str())
        .map_err(|problem| invalid("loop", problem))?;

    let route = state
        .run(move |engine| engine.generate_loop(&request))
        .await
        .map_err(|e| failed("loop", &e, &request_id))?;

    record_route_planned("loop");
    record_route_distance("loop", route.actual_km * 1000.0);
    info!(
        %request_id,
        actual_km = route.actual_km,
        within_tolerance = route.within_tolerance,
        "loop generated"
    );
    Ok(Json(route))
}

async fn stats_handler(
    State(state): State<AppState>,
    request_id: RequestId,
) -> ApiResult<GraphStats> {
    state
        .engine()
        .stats()
        .map(Json)
        .map_err(|e| failed("stats", &e, &request_id))
}

async fn district_handler(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(district): Path<String>,
) -> ApiResult<Vec<Node>> {
    state
        .run(move |engine| engine.nodes_in_district(&district))
        .await
        .map(Json)
        .map_err(|e| failed("district", &e, &request_id))
}

/// Handle POST /api/v1/admin/rebuild requests.
///
/// Queries keep using the previous snapshot while the rebuild runs; a
/// concurrent rebuild request gets 409.
async fn rebuild_handler(
    State(state): State<AppState>,
    request_id: RequestId,
) -> ApiResult<RebuildResponse> {
    info!(%request_id, "rebuild requested");
    let started = Instant::now();
    let outcome = state
        .run(|engine| {
            let report = engine.rebuild()?;
            let version = engine.snapshot().ok().map(|snapshot| snapshot.version);
            Ok((report, version))
        })
        .await;

    let succeeded = outcome.is_ok();
    if !matches!(outcome, Err(LibError::RebuildInProgress)) {
        record_rebuild(succeeded, started.elapsed().as_secs_f64());
    }

    let (report, snapshot_version) = outcome.map_err(|e| failed("rebuild", &e, &request_id))?;
    info!(
        %request_id,
        nodes = report.node_count,
        edges = report.edge_count,
        components = report.component_count,
        "rebuild completed"
    );
    Ok(Json(RebuildResponse {
        report,
        snapshot_version,
        completed_at: chrono::Utc::now().to_rfc3339(),
    }))
}
