//! RFC 9457 Problem Details for HTTP APIs.
//!
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use walknet_lib::Error as LibError;

/// Problem type URI for invalid request parameters.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for coordinates with no connected node nearby.
pub const PROBLEM_NO_NEARBY_NETWORK: &str = "/problems/no-nearby-network";

/// Problem type URI for endpoints in different components.
pub const PROBLEM_PATH_NOT_FOUND: &str = "/problems/path-not-found";

/// Problem type URI for a rebuild requested while another one runs.
pub const PROBLEM_REBUILD_IN_PROGRESS: &str = "/problems/rebuild-in-progress";

/// Problem type URI for queries made before a usable graph exists.
pub const PROBLEM_SERVICE_UNAVAILABLE: &str = "/problems/service-unavailable";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// RFC 9457 Problem Details response body.
///
/// ```
/// use walknet_service_shared::{ProblemDetails, PROBLEM_PATH_NOT_FOUND};
/// use axum::http::StatusCode;
///
/// let problem = ProblemDetails::new(
///     PROBLEM_PATH_NOT_FOUND,
///     "Path Not Found",
///     StatusCode::NOT_FOUND,
/// )
/// .with_detail("No walkable path from '1040' to '2213'")
/// .with_request_id("req-12345");
/// assert_eq!(problem.status, 404);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem.
    pub title: String,

    pub status: u16,

    /// Explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Request id of the failing call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// 400 for malformed or out-of-range input.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 404 when a point cannot be snapped to the network.
    pub fn no_nearby_network(point: &str, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_NO_NEARBY_NETWORK,
            "No Nearby Walkable Network",
            StatusCode::NOT_FOUND,
        )
        .with_detail(format!("No connected walking node found for the {point} point"))
        .with_request_id(request_id)
    }

    /// 404 when two resolved nodes are not connected.
    pub fn path_not_found(start: &str, goal: &str, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_PATH_NOT_FOUND,
            "Path Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail(format!("No walkable path from '{start}' to '{goal}'"))
        .with_request_id(request_id)
    }

    /// 409 while another rebuild holds the rebuild slot.
    pub fn rebuild_in_progress(request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_REBUILD_IN_PROGRESS,
            "Rebuild In Progress",
            StatusCode::CONFLICT,
        )
        .with_detail("A graph rebuild is already running; retry once it completes")
        .with_request_id(request_id)
    }

    pub fn service_unavailable(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_SERVICE_UNAVAILABLE,
            "Service Unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.detail.as_deref().unwrap_or(""))
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(&self)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

/// Map a library error to its problem response.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    match error {
        LibError::InvalidInput { message } => ProblemDetails::bad_request(message, request_id),
        LibError::NodeResolutionFailed { point } => {
            ProblemDetails::no_nearby_network(point, request_id)
        }
        LibError::PathNotFound { start, goal } => {
            ProblemDetails::path_not_found(start, goal, request_id)
        }
        LibError::RebuildInProgress => ProblemDetails::rebuild_in_progress(request_id),
        LibError::GraphNotReady => ProblemDetails::service_unavailable(
            "The walking network has not been loaded yet",
            request_id,
        ),
        LibError::DatabaseNotFound { path } => ProblemDetails::service_unavailable(
            format!("Network catalog not available at {}", path.display()),
            request_id,
        ),
        // Storage details stay in the logs.
        LibError::UnsupportedSchema { .. }
        | LibError::Store { .. }
        | LibError::Sqlite(_)
        | LibError::Io(_) => {
            ProblemDetails::internal_error("The network store failed", request_id)
        }
    }
}

/// Short label for failure metrics.
pub fn failure_reason(error: &LibError) -> &'static str {
    match error {
        LibError::InvalidInput { .. } => "invalid_input",
        LibError::NodeResolutionFailed { .. } => "no_nearby_network",
        LibError::PathNotFound { .. } => "no_path",
        LibError::RebuildInProgress => "rebuild_in_progress",
        LibError::GraphNotReady => "not_ready",
        _ => "internal_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_details_serialization() {
        let problem = ProblemDetails::bad_request("targetKm must be positive", "req-test");
        let json = serde_json::to_string(&problem).unwrap();

        assert!(json.contains("\"type\":\"/problems/invalid-request\""));
        assert!(json.contains("\"status\":400"));
        assert!(json.contains("\"detail\":\"targetKm must be positive\""));
        assert!(json.contains("\"instance\":\"req-test\""));
    }

    #[test]
    fn test_detail_is_omitted_when_absent() {
        let problem = ProblemDetails::new(PROBLEM_INTERNAL_ERROR, "Oops", StatusCode::BAD_GATEWAY);
        let json = serde_json::to_string(&problem).unwrap();
        assert!(!json.contains("detail"));
        assert!(!json.contains("instance"));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (LibError::InvalidInput { message: "bad".into() }, 400),
            (LibError::NodeResolutionFailed { point: "start".into() }, 404),
            (
                LibError::PathNotFound {
                    start: "1".into(),
                    goal: "2".into(),
                },
                404,
            ),
            (LibError::RebuildInProgress, 409),
            (LibError::GraphNotReady, 503),
            (LibError::Store { message: "disk".into() }, 500),
        ];
        for (error, status) in cases {
            assert_eq!(from_lib_error(&error, "req").status, status, "{error}");
        }
    }

    #[test]
    fn test_path_not_found_names_both_ends() {
        let error = LibError::PathNotFound {
            start: "start".to_string(),
            goal: "waypoint-a".to_string(),
        };
        let problem = from_lib_error(&error, "req-route");

        assert_eq!(problem.type_uri, PROBLEM_PATH_NOT_FOUND);
        let detail = problem.detail.unwrap();
        assert!(detail.contains("'start'"));
        assert!(detail.contains("'waypoint-a'"));
    }

    #[test]
    fn test_storage_errors_hide_details() {
        let error = LibError::Store {
            message: "/var/lib/secret.db is locked".to_string(),
        };
        let problem = from_lib_error(&error, "req");
        assert!(!problem.detail.unwrap().contains("secret"));
        assert_eq!(failure_reason(&error), "internal_error");
    }

    #[test]
    fn test_into_response_sets_problem_content_type() {
        let response = ProblemDetails::rebuild_in_progress("req").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }
}
