//! Request types and validation for HTTP endpoints.

use serde::{Deserialize, Serialize};
use walknet_lib::{Coordinate, LoopRequest, RoutePreferences};

use crate::ProblemDetails;

/// Validation trait for request bodies.
///
/// The `request_id` populates the `instance` field of the returned problem,
/// which is boxed to keep the `Err` variant small.
pub trait Validate {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

/// Body of `POST /api/v1/route`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub from: Coordinate,
    pub to: Coordinate,
    #[serde(default)]
    pub preferences: RoutePreferences,
}

impl Validate for RouteRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        check_coordinate("from", self.from, request_id)?;
        check_coordinate("to", self.to, request_id)
    }
}

/// Body of `POST /api/v1/loop/estimate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopEstimateRequest {
    pub start: Coordinate,
    pub via: Coordinate,
}

impl Validate for LoopEstimateRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        check_coordinate("start", self.start, request_id)?;
        check_coordinate("via", self.via, request_id)
    }
}

/// `POST /api/v1/loop` takes the library request as is.
impl Validate for LoopRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        check_coordinate("start", self.start, request_id)?;
        check_coordinate("via", self.via, request_id)?;

        if !self.target_km.is_finite() || self.target_km <= 0.0 {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'targetKm' field must be a positive number",
                request_id,
            )));
        }

        if let Some(tolerance) = self.tolerance_percent {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(Box::new(ProblemDetails::bad_request(
                    "The 'tolerancePercent' field must be zero or a positive number",
                    request_id,
                )));
            }
        }

        Ok(())
    }
}

fn check_coordinate(
    field: &str,
    point: Coordinate,
    request_id: &str,
) -> Result<(), Box<ProblemDetails>> {
    if point.is_valid() {
        return Ok(());
    }
    Err(Box::new(ProblemDetails::bad_request(
        format!(
            "The '{field}' field must have lat in [-90, 90] and lon in [-180, 180]; got ({}, {})",
            point.lat, point.lon
        ),
        request_id,
    )))
}
