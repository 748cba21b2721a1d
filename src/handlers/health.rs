//! Health check endpoint handler.

use crate::models::HealthResponse;
use actix_web::{Error, Result, web};
use paperclip::actix::api_v2_operation;

/// Health check endpoint
///
/// Served without authentication so load balancers and probes can reach it.
#[api_v2_operation(
    summary = "Health Check Endpoint",
    description = "Returns the current health status of the API in JSON format. Not signed.",
    tags("Health"),
    responses(
        (status = 200, description = "Successful response", body = HealthResponse)
    )
)]
pub async fn health() -> Result<web::Json<HealthResponse>, Error> {
    Ok(web::Json(HealthResponse {
        status: "healthy".to_string(),
    }))
}
