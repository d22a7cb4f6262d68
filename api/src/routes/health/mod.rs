use axum::{Json, Router, http::StatusCode, routing::get};
use chrono::Utc;
use serde::Serialize;
use util::{config, state::AppState};

use crate::response::ApiResponse;

#[derive(Serialize, Default)]
pub struct HealthStatus {
    pub service: String,
    pub timestamp: String,
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}

/// GET `/api/health`
///
/// Liveness probe, no authentication required.
async fn health() -> (StatusCode, Json<ApiResponse<HealthStatus>>) {
    let status = HealthStatus {
        service: config::project_name(),
        timestamp: Utc::now().to_rfc3339(),
    };
    (
        StatusCode::OK,
        Json(ApiResponse::success(status, "Service is healthy")),
    )
}
