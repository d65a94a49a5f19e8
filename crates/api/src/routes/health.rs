//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use telemetry::{health, HealthReport};

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health - Liveness plus current time.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: state.ingestor.health(),
    })
}

/// GET /health/ready - Readiness probe with component report.
pub async fn ready_handler() -> (StatusCode, Json<HealthReport>) {
    let status = if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health().report()))
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
