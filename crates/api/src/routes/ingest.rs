//! Batch ingestion endpoints.
//!
//! Body: `{ "events": [{ "event", "user_id", "session_id", "timestamp", "properties" }] }`
//!
//! Admitted events are handed to the ingest queue; processing happens
//! asynchronously in the worker.

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use engine_core::EventBatch;
use tracing::{debug, warn};

use crate::extractors::TenantId;
use crate::ingestor::QueueStatus;
use crate::response::{insert_rate_limit_headers, ApiError, IngestResponse};
use crate::state::AppState;

/// POST /api/v1/events/batch
pub async fn batch_handler(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    body: Bytes,
) -> Result<Response, ApiError> {
    let batch: EventBatch = serde_json::from_slice(&body).map_err(|e| {
        warn!(tenant_id = %tenant_id, error = %e, "Malformed batch body");
        ApiError::bad_request(format!("Invalid request body: {}", e))
    })?;

    debug!(
        tenant_id = %tenant_id,
        count = batch.events.len(),
        payload_size = body.len(),
        "Received event batch"
    );

    let receipt = state.ingestor.ingest(&tenant_id, batch.events).await?;

    let mut response = Json(IngestResponse::from(&receipt)).into_response();
    insert_rate_limit_headers(response.headers_mut(), &receipt.rate_limit);
    Ok(response)
}

/// GET /api/v1/events/queue/status
pub async fn queue_status_handler(State(state): State<AppState>) -> Json<QueueStatus> {
    Json(state.ingestor.queue_status())
}
