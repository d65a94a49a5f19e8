//! Standardized API responses.

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use engine_core::RateLimitInfo;
use serde::{Deserialize, Serialize};

use crate::ingestor::IngestReceipt;

/// Success response for an admitted batch.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub events_received: usize,
    pub processing_id: String,
    pub estimated_processing_time: String,
}

impl From<&IngestReceipt> for IngestResponse {
    fn from(receipt: &IngestReceipt) -> Self {
        Self {
            success: true,
            events_received: receipt.events_received,
            processing_id: receipt.processing_id.clone(),
            estimated_processing_time: "5s".to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Writes `X-RateLimit-*` headers for `info`.
pub fn insert_rate_limit_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    let values = [
        ("X-RateLimit-Limit", info.limit.to_string()),
        ("X-RateLimit-Remaining", info.remaining.to_string()),
        ("X-RateLimit-Reset", info.reset_at.timestamp().to_string()),
    ];

    for (name, value) in values {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
}

/// API error type with pipeline error codes.
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub rate_limit: Option<RateLimitInfo>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
            rate_limit: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    pub fn rate_limited(msg: impl Into<String>, info: RateLimitInfo) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            response: ErrorResponse::new(msg, "RATE_001"),
            rate_limit: Some(info),
        }
    }

    pub fn unavailable(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::SERVICE_UNAVAILABLE, code, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", msg)
    }

    pub fn validation(code: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: ErrorResponse::new("Validation failed", code).with_details(errors),
            rate_limit: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        if let Some(info) = self.rate_limit {
            let headers = response.headers_mut();
            insert_rate_limit_headers(headers, &info);
            if let Ok(value) = HeaderValue::from_str(&info.retry_after.to_string()) {
                headers.insert("Retry-After", value);
            }
        }

        response
    }
}

impl From<engine_core::Error> for ApiError {
    fn from(err: engine_core::Error) -> Self {
        match &err {
            engine_core::Error::ValidationWithCode { code, message, .. } => {
                ApiError::validation(*code, vec![message.clone()])
            }
            engine_core::Error::RateLimit { message, info, .. } => {
                ApiError::rate_limited(message, *info)
            }
            engine_core::Error::QueueFull { code, message, .. } => {
                ApiError::unavailable(*code, message)
            }
            engine_core::Error::Serialization(e) => ApiError::bad_request(e.to_string()),
            _ => ApiError::internal(err.to_string()),
        }
    }
}
