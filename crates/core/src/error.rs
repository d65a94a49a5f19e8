//! Unified error types for the event pipeline.
//!
//! Error codes:
//! - VALID_001-003: Validation errors (user-correctable, batch rejected)
//! - RATE_001: Admission budget exhausted
//! - QUEUE_001: Ingest queue at capacity
//!
//! Enrichment, processing and sink errors never reach the gateway; they
//! are logged by the processing loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Event shape is invalid
    InvalidEvent,
    /// VALID_002: Batch exceeds 1000 events
    BatchTooLarge,
    /// VALID_003: Batch has no events
    EmptyBatch,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEvent => "VALID_001",
            Self::BatchTooLarge => "VALID_002",
            Self::EmptyBatch => "VALID_003",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Rate limit error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitErrorCode {
    /// RATE_001: Rate limit exceeded
    Exceeded,
}

impl RateLimitErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Exceeded => "RATE_001",
        }
    }

    pub fn http_status(&self) -> u16 {
        429
    }
}

/// Queue error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueErrorCode {
    /// QUEUE_001: Queue cannot take the batch
    Full,
}

impl QueueErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Full => "QUEUE_001",
        }
    }

    pub fn http_status(&self) -> u16 {
        503
    }
}

/// Limit metadata reported with an admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Admissions allowed per window
    pub limit: u64,
    /// Admissions left in the current window
    pub remaining: u64,
    /// When the current window ends
    pub reset_at: DateTime<Utc>,
    /// Seconds until the window ends
    pub retry_after: u64,
}

/// Unified error type for the event pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Validation error with code.
    #[error("[{code}] {message}")]
    ValidationWithCode {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Rate limit error with code and window metadata.
    #[error("[{code}] {message}")]
    RateLimit {
        code: &'static str,
        message: String,
        http_status: u16,
        info: RateLimitInfo,
    },

    /// Queue backpressure error with code.
    #[error("[{code}] {message}")]
    QueueFull {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("enrichment lookup failed: {0}")]
    EnrichmentLookup(String),

    #[error("processing error: {0}")]
    Processing(String),

    #[error("storage sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error with code.
    pub fn validation_code(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::ValidationWithCode {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a rate limit error.
    pub fn rate_limit(code: RateLimitErrorCode, msg: impl Into<String>, info: RateLimitInfo) -> Self {
        Self::RateLimit {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
            info,
        }
    }

    /// Create a queue backpressure error.
    pub fn queue_full(msg: impl Into<String>) -> Self {
        let code = QueueErrorCode::Full;
        Self::QueueFull {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn enrichment(msg: impl Into<String>) -> Self {
        Self::EnrichmentLookup(msg.into())
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing(msg.into())
    }

    pub fn sink_unavailable(msg: impl Into<String>) -> Self {
        Self::SinkUnavailable(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationWithCode { http_status, .. } => *http_status,
            Self::RateLimit { http_status, .. } => *http_status,
            Self::QueueFull { http_status, .. } => *http_status,
            Self::Serialization(_) => 400,
            Self::SinkUnavailable(_) => 503,
            Self::EnrichmentLookup(_) | Self::Processing(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::ValidationWithCode { code, .. } => Some(code),
            Self::RateLimit { code, .. } => Some(code),
            Self::QueueFull { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns true for user-correctable validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationWithCode { .. })
    }

    /// Returns the window metadata of a rate limit rejection.
    pub fn rate_limit_info(&self) -> Option<&RateLimitInfo> {
        match self {
            Self::RateLimit { info, .. } => Some(info),
            _ => None,
        }
    }
}
