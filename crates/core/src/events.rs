//! Event type definitions for the pipeline.
//!
//! An event moves through three shapes:
//! - [`RawEvent`]: what the gateway received, immutable
//! - [`ValidatedEvent`]: admitted, with id, tenant and ingestion stamp
//! - [`ProcessedEvent`]: enriched and sessionized, written once to storage

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::limits::DEFAULT_IP_ADDRESS;

/// Property carrying the client IP used for geo enrichment.
pub const PROP_IP_ADDRESS: &str = "ip_address";

/// Property carrying the raw user agent string.
pub const PROP_USER_AGENT: &str = "user_agent";

/// A single event as received from the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RawEvent {
    /// Event name (1-100 chars)
    #[serde(rename = "event", alias = "event_name")]
    #[validate(length(min = 1, max = 100))]
    pub event_name: String,
    /// Optional user ID
    #[serde(default)]
    pub user_id: Option<String>,
    /// Optional session ID; sessionization is skipped without one
    #[serde(default)]
    pub session_id: Option<String>,
    /// ISO-8601 timestamp, defaults to ingestion time
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Arbitrary properties
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl RawEvent {
    /// Creates an event with only a name.
    pub fn named(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            user_id: None,
            session_id: None,
            timestamp: None,
            properties: Map::new(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Batch body accepted by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<RawEvent>,
}

/// Parses an ISO-8601 timestamp.
///
/// Accepts RFC 3339 with an offset, or a naive date-time which is read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// An admitted event, owned by the pipeline once enqueued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedEvent {
    /// Process-unique event ID
    pub event_id: String,
    /// Tenant the event was admitted for
    pub tenant_id: String,
    pub event_name: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    /// Client timestamp, or ingestion time when absent
    pub timestamp: DateTime<Utc>,
    pub properties: Map<String, Value>,
    /// Set once at admission
    pub ingested_at: DateTime<Utc>,
}

impl ValidatedEvent {
    /// IP address for geo lookup, falling back to loopback.
    pub fn ip_address(&self) -> &str {
        self.properties
            .get(PROP_IP_ADDRESS)
            .and_then(Value::as_str)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(DEFAULT_IP_ADDRESS)
    }

    /// Raw user agent, if the client sent one.
    pub fn user_agent(&self) -> Option<&str> {
        self.properties
            .get(PROP_USER_AGENT)
            .and_then(Value::as_str)
            .filter(|ua| !ua.is_empty())
    }
}

/// A fully processed event, written once to the storage sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedEvent {
    #[serde(flatten)]
    pub event: ValidatedEvent,

    // Enrichment (absent when lookup fails)
    pub geo_country: Option<String>,
    pub geo_city: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,

    // Session (present only when session_id was supplied)
    pub session_start: Option<DateTime<Utc>>,
    pub session_duration_seconds: Option<i64>,

    pub processed_at: DateTime<Utc>,
}

impl ProcessedEvent {
    /// Wraps a validated event with empty enrichment and session fields.
    pub fn new(event: ValidatedEvent, processed_at: DateTime<Utc>) -> Self {
        Self {
            event,
            geo_country: None,
            geo_city: None,
            device_type: None,
            browser: None,
            os: None,
            session_start: None,
            session_duration_seconds: None,
            processed_at,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event.event_id
    }

    pub fn tenant_id(&self) -> &str {
        &self.event.tenant_id
    }
}
