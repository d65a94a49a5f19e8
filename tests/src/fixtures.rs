//! Test fixtures and event generators.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use engine_core::ValidatedEvent;
use serde_json::{json, Value};

/// Tenant used by most tests.
pub const TENANT: &str = "tenant-test";

/// Fixed start time of every [`TestContext`](crate::setup::TestContext) clock.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// RFC 3339 string for `t0() + offset`.
pub fn ts(offset: Duration) -> String {
    (t0() + offset).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A minimal valid event body.
pub fn event(name: &str) -> Value {
    json!({ "event": name })
}

/// An event in a session at `t0() + offset`.
pub fn session_event(name: &str, session_id: &str, offset: Duration) -> Value {
    json!({
        "event": name,
        "session_id": session_id,
        "timestamp": ts(offset),
    })
}

/// An event carrying client properties.
pub fn browser_event(name: &str, ip_address: &str, user_agent: &str) -> Value {
    json!({
        "event": name,
        "user_id": "user-1",
        "properties": {
            "ip_address": ip_address,
            "user_agent": user_agent,
            "page": "/pricing",
        },
    })
}

/// Generate N valid events.
pub fn events(n: usize) -> Vec<Value> {
    (0..n).map(|i| event(&format!("event_{}", i))).collect()
}

/// Wraps events into a batch body.
pub fn batch(events: Vec<Value>) -> Value {
    json!({ "events": events })
}

/// An admitted event built directly, bypassing the gateway.
pub fn validated(id: &str, session_id: Option<&str>, offset: Duration) -> ValidatedEvent {
    ValidatedEvent {
        event_id: id.to_string(),
        tenant_id: TENANT.to_string(),
        event_name: "page_view".to_string(),
        user_id: None,
        session_id: session_id.map(str::to_string),
        timestamp: t0() + offset,
        properties: Default::default(),
        ingested_at: t0(),
    }
}
