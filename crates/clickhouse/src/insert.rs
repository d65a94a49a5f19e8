//! Batch insert helpers for ClickHouse.

use crate::client::ClickHouseClient;
use clickhouse::Row;
use engine_core::{Error, ProcessedEvent, Result};
use serde::Serialize;
use tracing::debug;

/// Flattened processed event row.
#[derive(Debug, Clone, Row, Serialize)]
pub struct ProcessedEventRow {
    pub event_id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub session_id: String,
    pub event_name: String,
    pub timestamp: i64, // milliseconds since epoch
    pub properties: String,
    pub geo_country: String,
    pub geo_city: String,
    pub device_type: String,
    pub browser: String,
    pub os: String,
    pub session_start: Option<i64>,
    pub session_duration: Option<i64>,
    pub ingested_at: i64,
    pub processed_at: i64,
}

impl From<ProcessedEvent> for ProcessedEventRow {
    fn from(processed: ProcessedEvent) -> Self {
        let event = processed.event;
        // Map serialization cannot fail for serde_json values
        let properties = serde_json::to_string(&event.properties).unwrap_or_else(|_| "{}".into());

        Self {
            event_id: event.event_id,
            tenant_id: event.tenant_id,
            user_id: event.user_id.unwrap_or_default(),
            session_id: event.session_id.unwrap_or_default(),
            event_name: event.event_name,
            timestamp: event.timestamp.timestamp_millis(),
            properties,
            geo_country: processed.geo_country.unwrap_or_default(),
            geo_city: processed.geo_city.unwrap_or_default(),
            device_type: processed.device_type.unwrap_or_default(),
            browser: processed.browser.unwrap_or_default(),
            os: processed.os.unwrap_or_default(),
            session_start: processed.session_start.map(|ts| ts.timestamp_millis()),
            session_duration: processed.session_duration_seconds,
            ingested_at: event.ingested_at.timestamp_millis(),
            processed_at: processed.processed_at.timestamp_millis(),
        }
    }
}

/// Inserts processed events in a single INSERT.
pub async fn insert_processed_events(
    client: &ClickHouseClient,
    events: Vec<ProcessedEvent>,
) -> Result<usize> {
    if events.is_empty() {
        return Ok(0);
    }

    let count = events.len();
    let start = std::time::Instant::now();
    let table = client.table();

    let mut insert = client
        .inner()
        .insert::<ProcessedEventRow>(&table)
        .map_err(|e| Error::sink_unavailable(format!("Insert error: {}", e)))?;

    for event in events {
        insert
            .write(&ProcessedEventRow::from(event))
            .await
            .map_err(|e| Error::sink_unavailable(format!("Write error: {}", e)))?;
    }

    insert
        .end()
        .await
        .map_err(|e| Error::sink_unavailable(format!("End error: {}", e)))?;

    let elapsed = start.elapsed();

    debug!(
        count = count,
        table = %table,
        latency_ms = %elapsed.as_millis(),
        "Inserted processed events"
    );

    Ok(count)
}
