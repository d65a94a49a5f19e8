//! ClickHouse table schemas.
//!
//! - LowCardinality for enrichment fields
//! - DateTime64(3) for millisecond precision
//! - Absent enrichment values are stored as empty strings
//! - Properties kept as a JSON string

/// DDL for the database.
pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", database)
}

/// DDL for the processed events table.
///
/// Append-only; the pipeline never updates or deletes rows.
pub fn create_events_table(qualified_table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {} (
    -- Core identifiers
    event_id String,
    tenant_id String,
    user_id String,
    session_id String,

    -- Event
    event_name LowCardinality(String),
    timestamp DateTime64(3),
    properties String,

    -- Enrichment
    geo_country LowCardinality(String),
    geo_city String,
    device_type LowCardinality(String),
    browser LowCardinality(String),
    os LowCardinality(String),

    -- Session
    session_start Nullable(DateTime64(3)),
    session_duration Nullable(Int64),

    -- Pipeline stamps
    ingested_at DateTime64(3),
    processed_at DateTime64(3)
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(timestamp)
ORDER BY (tenant_id, timestamp, event_id)
SETTINGS index_granularity = 8192
"#,
        qualified_table
    )
}

/// All DDL statements in execution order.
pub fn all_statements(database: &str, qualified_table: &str) -> Vec<String> {
    vec![
        create_database(database),
        create_events_table(qualified_table),
    ]
}
