//! ClickHouse configuration.

use serde::{Deserialize, Serialize};

/// ClickHouse sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickHouseConfig {
    /// ClickHouse HTTP URL, or "mock" for the in-memory sink
    pub url: String,
    /// Database name
    #[serde(default = "default_database")]
    pub database: String,
    /// Table receiving processed events
    #[serde(default = "default_table")]
    pub table: String,
    /// Username (optional)
    pub username: Option<String>,
    /// Password (optional)
    pub password: Option<String>,
}

fn default_database() -> String {
    "analytics".to_string()
}

fn default_table() -> String {
    "processed_events".to_string()
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            database: default_database(),
            table: default_table(),
            username: None,
            password: None,
        }
    }
}

impl ClickHouseConfig {
    /// Whether the in-memory sink should be used instead of ClickHouse.
    pub fn is_mock(&self) -> bool {
        self.url.is_empty() || self.url == "mock"
    }

    /// `database.table` for queries.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }
}
