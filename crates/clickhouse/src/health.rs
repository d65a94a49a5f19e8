//! ClickHouse health checks.

use crate::client::ClickHouseClient;
use crate::schema::all_statements;
use engine_core::{Error, Result};
use tracing::{debug, error};

/// Check ClickHouse connection health.
pub async fn check_connection(client: &ClickHouseClient) -> bool {
    match client.inner().query("SELECT 1").fetch_one::<u8>().await {
        Ok(_) => {
            debug!("ClickHouse connection healthy");
            true
        }
        Err(e) => {
            error!("ClickHouse health check failed: {}", e);
            false
        }
    }
}

/// Initialize database schema.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    let config = client.config();

    for ddl in all_statements(&config.database, &config.qualified_table()) {
        client
            .inner()
            .query(&ddl)
            .execute()
            .await
            .map_err(|e| Error::sink_unavailable(format!("Failed to execute DDL: {}", e)))?;
    }

    debug!(table = %config.qualified_table(), "ClickHouse schema initialized");
    Ok(())
}
