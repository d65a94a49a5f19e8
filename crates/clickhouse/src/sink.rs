//! ClickHouse-backed storage sink.

use async_trait::async_trait;
use engine_core::{ProcessedEvent, Result, StorageSink};
use telemetry::health;

use crate::client::ClickHouseClient;
use crate::insert::insert_processed_events;

/// Appends processed events to ClickHouse.
#[derive(Clone)]
pub struct ClickHouseSink {
    client: ClickHouseClient,
}

impl ClickHouseSink {
    pub fn new(client: ClickHouseClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ClickHouseClient {
        &self.client
    }
}

#[async_trait]
impl StorageSink for ClickHouseSink {
    async fn append(&self, events: Vec<ProcessedEvent>) -> Result<usize> {
        match insert_processed_events(&self.client, events).await {
            Ok(count) => {
                health().sink.set_healthy();
                Ok(count)
            }
            Err(e) => {
                health().sink.set_unhealthy(e.to_string());
                Err(e)
            }
        }
    }
}
