//! Multi-tenant analytics event pipeline
//!
//! Event ingestion and processing service handling:
//! - Per-tenant admission control and batch validation
//! - In-process hand-off to a fixed-cadence processing loop
//! - Geo/device enrichment, sessionization and deduplication
//! - Append-only persistence to ClickHouse

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use api::{router, AppState, RateLimitConfig};
use clickhouse_client::{ClickHouseClient, ClickHouseConfig, ClickHouseSink};
use engine_core::{system_clock, MemorySink, StorageSink};
use ingest_queue::{channel, EventProducer, QueueConfig};
use telemetry::{health, init_tracing_from_env};
use worker::{EventProcessor, LocalEnrichment, ProcessingConfig, WorkerScheduler};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    rate_limit: RateLimitConfig,

    #[serde(default)]
    queue: QueueConfig,

    #[serde(default)]
    processing: ProcessingConfig,

    #[serde(default)]
    clickhouse: ClickHouseConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rate_limit: RateLimitConfig::default(),
            queue: QueueConfig::default(),
            processing: ProcessingConfig::default(),
            clickhouse: ClickHouseConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting event pipeline v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        rate_limit = config.rate_limit.limit,
        window_secs = config.rate_limit.window_secs,
        queue_capacity = config.queue.capacity,
        batch_size = config.queue.batch_size,
        poll_interval_ms = config.queue.poll_interval_ms,
        "Loaded configuration"
    );

    let clock = system_clock();
    let sink = build_sink(&config.clickhouse).await;

    // Queue hand-off: the gateway only enqueues, the worker only dequeues
    let (producer, consumer) = channel(&config.queue);

    let processor = Arc::new(EventProcessor::new(
        config.processing.clone(),
        Arc::new(LocalEnrichment::default()),
        sink,
        clock.clone(),
    ));

    let shutdown = CancellationToken::new();
    let worker_handles = WorkerScheduler::new(
        config.processing.clone(),
        processor,
        consumer,
        config.queue.poll_interval(),
    )
    .start(shutdown.clone());

    let state = AppState::new(
        Arc::new(producer) as Arc<dyn EventProducer>,
        config.rate_limit.clone(),
        clock,
    );

    let rate_limiter_cleanup = state.start_rate_limiter_cleanup();
    info!("Started rate limiter cleanup task (every 5 minutes)");

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");

    // Stop intake first, then let the processing loop finish its current tick
    rate_limiter_cleanup.abort();
    shutdown.cancel();
    for handle in worker_handles {
        if let Err(e) = handle.await {
            error!("Worker task failed: {}", e);
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Picks the storage sink: in-memory for `url = "mock"`, ClickHouse otherwise.
async fn build_sink(config: &ClickHouseConfig) -> Arc<dyn StorageSink> {
    if config.is_mock() {
        warn!("ClickHouse URL is mock, processed events are kept in memory");
        health().sink.set_healthy();
        return Arc::new(MemorySink::new());
    }

    let client = ClickHouseClient::new(config.clone());

    if clickhouse_client::health::check_connection(&client).await {
        health().sink.set_healthy();
        info!("ClickHouse connection: healthy");
    } else {
        health().sink.set_unhealthy("Connection failed");
        error!("ClickHouse connection: unhealthy");
    }

    if let Err(e) = clickhouse_client::health::init_schema(&client).await {
        error!("Failed to initialize ClickHouse schema: {}", e);
        // Continue anyway - schema might already exist
    }

    Arc::new(ClickHouseSink::new(client))
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("INGESTION")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // The config crate's nested parsing doesn't work reliably with underscored field names
    if let Ok(url) = std::env::var("INGESTION_CLICKHOUSE_URL") {
        config.clickhouse.url = url;
    }
    if let Ok(database) = std::env::var("INGESTION_CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("INGESTION_CLICKHOUSE_USERNAME") {
        config.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("INGESTION_CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }

    if let Some(limit) = env_number("INGESTION_RATE_LIMIT")? {
        config.rate_limit.limit = limit;
    }
    if let Some(capacity) = env_number("INGESTION_QUEUE_CAPACITY")? {
        config.queue.capacity = capacity;
    }
    if let Some(batch_size) = env_number("INGESTION_QUEUE_BATCH_SIZE")? {
        config.queue.batch_size = batch_size;
    }

    Ok(config)
}

/// Reads a numeric environment override, failing on unparseable values.
fn env_number<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: {}", name, value)),
        Err(_) => Ok(None),
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
