//! Internal metrics collection.
//!
//! Lock-free counters, gauges and histograms shared by the gateway and the
//! processing loop. Snapshots are logged periodically by the worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns (upper bound, count) per bucket.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the pipeline.
#[derive(Debug, Default)]
pub struct Metrics {
    // Admission
    pub batches_received: Counter,
    pub batches_rejected: Counter,
    pub events_received: Counter,
    pub events_admitted: Counter,
    pub events_failed_validation: Counter,
    pub rate_limited_requests: Counter,
    pub queue_full_rejections: Counter,

    // Processing
    pub events_dequeued: Counter,
    pub events_processed: Counter,
    pub events_duplicate: Counter,
    pub events_failed_processing: Counter,
    pub enrichment_failures: Counter,

    // Storage
    pub events_persisted: Counter,
    pub sink_appends: Counter,
    pub sink_errors: Counter,
    pub batches_dropped: Counter,

    // Latency histograms
    pub ingest_latency_ms: Histogram,
    pub batch_processing_latency_ms: Histogram,
    pub sink_latency_ms: Histogram,

    // Gauges
    pub queue_depth: Gauge,
    pub active_sessions: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub batches_received: u64,
    pub events_received: u64,
    pub events_admitted: u64,
    pub events_failed_validation: u64,
    pub rate_limited_requests: u64,
    pub queue_full_rejections: u64,
    pub events_processed: u64,
    pub events_duplicate: u64,
    pub events_failed_processing: u64,
    pub events_persisted: u64,
    pub sink_errors: u64,
    pub ingest_latency_mean_ms: f64,
    pub batch_processing_latency_mean_ms: f64,
    pub sink_latency_mean_ms: f64,
    pub queue_depth: u64,
    pub active_sessions: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            batches_received: self.batches_received.get(),
            events_received: self.events_received.get(),
            events_admitted: self.events_admitted.get(),
            events_failed_validation: self.events_failed_validation.get(),
            rate_limited_requests: self.rate_limited_requests.get(),
            queue_full_rejections: self.queue_full_rejections.get(),
            events_processed: self.events_processed.get(),
            events_duplicate: self.events_duplicate.get(),
            events_failed_processing: self.events_failed_processing.get(),
            events_persisted: self.events_persisted.get(),
            sink_errors: self.sink_errors.get(),
            ingest_latency_mean_ms: self.ingest_latency_ms.mean(),
            batch_processing_latency_mean_ms: self.batch_processing_latency_ms.mean(),
            sink_latency_mean_ms: self.sink_latency_ms.mean(),
            queue_depth: self.queue_depth.get(),
            active_sessions: self.active_sessions.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
