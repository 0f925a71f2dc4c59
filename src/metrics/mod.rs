//! Prometheus metrics for the watch loop
//!
//! This module tracks:
//! - Cycles: outcome counts and duration
//! - Posts: dispatched, failed deliveries, malformed containers
//! - SeenCache size
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all watch metrics
struct WatchMetrics {
    cycles: CounterVec,
    cycle_duration: Histogram,
    posts_extracted: Counter,
    posts_dispatched: Counter,
    delivery_failures: Counter,
    extract_errors: Counter,
    seen_cache_size: Gauge,
}

/// Global storage for watch metrics
static WATCH_METRICS: OnceLock<WatchMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Call once at startup. Subsequent calls return `Ok(())` without
/// registering anything.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = postwatch::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = WatchMetrics {
        cycles: register_counter_vec!(
            "postwatch_cycles_total",
            "Total watch cycles by outcome",
            &["outcome"]
        )?,
        cycle_duration: register_histogram!(
            "postwatch_cycle_duration_seconds",
            "Time spent on one watch cycle in seconds",
            vec![1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 90.0, 120.0, 300.0]
        )?,
        posts_extracted: register_counter!(
            "postwatch_posts_extracted_total",
            "Total posts extracted from rendered pages"
        )?,
        posts_dispatched: register_counter!(
            "postwatch_posts_dispatched_total",
            "Total posts delivered to the channel"
        )?,
        delivery_failures: register_counter!(
            "postwatch_delivery_failures_total",
            "Total posts whose delivery failed"
        )?,
        extract_errors: register_counter!(
            "postwatch_extract_errors_total",
            "Total post containers skipped as malformed"
        )?,
        seen_cache_size: register_gauge!(
            "postwatch_seen_cache_size",
            "Number of post ids currently in the seen cache"
        )?,
    };

    WATCH_METRICS
        .set(metrics)
        .map_err(|_| "Watch metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    WATCH_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a finished cycle
///
/// `outcome` is one of `completed`, `fetch_failed`, `channel_unavailable`
/// or `failed`.
pub fn record_cycle(outcome: &str) {
    if let Some(m) = WATCH_METRICS.get() {
        m.cycles.with_label_values(&[outcome]).inc();
    }
}

/// Record posts extracted in one cycle
pub fn record_posts_extracted(count: usize) {
    if let Some(m) = WATCH_METRICS.get() {
        m.posts_extracted.inc_by(count as f64);
    }
}

/// Record a fully delivered post
pub fn record_post_dispatched() {
    if let Some(m) = WATCH_METRICS.get() {
        m.posts_dispatched.inc();
    }
}

/// Record a post whose delivery failed
pub fn record_delivery_failure() {
    if let Some(m) = WATCH_METRICS.get() {
        m.delivery_failures.inc();
    }
}

/// Record a skipped malformed container
pub fn record_extract_error() {
    if let Some(m) = WATCH_METRICS.get() {
        m.extract_errors.inc();
    }
}

/// Update the seen cache size gauge
pub fn set_seen_cache_size(size: usize) {
    if let Some(m) = WATCH_METRICS.get() {
        m.seen_cache_size.set(size as f64);
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a cycle timer
pub fn start_cycle_timer() -> MetricsTimer {
    match WATCH_METRICS.get() {
        Some(m) => MetricsTimer::new(m.cycle_duration.start_timer()),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
