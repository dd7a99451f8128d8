//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the pressroom server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Upload sizes and rejections
//! - Result cache status (collected dynamically)
//!
//! Core metrics (batches, transforms, evictions, archives) are registered
//! into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "pressroom_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pressroom_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "pressroom_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Upload Metrics
// =============================================================================

/// Uploaded file sizes in bytes.
pub static UPLOAD_BYTES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("pressroom_upload_bytes", "Size of uploaded files")
            .buckets(prometheus::exponential_buckets(16_384.0, 4.0, 8).unwrap()),
        &["media"], // "image", "video"
    )
    .unwrap()
});

/// Rejected uploads by reason.
pub static UPLOADS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pressroom_uploads_rejected_total", "Rejected uploads"),
        &["reason"], // "media_type", "too_large", "malformed"
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics (collected dynamically)
// =============================================================================

/// Expired entries not yet removed by a timer or sweep.
pub static CACHE_EXPIRED_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "pressroom_cache_expired_pending",
        "Expired cache entries awaiting removal",
    )
    .unwrap()
});

/// Sweeper running state (1 = running, 0 = stopped).
pub static CACHE_SWEEPER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "pressroom_cache_sweeper_running",
        "Whether the cache sweeper is running (1) or stopped (0)",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Uploads
    registry.register(Box::new(UPLOAD_BYTES.clone())).unwrap();
    registry
        .register(Box::new(UPLOADS_REJECTED.clone()))
        .unwrap();

    // Cache
    registry
        .register(Box::new(CACHE_EXPIRED_PENDING.clone()))
        .unwrap();
    registry
        .register(Box::new(CACHE_SWEEPER_RUNNING.clone()))
        .unwrap();

    // Core metrics (batches, cache, archives)
    for metric in pressroom_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the cache gauges reflect the current index.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.service().cache().status().await;
    CACHE_EXPIRED_PENDING.set(status.expired_pending as i64);
    CACHE_SWEEPER_RUNNING.set(if status.sweeper_running { 1 } else { 0 });
}

static UUID_REGEX: Lazy<regex_lite::Regex> = Lazy::new(|| {
    regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap()
});

static NUMERIC_REGEX: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_REGEX.replace_all(path, "{id}");
    let result = NUMERIC_REGEX.replace_all(&result, "/{index}$1");
    result.to_string()
}
