//! Prometheus metrics for the coaster service
//!
//! This module tracks:
//! - API requests by operation and response status
//! - API request latency by operation
//! - Number of stored coaster records
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};
use std::sync::{Mutex, OnceLock, PoisonError};

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all API metrics
struct ApiMetrics {
    api_requests: CounterVec,
    api_duration: HistogramVec,
    stored_records: Gauge,
}

/// Global storage for API metrics
static API_METRICS: OnceLock<ApiMetrics> = OnceLock::new();

/// Serializes registration so concurrent callers see a finished init
static METRICS_INIT_LOCK: Mutex<()> = Mutex::new(());

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup; later calls
/// return `Ok(())` without re-registering. If registration fails, metric
/// operations stay no-ops.
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _guard = METRICS_INIT_LOCK
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    // Prevent double initialization
    if API_METRICS.get().is_some() {
        return Ok(());
    }

    let metrics = ApiMetrics {
        api_requests: register_counter_vec!(
            "coasters_api_requests_total",
            "Total API requests by operation and status",
            &["operation", "status"]
        )?,
        api_duration: register_histogram_vec!(
            "coasters_api_request_duration_seconds",
            "API request duration in seconds",
            &["operation"],
            vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
        )?,
        stored_records: register_gauge!(
            "coasters_stored_records",
            "Number of coaster records currently stored"
        )?,
    };

    API_METRICS
        .set(metrics)
        .map_err(|_| "API metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    API_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record API request
pub fn record_api_request(operation: &str, status: u16, duration_secs: f64) {
    let Some(m) = API_METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.api_requests
        .with_label_values(&[operation, &status_str])
        .inc();
    m.api_duration
        .with_label_values(&[operation])
        .observe(duration_secs);
}

/// Update the stored-record gauge
pub fn set_stored_records(count: usize) {
    if let Some(m) = API_METRICS.get() {
        m.stored_records.set(count as f64);
    }
}

// ============================================================================
// Tests
// ============================================================================
