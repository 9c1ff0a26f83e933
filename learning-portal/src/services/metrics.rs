//! Metrics module for learning-portal.
//! Provides Prometheus metrics for HTTP traffic, access decisions and store queries.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};

/// HTTP request counter
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("portal_http_requests_total", "Total number of HTTP requests"),
        &["method", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL")
});

/// HTTP request duration histogram
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "portal_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ),
        &["method", "status"]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION")
});

/// Access decisions by gate and outcome
pub static ACCESS_DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "portal_access_decisions_total",
            "Access decisions by gate and outcome"
        ),
        &["gate", "outcome"]
    )
    .expect("Failed to register ACCESS_DECISIONS_TOTAL")
});

/// Entitlement store query duration histogram
pub static STORE_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "portal_store_query_duration_seconds",
            "Entitlement store query duration",
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
        ),
        &["operation"]
    )
    .expect("Failed to register STORE_QUERY_DURATION")
});

/// Backend failures hit while authorizing a request
pub static ACCESS_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "portal_access_errors_total",
            "Backend failures while authorizing requests"
        ),
        &["gate", "error_type"]
    )
    .expect("Failed to register ACCESS_ERRORS_TOTAL")
});

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    Lazy::force(&HTTP_REQUESTS_TOTAL);
    Lazy::force(&HTTP_REQUEST_DURATION);
    Lazy::force(&ACCESS_DECISIONS_TOTAL);
    Lazy::force(&STORE_QUERY_DURATION);
    Lazy::force(&ACCESS_ERRORS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record an access decision.
pub fn record_access_decision(gate: &str, outcome: &str) {
    ACCESS_DECISIONS_TOTAL
        .with_label_values(&[gate, outcome])
        .inc();
}

/// Record a backend failure during authorization.
pub fn record_access_error(gate: &str, error_type: &str) {
    ACCESS_ERRORS_TOTAL
        .with_label_values(&[gate, error_type])
        .inc();
}

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, status: &str, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL.with_label_values(&[method, status]).inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, status])
        .observe(duration_secs);
}
