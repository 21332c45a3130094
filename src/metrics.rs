//! Prometheus metrics for gateway observability.
//!
//! Metrics are exposed via a dedicated HTTP listener (default port 9090).
//!
//! # Available Metrics
//!
//! ## Counters
//! - `gateway_upstream_requests_total` - Upstream calls (labels: resource, method, outcome)
//! - `gateway_token_refreshes_total` - Token fetch attempts (labels: outcome)
//!
//! ## Histograms
//! - `gateway_upstream_duration_seconds` - Upstream call duration (labels: resource, method)
//!
//! ## Gauges
//! - `gateway_token_present` - Whether a bearer token is held (1 = yes, 0 = no)
//!
//! # Usage
//!
//! ```rust,ignore
//! use kv_gateway::metrics::{init_metrics, record_upstream_call};
//!
//! // Initialize metrics (call once at startup)
//! init_metrics(addr)?;
//!
//! record_upstream_call("sensors.list", "GET", "ok", 0.045);
//! ```

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const UPSTREAM_REQUESTS_TOTAL: &str = "gateway_upstream_requests_total";
    pub const UPSTREAM_DURATION_SECONDS: &str = "gateway_upstream_duration_seconds";
    pub const TOKEN_REFRESHES_TOTAL: &str = "gateway_token_refreshes_total";
    pub const TOKEN_PRESENT: &str = "gateway_token_present";
}

/// Initialize the Prometheus metrics exporter.
///
/// Sets up metric descriptions and starts the Prometheus HTTP listener
/// on the given address.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::UPSTREAM_REQUESTS_TOTAL,
        "Total number of calls made to the upstream API"
    );
    describe_counter!(
        names::TOKEN_REFRESHES_TOTAL,
        "Total number of upstream token fetch attempts"
    );
    describe_histogram!(
        names::UPSTREAM_DURATION_SECONDS,
        "Upstream call duration in seconds"
    );
    describe_gauge!(
        names::TOKEN_PRESENT,
        "Whether the gateway holds an upstream token (1 = yes, 0 = no)"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record one upstream call with its outcome and duration.
pub fn record_upstream_call(resource: &str, method: &str, outcome: &str, duration_secs: f64) {
    counter!(names::UPSTREAM_REQUESTS_TOTAL, "resource" => resource.to_string(), "method" => method.to_string(), "outcome" => outcome.to_string())
        .increment(1);
    histogram!(names::UPSTREAM_DURATION_SECONDS, "resource" => resource.to_string(), "method" => method.to_string())
        .record(duration_secs);
}

/// Record a token fetch attempt.
pub fn record_token_refresh(outcome: &str) {
    counter!(names::TOKEN_REFRESHES_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// Update the token presence gauge.
pub fn set_token_present(present: bool) {
    gauge!(names::TOKEN_PRESENT).set(if present { 1.0 } else { 0.0 });
}
