//! Metrics collection and exposition.
//!
//! # Metrics
//! - `log_entries_total` (counter): entries accepted by a backend, by severity
//! - `log_submit_failures_total` (counter): entries a backend rejected
//! - `grouped_requests_total` (counter): aggregate entries, by status
//! - `grouped_request_duration_seconds` (histogram): root request latency

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::backend::Severity;

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics exporter"),
    }
}

pub fn record_entry(severity: Severity) {
    ::metrics::counter!("log_entries_total", "severity" => severity.as_str()).increment(1);
}

pub fn record_submit_failure() {
    ::metrics::counter!("log_submit_failures_total").increment(1);
}

/// Record one completed root request.
pub fn record_grouped_request(status: u16, latency: Duration) {
    ::metrics::counter!("grouped_requests_total", "status" => status.to_string()).increment(1);
    ::metrics::histogram!("grouped_request_duration_seconds").record(latency.as_secs_f64());
}
