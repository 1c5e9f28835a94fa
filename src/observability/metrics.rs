//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_requests_total` (counter): requests by status and backend
//! - `lb_request_duration_seconds` (histogram): end-to-end latency
//! - `lb_upstream_retries_total` (counter): same-backend retries
//! - `lb_backends_marked_dead_total` (counter): dispatch escalations
//! - `lb_backend_alive` (gauge): 1=alive, 0=dead
//!
//! Without an installed recorder every call here is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter, serving scrapes on `addr`.
///
/// Must be called from inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, backend: &str, start: Instant) {
    metrics::counter!(
        "lb_requests_total",
        "status" => status.to_string(),
        "backend" => backend.to_string()
    )
    .increment(1);
    metrics::histogram!("lb_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_retry(backend: &str) {
    metrics::counter!("lb_upstream_retries_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_marked_dead(backend: &str) {
    metrics::counter!("lb_backends_marked_dead_total", "backend" => backend.to_string())
        .increment(1);
}

pub fn record_backend_health(backend: &str, alive: bool) {
    metrics::gauge!("lb_backend_alive", "backend" => backend.to_string())
        .set(if alive { 1.0 } else { 0.0 });
}
