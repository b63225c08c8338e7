//! Metrics collection and exposition.
//!
//! # Metrics
//! - `route_priority_reorders_total` (counter): reorder attempts by outcome
//! - `route_priority_table_routes` (gauge): routes in the table after reorder
//! - `route_priority_dispatch_total` (counter): dispatched requests by status
//! - `route_priority_dispatch_duration_seconds` (histogram): dispatch latency
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a cheap no-op (tests, `order` command)
//! - Prometheus exporter runs its own HTTP listener

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_reorder(outcome: &'static str) {
    metrics::counter!("route_priority_reorders_total", "outcome" => outcome).increment(1);
}

pub fn record_table_size(routes: usize) {
    metrics::gauge!("route_priority_table_routes").set(routes as f64);
}

pub fn record_dispatch(status: u16, start: Instant) {
    metrics::counter!("route_priority_dispatch_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("route_priority_dispatch_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}
