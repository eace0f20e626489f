//! Metrics collection and exposition.
//!
//! # Metrics
//! - `widget_requests_total` (counter): requests by method, status
//! - `widget_request_duration_seconds` (histogram): latency distribution
//! - `widget_rejections_total` (counter): refused paths by reason
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! deployments without `METRICS_ADDRESS` pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "widget_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("widget_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    metrics::counter!("widget_rejections_total", "reason" => reason).increment(1);
}
