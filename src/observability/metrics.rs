//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (requests, latency, visits, reloads)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `hello_requests_total` (counter): requests by method, status, location
//! - `hello_request_duration_seconds` (histogram): latency distribution
//! - `hello_visits_total` (counter): counted visits by location
//! - `hello_config_reloads_total` (counter): reload attempts by result
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("hello_requests_total", "Requests handled, by method, status and location");
    describe_histogram!("hello_request_duration_seconds", "Request latency in seconds");
    describe_counter!("hello_visits_total", "Visits counted by the greeting handler");
    describe_counter!("hello_config_reloads_total", "Configuration reload attempts");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, location: &str, start: Instant) {
    counter!(
        "hello_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "location" => location.to_string()
    )
    .increment(1);

    histogram!("hello_request_duration_seconds", "location" => location.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record one counted visit.
pub fn record_visit(location: &str) {
    counter!("hello_visits_total", "location" => location.to_string()).increment(1);
}

/// Record a configuration reload attempt.
pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("hello_config_reloads_total", "result" => result).increment(1);
}
