//! Prometheus metrics for request and database monitoring.
//!
//! This module provides metrics for:
//! - HTTP requests per route and status
//! - Database query outcomes
//! - Database query latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info};

use crate::error::{BackendError, Result};

// === Metric Name Constants ===

/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Database queries counter metric name.
pub const METRIC_DB_QUERIES: &str = "db_queries_total";
/// Database query latency metric name.
pub const METRIC_DB_QUERY_LATENCY: &str = "db_query_latency_ms";

/// Register metric descriptions with the installed recorder.
/// Descriptions sent before a recorder is installed are dropped.
pub fn init_metrics() {
    describe_counter!(
        METRIC_HTTP_REQUESTS,
        "Total number of HTTP requests served, by route and status"
    );
    describe_counter!(
        METRIC_DB_QUERIES,
        "Total number of database queries, by table and outcome"
    );
    describe_histogram!(
        METRIC_DB_QUERY_LATENCY,
        "Database query latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder, describe all metrics, and serve them on `port`.
///
/// Must run inside the tokio runtime.
pub fn install_exporter(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| BackendError::Metrics(e.to_string()))?;
    init_metrics();

    info!("Prometheus metrics listening on {}", addr);
    Ok(())
}

/// Record a served HTTP request.
pub fn record_http_request(route: &str, status: u16) {
    counter!(
        METRIC_HTTP_REQUESTS,
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a database query outcome and its latency.
pub fn record_db_query(table: &str, start: Instant, outcome: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_DB_QUERY_LATENCY, "table" => table.to_string()).record(latency_ms);
    counter!(
        METRIC_DB_QUERIES,
        "table" => table.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        init_metrics();
        record_http_request("/", 200);
        record_db_query("Name", Instant::now(), "ok");
    }

    #[test]
    fn descriptions_reach_prometheus_output() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            init_metrics();
            record_http_request("/test-db", 200);
            record_db_query("Name", Instant::now(), "ok");
        });

        let rendered = handle.render();
        assert!(rendered.contains("# HELP db_queries_total"));
        assert!(rendered.contains("# HELP http_requests_total"));
        assert!(rendered.contains("# HELP db_query_latency_ms"));
    }
}
