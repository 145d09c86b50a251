//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

pub const SNAPSHOTS_INGESTED: &str = "proplines_snapshots_ingested_total";
pub const SERIES_PROCESSED: &str = "proplines_series_processed_total";
pub const SERIES_FAILED: &str = "proplines_series_failed_total";
pub const MOVEMENTS_DETECTED: &str = "proplines_movements_detected_total";
pub const MOVEMENTS_MATCHED: &str = "proplines_movements_matched_total";
pub const ANALYSES_PRODUCED: &str = "proplines_analyses_produced_total";
pub const DASHBOARD_CACHE_HITS: &str = "proplines_dashboard_cache_hits_total";
pub const DASHBOARD_CACHE_MISSES: &str = "proplines_dashboard_cache_misses_total";
pub const DASHBOARD_RECOMPUTE_SECONDS: &str = "proplines_dashboard_recompute_seconds";

/// Install the Prometheus exporter with an HTTP listener on `port`
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    describe_metrics();
    tracing::info!(port, "Prometheus metrics exporter listening");
    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!(SNAPSHOTS_INGESTED, "Snapshots read from the feed");
    metrics::describe_counter!(SERIES_PROCESSED, "Snapshot series processed by detection");
    metrics::describe_counter!(SERIES_FAILED, "Snapshot series that failed validation");
    metrics::describe_counter!(MOVEMENTS_DETECTED, "Movements detected or measured");
    metrics::describe_counter!(MOVEMENTS_MATCHED, "Movements matched to a game result");
    metrics::describe_counter!(ANALYSES_PRODUCED, "Correlation analyses produced");
    metrics::describe_counter!(DASHBOARD_CACHE_HITS, "Dashboard cache hits");
    metrics::describe_counter!(DASHBOARD_CACHE_MISSES, "Dashboard cache misses");
    metrics::describe_histogram!(
        DASHBOARD_RECOMPUTE_SECONDS,
        metrics::Unit::Seconds,
        "Dashboard recomputation latency"
    );
}

/// Record a job duration as a histogram sample
pub fn record_duration(name: &'static str, duration: Duration) {
    metrics::histogram!(name).record(duration.as_secs_f64());
}
