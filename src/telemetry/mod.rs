//! Telemetry module
//!
//! Structured logging and Prometheus metrics

mod logging;
mod metrics;

pub use self::logging::{init_logging, LogFormat};
pub use self::metrics::{
    init_metrics, record_duration, ANALYSES_PRODUCED, DASHBOARD_CACHE_HITS, DASHBOARD_CACHE_MISSES,
    DASHBOARD_RECOMPUTE_SECONDS, MOVEMENTS_DETECTED, MOVEMENTS_MATCHED, SERIES_FAILED,
    SERIES_PROCESSED, SNAPSHOTS_INGESTED,
};

use crate::config::TelemetryConfig;

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level, config.log_format)?;

    if let Some(port) = config.metrics_port {
        init_metrics(port)?;
    }

    Ok(())
}
