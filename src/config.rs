//! Configuration types for prop-lines
//!
//! Every section has defaults, so an empty file is a valid configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::analysis::{default_threshold_sets, PropFilter, ThresholdSet};
use crate::dashboard::MAX_LOOKBACK_HOURS;
pub use crate::telemetry::LogFormat;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Late movement detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Percent drop that counts as significant
    #[serde(default = "default_threshold_pct")]
    pub threshold_pct: Decimal,

    /// Absolute drop in yards that counts as significant
    #[serde(default = "default_threshold_abs")]
    pub threshold_abs: Decimal,

    /// Lateness window before kickoff (hours)
    #[serde(default = "default_hours_before")]
    pub hours_before: Decimal,

    /// Store non-significant movements too, populating the analysis baseline
    #[serde(default)]
    pub keep_all_magnitudes: bool,
}

fn default_threshold_pct() -> Decimal {
    dec!(10.0)
}
fn default_threshold_abs() -> Decimal {
    dec!(5.0)
}
fn default_hours_before() -> Decimal {
    dec!(3.0)
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold_pct: default_threshold_pct(),
            threshold_abs: default_threshold_abs(),
            hours_before: default_hours_before(),
            keep_all_magnitudes: false,
        }
    }
}

impl DetectionConfig {
    /// The detection thresholds as a sweep entry, used to find the primary analysis
    pub fn primary_set(&self) -> ThresholdSet {
        ThresholdSet::new(self.threshold_pct, self.threshold_abs, self.hours_before)
    }
}

/// Correlation analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Confidence level for the Wilson interval
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,

    /// p-value below which a result is significant
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,

    /// Under rate a significant result must exceed to support the thesis
    #[serde(default = "default_supported_under_rate")]
    pub supported_under_rate: f64,

    /// Under rate above which a result is reported as a trend
    #[serde(default = "default_trending_under_rate")]
    pub trending_under_rate: f64,

    #[serde(default = "default_prop_filters")]
    pub prop_filters: Vec<PropFilter>,

    /// Threshold combinations for the sweep
    #[serde(default = "default_threshold_sets")]
    pub grid: Vec<ThresholdSet>,
}

fn default_confidence_level() -> f64 {
    0.95
}
fn default_significance_level() -> f64 {
    0.05
}
fn default_supported_under_rate() -> f64 {
    0.55
}
fn default_trending_under_rate() -> f64 {
    0.50
}
fn default_prop_filters() -> Vec<PropFilter> {
    PropFilter::ALL.to_vec()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_level: default_confidence_level(),
            significance_level: default_significance_level(),
            supported_under_rate: default_supported_under_rate(),
            trending_under_rate: default_trending_under_rate(),
            prop_filters: default_prop_filters(),
            grid: default_threshold_sets(),
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Cache time-to-live (seconds)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Default lookback for fetching snapshots (hours)
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: f64,
}

fn default_cache_ttl_secs() -> u64 {
    30
}
fn default_lookback_hours() -> f64 {
    24.0
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            lookback_hours: default_lookback_hours(),
        }
    }
}

impl DashboardConfig {
    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Input feeds, stores and export locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Snapshot feed (JSON Lines)
    #[serde(default = "default_snapshots_path")]
    pub snapshots_path: PathBuf,

    /// Game stat feed (JSON Lines)
    #[serde(default = "default_stats_path")]
    pub stats_path: PathBuf,

    #[serde(default = "default_movements_path")]
    pub movements_path: PathBuf,

    #[serde(default = "default_results_path")]
    pub results_path: PathBuf,

    /// Parquet export directory
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_snapshots_path() -> PathBuf {
    PathBuf::from("./data/snapshots.jsonl")
}
fn default_stats_path() -> PathBuf {
    PathBuf::from("./data/game_stats.jsonl")
}
fn default_movements_path() -> PathBuf {
    PathBuf::from("./data/movements.json")
}
fn default_results_path() -> PathBuf {
    PathBuf::from("./data/analysis_results.json")
}
fn default_export_dir() -> PathBuf {
    PathBuf::from("./output")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            snapshots_path: default_snapshots_path(),
            stats_path: default_stats_path(),
            movements_path: default_movements_path(),
            results_path: default_results_path(),
            export_dir: default_export_dir(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the analysis cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        let a = &self.analysis;
        if !(a.confidence_level > 0.0 && a.confidence_level < 1.0) {
            anyhow::bail!("analysis.confidence_level must be in (0, 1), got {}", a.confidence_level);
        }
        if !(a.significance_level > 0.0 && a.significance_level < 1.0) {
            anyhow::bail!(
                "analysis.significance_level must be in (0, 1), got {}",
                a.significance_level
            );
        }
        if self.detection.hours_before < Decimal::ZERO {
            anyhow::bail!("detection.hours_before must not be negative");
        }
        let lookback = self.dashboard.lookback_hours;
        if !(lookback > 0.0 && lookback <= MAX_LOOKBACK_HOURS) {
            anyhow::bail!(
                "dashboard.lookback_hours must be in (0, {}], got {}",
                MAX_LOOKBACK_HOURS,
                lookback
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [detection]
            threshold_pct = 12.5
            threshold_abs = 6.0
            hours_before = 2.0
            keep_all_magnitudes = true

            [analysis]
            confidence_level = 0.99
            prop_filters = ["all", "receiving_yards"]

            [[analysis.grid]]
            pct = 10.0
            abs = 5.0
            hours = 3.0

            [dashboard]
            cache_ttl_secs = 10
            lookback_hours = 72.0

            [data]
            snapshots_path = "/var/lib/props/snapshots.jsonl"
            export_dir = "/tmp/out"

            [telemetry]
            log_level = "debug"
            log_format = "json"
            metrics_port = 9090
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.detection.threshold_pct, dec!(12.5));
        assert!(config.detection.keep_all_magnitudes);
        assert_eq!(config.analysis.confidence_level, 0.99);
        assert_eq!(config.analysis.significance_level, 0.05);
        assert_eq!(
            config.analysis.prop_filters,
            vec![PropFilter::All, PropFilter::ReceivingYards]
        );
        assert_eq!(config.analysis.grid.len(), 1);
        assert_eq!(config.analysis.grid[0].abs, dec!(5.0));
        assert_eq!(config.dashboard.cache_ttl(), std::time::Duration::from_secs(10));
        assert_eq!(config.data.stats_path, PathBuf::from("./data/game_stats.jsonl"));
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(config.telemetry.metrics_port, Some(9090));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.detection.threshold_pct, dec!(10));
        assert_eq!(config.detection.threshold_abs, dec!(5));
        assert_eq!(config.detection.hours_before, dec!(3));
        assert_eq!(config.analysis.grid.len(), 5);
        assert_eq!(config.analysis.prop_filters.len(), 3);
        assert_eq!(config.dashboard.cache_ttl_secs, 30);
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
        assert!(config.telemetry.metrics_port.is_none());
    }

    #[test]
    fn test_unknown_prop_filter_rejected() {
        let toml = r#"
            [analysis]
            prop_filters = ["passing_yards"]
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_validate_confidence_level() {
        let mut config = Config::default();
        config.analysis.confidence_level = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_lookback() {
        let mut config = Config::default();
        config.dashboard.lookback_hours = f64::NAN;
        assert!(config.validate().is_err());
        config.dashboard.lookback_hours = 1e300;
        assert!(config.validate().is_err());
        config.dashboard.lookback_hours = 72.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(include_str!("../config.toml.example")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis.grid, default_threshold_sets());
    }
}
