//! CLI interface for prop-lines
//!
//! Provides subcommands for:
//! - `detect`: Detect late movements and match results
//! - `analyze`: Run the threshold sweep and print the report
//! - `report`: Print the report from stored results
//! - `dashboard`: Current lines and window deltas
//! - `movements`: Query stored movements
//! - `config`: Show the effective configuration

mod analyze;
mod dashboard;
mod detect;
mod movements;
mod report;

pub use analyze::AnalyzeArgs;
pub use dashboard::DashboardArgs;
pub use detect::DetectArgs;
pub use movements::MovementsArgs;
pub use report::ReportArgs;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "prop-lines")]
#[command(about = "Late line movement detection and under-rate analysis for NFL yardage props")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect late movements in the snapshot feed and match game results
    Detect(DetectArgs),
    /// Run the correlation analysis over stored movements
    Analyze(AnalyzeArgs),
    /// Print the summary report from stored analysis results
    Report(ReportArgs),
    /// Show current lines and window deltas per bookmaker
    Dashboard(DashboardArgs),
    /// Query stored movements
    Movements(MovementsArgs),
    /// Show configuration
    Config,
}

/// Output format for listing commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Parse an RFC 3339 timestamp or a plain date (midnight UTC)
pub fn parse_time(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid time '{}': {}", value, e))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| anyhow::anyhow!("Invalid time '{}'", value))
}

fn parse_opt_time(value: Option<&str>) -> anyhow::Result<Option<DateTime<Utc>>> {
    value.map(parse_time).transpose()
}
