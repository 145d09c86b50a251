//! Dashboard command implementation

use clap::Args;
use std::path::PathBuf;

use super::{parse_time, OutputFormat};
use crate::config::Config;
use crate::dashboard::{DashboardService, JsonlSnapshotSource, LookbackWindow};
use crate::snapshot::{Bookmaker, PropType};

#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Prop type filter: rushing_yards or receiving_yards
    #[arg(long)]
    pub prop: Option<PropType>,

    /// Lookback for fetching snapshots (hours, overrides dashboard.lookback_hours)
    #[arg(long)]
    pub lookback_hours: Option<f64>,

    /// Evaluate as of this time instead of now (RFC 3339)
    #[arg(long)]
    pub at: Option<String>,

    /// Snapshot feed (overrides data.snapshots_path)
    #[arg(long)]
    pub snapshots: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

impl DashboardArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let path = self.snapshots.clone().unwrap_or_else(|| config.data.snapshots_path.clone());
        let service = DashboardService::new(JsonlSnapshotSource::new(path), config.dashboard.cache_ttl());
        let lookback = self.lookback_hours.unwrap_or(config.dashboard.lookback_hours);

        let items = match self.at.as_deref() {
            Some(at) => service.items_at(self.prop, lookback, parse_time(at)?).await?,
            None => service.items(self.prop, lookback).await?,
        };

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items.as_ref())?),
            OutputFormat::Table => {
                println!(
                    "{:<24} {:<16} {:>7} {:>7} {:>7} {:>7} {:>7}",
                    "PLAYER", "PROP", "LINE", "15M", "1H", "24H", "OPEN"
                );
                for item in items.iter() {
                    let Some(consensus) = item.books.get(&Bookmaker::Consensus) else {
                        continue;
                    };
                    let delta = |w: LookbackWindow| {
                        consensus
                            .deltas
                            .get(w)
                            .absolute
                            .map_or("-".to_string(), |d| format!("{:+}", d))
                    };
                    println!(
                        "{:<24} {:<16} {:>7} {:>7} {:>7} {:>7} {:>7}",
                        item.player,
                        item.prop_type,
                        consensus.line,
                        delta(LookbackWindow::M15),
                        delta(LookbackWindow::H1),
                        delta(LookbackWindow::H24),
                        delta(LookbackWindow::SinceOpen),
                    );
                }
            }
        }
        Ok(())
    }
}
