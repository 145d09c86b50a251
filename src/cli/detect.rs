//! Detect command implementation

use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

use super::parse_opt_time;
use crate::config::Config;
use crate::data::{read_game_stats, read_snapshots, ParquetExporter};
use crate::movement::{MovementStore, StatsIndex, UpsertOutcome};
use crate::pipeline::DetectionBatch;

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Snapshot feed (overrides data.snapshots_path)
    #[arg(long)]
    pub snapshots: Option<PathBuf>,

    /// Game stat feed (overrides data.stats_path)
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Keep non-significant movements too
    #[arg(long)]
    pub keep_all: bool,

    /// Earliest kickoff to process (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// Latest kickoff to process (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,

    /// Also export the stored movements to Parquet
    #[arg(long)]
    pub export: bool,
}

impl DetectArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let snapshots_path = self.snapshots.as_ref().unwrap_or(&config.data.snapshots_path);
        let stats_path = self.stats.as_ref().unwrap_or(&config.data.stats_path);

        let snapshots = read_snapshots(snapshots_path)?;
        let stats: StatsIndex = if stats_path.exists() {
            read_game_stats(stats_path)?.into_iter().collect()
        } else {
            tracing::warn!(path = ?stats_path, "No game stat feed, movements stay unmatched");
            StatsIndex::new()
        };
        tracing::info!(snapshots = snapshots.len(), stats = stats.len(), "Loaded feeds");

        let batch = DetectionBatch::from(&config.detection)
            .keep_all_magnitudes(self.keep_all || config.detection.keep_all_magnitudes)
            .with_kickoff_range(parse_opt_time(self.start.as_deref())?, parse_opt_time(self.end.as_deref())?);
        let report = batch.run(snapshots, &stats, Utc::now());

        let mut store = MovementStore::load(&config.data.movements_path)?;
        let (mut inserted, mut updated) = (0, 0);
        for movement in report.movements.iter().cloned() {
            match store.upsert(movement) {
                UpsertOutcome::Inserted => inserted += 1,
                UpsertOutcome::Updated => updated += 1,
            }
        }
        store.save(&config.data.movements_path)?;

        println!("Series processed:   {}", report.series_total);
        println!("Movements:          {} ({} matched)", report.movements.len(), report.matched());
        println!("Store:              {} inserted, {} updated, {} total", inserted, updated, store.len());
        for failure in &report.failures {
            println!("Failed series:      {} ({})", failure.key, failure.error);
        }

        if self.export {
            let exporter = ParquetExporter::new(config.data.export_dir.clone());
            exporter.ensure_dir()?;
            let path = exporter.file_path("movements", Utc::now());
            let movements: Vec<_> = store.iter().cloned().collect();
            exporter.write_movements(&path, &movements)?;
            println!("Exported:           {}", path.display());
        }

        Ok(())
    }
}
