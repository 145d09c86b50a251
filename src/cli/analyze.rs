//! Analyze command implementation

use chrono::Utc;
use clap::Args;

use super::parse_opt_time;
use crate::analysis::{summary_report, AnalysisStore, CorrelationAnalyzer, ThesisPolicy, ThresholdGrid};
use crate::config::Config;
use crate::data::ParquetExporter;
use crate::movement::MovementStore;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Earliest game to include (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// Latest game to include (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,

    /// Also export the results to Parquet
    #[arg(long)]
    pub export: bool,

    /// Skip printing the report
    #[arg(short, long)]
    pub quiet: bool,
}

impl AnalyzeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let movements = MovementStore::load(&config.data.movements_path)?.with_outcomes();
        tracing::info!(population = movements.len(), "Loaded movements with outcomes");

        let policy = ThesisPolicy::from(&config.analysis);
        let analyzer = CorrelationAnalyzer::new(policy);
        let grid = ThresholdGrid::from(&config.analysis)
            .with_date_range(parse_opt_time(self.start.as_deref())?, parse_opt_time(self.end.as_deref())?);

        let results = grid.run(&analyzer, &movements);

        let mut store = AnalysisStore::load(&config.data.results_path)?;
        let (inserted, updated) = store.upsert_all(results.clone());
        store.save(&config.data.results_path)?;
        tracing::info!(
            produced = results.len(),
            inserted,
            updated,
            "Analysis results stored"
        );

        if self.export {
            let exporter = ParquetExporter::new(config.data.export_dir.clone());
            exporter.ensure_dir()?;
            let path = exporter.file_path("analysis", Utc::now());
            exporter.write_analysis_results(&path, &results)?;
            println!("Exported: {}", path.display());
        }

        if !self.quiet {
            println!("{}", summary_report(&results, &config.detection.primary_set(), &policy));
        }
        Ok(())
    }
}
