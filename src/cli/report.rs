//! Report command implementation

use clap::Args;

use super::OutputFormat;
use crate::analysis::{summary_report, AnalysisStore, ThesisPolicy};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl ReportArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = AnalysisStore::load(&config.data.results_path)?;
        let results = store.to_vec();

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
            OutputFormat::Table => {
                let policy = ThesisPolicy::from(&config.analysis);
                println!("{}", summary_report(&results, &config.detection.primary_set(), &policy));
            }
        }
        Ok(())
    }
}
