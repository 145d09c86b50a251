//! Movements command implementation

use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;

use super::{parse_opt_time, OutputFormat};
use crate::config::Config;
use crate::movement::{MovementFilter, MovementStore};
use crate::snapshot::PropType;

#[derive(Args, Debug)]
pub struct MovementsArgs {
    /// Player name substring (case-insensitive)
    #[arg(long)]
    pub player: Option<String>,

    /// Prop type: rushing_yards or receiving_yards
    #[arg(long)]
    pub prop: Option<PropType>,

    /// Minimum drop in percent
    #[arg(long)]
    pub min_drop_pct: Option<Decimal>,

    /// Maximum hours before kickoff of the final observation
    #[arg(long)]
    pub max_hours_before: Option<Decimal>,

    /// Only movements whose player went under (true) or not (false)
    #[arg(long)]
    pub went_under: Option<bool>,

    /// Only movements with a matched result
    #[arg(long)]
    pub with_results: bool,

    /// Only games that have not kicked off yet
    #[arg(long)]
    pub upcoming: bool,

    /// Earliest kickoff (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// Latest kickoff (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,

    /// Maximum rows to print
    #[arg(long, default_value = "50")]
    pub limit: usize,

    /// Print the summary instead of the rows
    #[arg(long)]
    pub summary: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl MovementsArgs {
    fn filter(&self) -> anyhow::Result<MovementFilter> {
        Ok(MovementFilter {
            player: self.player.clone(),
            prop_type: self.prop,
            min_drop_pct: self.min_drop_pct,
            max_hours_before: self.max_hours_before,
            went_under: self.went_under,
            with_outcome_only: self.with_results,
            upcoming_after: self.upcoming.then(Utc::now),
            start: parse_opt_time(self.start.as_deref())?,
            end: parse_opt_time(self.end.as_deref())?,
        })
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = MovementStore::load(&config.data.movements_path)?;
        let filter = self.filter()?;

        if self.summary {
            let summary = store.summary(&filter);
            match self.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Table => {
                    let rate = |r: Option<f64>| r.map_or("n/a".to_string(), |r| format!("{:.1}%", r * 100.0));
                    println!("Movements:    {}", summary.total_movements);
                    println!("With results: {}", summary.with_results);
                    println!("Under:        {} ({})", summary.under_count, rate(summary.under_rate));
                    println!("Over:         {} ({})", summary.over_count, rate(summary.over_rate));
                }
            }
            return Ok(());
        }

        let hits: Vec<_> = store.query(&filter).into_iter().take(self.limit).collect();
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hits)?),
            OutputFormat::Table => {
                println!(
                    "{:<17} {:<24} {:<16} {:>7} {:>7} {:>8} {:>6} {:>7}",
                    "KICKOFF", "PLAYER", "PROP", "FROM", "TO", "CHANGE", "HRS", "ACTUAL"
                );
                for m in hits {
                    println!(
                        "{:<17} {:<24} {:<16} {:>7} {:>7} {:>7.1}% {:>6} {:>7}",
                        m.game_commence_time.format("%Y-%m-%d %H:%M"),
                        m.player,
                        m.prop_type,
                        m.initial_line,
                        m.final_line,
                        m.movement_pct,
                        m.hours_before_kickoff,
                        m.actual.map_or("-".to_string(), |a| a.to_string()),
                    );
                }
            }
        }
        Ok(())
    }
}
