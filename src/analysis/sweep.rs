//! Threshold sweep
//!
//! Runs the analyzer over every (threshold set, prop filter) pair. Names are
//! derived from the parameters, so re-running a sweep upserts the same keys.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::correlation::{AnalysisParams, CorrelationAnalyzer};
use super::types::AnalysisResult;
use crate::movement::{DropThreshold, Movement};
use crate::snapshot::PropType;

/// Prop type filter for an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropFilter {
    All,
    RushingYards,
    ReceivingYards,
}

impl PropFilter {
    pub const ALL: [PropFilter; 3] = [
        PropFilter::All,
        PropFilter::RushingYards,
        PropFilter::ReceivingYards,
    ];

    pub fn prop_type(&self) -> Option<PropType> {
        match self {
            PropFilter::All => None,
            PropFilter::RushingYards => Some(PropType::RushingYards),
            PropFilter::ReceivingYards => Some(PropType::ReceivingYards),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropFilter::All => "all",
            PropFilter::RushingYards => "rushing_yards",
            PropFilter::ReceivingYards => "receiving_yards",
        }
    }
}

impl From<Option<PropType>> for PropFilter {
    fn from(prop_type: Option<PropType>) -> Self {
        match prop_type {
            None => PropFilter::All,
            Some(PropType::RushingYards) => PropFilter::RushingYards,
            Some(PropType::ReceivingYards) => PropFilter::ReceivingYards,
        }
    }
}

impl fmt::Display for PropFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (percent, absolute, hours) threshold combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub pct: Decimal,
    pub abs: Decimal,
    pub hours: Decimal,
}

impl ThresholdSet {
    pub fn new(pct: Decimal, abs: Decimal, hours: Decimal) -> Self {
        Self { pct, abs, hours }
    }

    pub fn threshold(&self) -> DropThreshold {
        DropThreshold::new(self.pct, self.abs)
    }
}

/// Default grid: 5/3/3, 10/5/3, 15/7/3, 10/5/1, 10/5/6
pub fn default_threshold_sets() -> Vec<ThresholdSet> {
    vec![
        ThresholdSet::new(dec!(5), dec!(3), dec!(3)),
        ThresholdSet::new(dec!(10), dec!(5), dec!(3)),
        ThresholdSet::new(dec!(15), dec!(7), dec!(3)),
        ThresholdSet::new(dec!(10), dec!(5), dec!(1)),
        ThresholdSet::new(dec!(10), dec!(5), dec!(6)),
    ]
}

/// Threshold in a name: exact, with at least one decimal (10 -> "10.0")
fn name_number(value: Decimal) -> String {
    let value = value.normalize();
    if value.scale() == 0 {
        format!("{value}.0")
    } else {
        value.to_string()
    }
}

/// `thesis_{filter}_pct{pct}_abs{abs}_hrs{hours}`
///
/// A bounded game date range appends `_from{YYYYMMDD}` and/or
/// `_to{YYYYMMDD}`, so a ranged run never overwrites the unbounded one.
pub fn analysis_name(
    filter: PropFilter,
    set: &ThresholdSet,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> String {
    let mut name = format!(
        "thesis_{}_pct{}_abs{}_hrs{}",
        filter.as_str(),
        name_number(set.pct),
        name_number(set.abs),
        name_number(set.hours)
    );
    if let Some(start) = start {
        name.push_str(&format!("_from{}", start.format("%Y%m%d")));
    }
    if let Some(end) = end {
        name.push_str(&format!("_to{}", end.format("%Y%m%d")));
    }
    name
}

/// Threshold sets crossed with prop filters
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdGrid {
    pub sets: Vec<ThresholdSet>,
    pub filters: Vec<PropFilter>,
    /// Game date range applied to every combination
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Default for ThresholdGrid {
    fn default() -> Self {
        Self {
            sets: default_threshold_sets(),
            filters: PropFilter::ALL.to_vec(),
            start: None,
            end: None,
        }
    }
}

impl From<&crate::config::AnalysisConfig> for ThresholdGrid {
    fn from(config: &crate::config::AnalysisConfig) -> Self {
        Self {
            sets: config.grid.clone(),
            filters: config.prop_filters.clone(),
            start: None,
            end: None,
        }
    }
}

impl ThresholdGrid {
    pub fn new(sets: Vec<ThresholdSet>, filters: Vec<PropFilter>) -> Self {
        Self {
            sets,
            filters,
            start: None,
            end: None,
        }
    }

    pub fn with_date_range(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Every combination, sets outermost
    pub fn params(&self) -> Vec<AnalysisParams> {
        self.sets
            .iter()
            .flat_map(|set| {
                self.filters.iter().map(move |&filter| {
                    AnalysisParams::new(
                        analysis_name(filter, set, self.start, self.end),
                        set.threshold(),
                        set.hours,
                    )
                        .with_prop_type(filter.prop_type())
                        .with_date_range(self.start, self.end)
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sets.len() * self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every combination; combinations with an empty test group are skipped
    pub fn run(&self, analyzer: &CorrelationAnalyzer, population: &[Movement]) -> Vec<AnalysisResult> {
        let results: Vec<AnalysisResult> = self
            .params()
            .iter()
            .filter_map(|params| analyzer.run(population, params))
            .collect();

        tracing::info!(
            combinations = self.len(),
            produced = results.len(),
            population = population.len(),
            "Threshold sweep complete"
        );
        results
    }
}
