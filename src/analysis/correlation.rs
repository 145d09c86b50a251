//! Correlation analyzer
//!
//! Tests whether late significant drops are followed by the player going
//! under the final line more often than movements without such a drop.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use super::stats::{chi_square_test, wilson_interval};
use super::types::{AnalysisResult, GroupRates, ThesisPolicy};
use crate::movement::{DropThreshold, Movement};
use crate::snapshot::PropType;
use crate::telemetry::ANALYSES_PRODUCED;

/// Baseline under rate assumed when the baseline group is empty
pub const DEFAULT_BASELINE_UNDER_RATE: f64 = 0.5;

/// Parameters for one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    pub name: String,
    pub threshold: DropThreshold,
    /// Test group is limited to movements at most this many hours before kickoff
    pub hours_before: Decimal,
    /// `None` means all prop types
    pub prop_type: Option<PropType>,
    /// Inclusive bounds on game commence time
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl AnalysisParams {
    pub fn new(name: impl Into<String>, threshold: DropThreshold, hours_before: Decimal) -> Self {
        Self {
            name: name.into(),
            threshold,
            hours_before,
            prop_type: None,
            start: None,
            end: None,
        }
    }

    pub fn with_prop_type(mut self, prop_type: Option<PropType>) -> Self {
        self.prop_type = prop_type;
        self
    }

    pub fn with_date_range(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    fn in_scope(&self, m: &Movement) -> bool {
        m.has_outcome()
            && self.prop_type.map_or(true, |p| m.prop_type == p)
            && self.start.map_or(true, |t| m.game_commence_time >= t)
            && self.end.map_or(true, |t| m.game_commence_time <= t)
    }
}

/// Runs the under-rate comparison between the test and baseline groups
#[derive(Debug, Clone, Default)]
pub struct CorrelationAnalyzer {
    policy: ThesisPolicy,
}

impl CorrelationAnalyzer {
    pub fn new(policy: ThesisPolicy) -> Self {
        Self { policy }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn policy(&self) -> &ThesisPolicy {
        &self.policy
    }

    /// Analyze a population of movements
    ///
    /// Movements without an outcome are ignored. The test group holds the
    /// movements meeting the drop threshold within `hours_before` of kickoff;
    /// the baseline holds those below both thresholds. Returns `None` when
    /// the test group is empty.
    pub fn run(&self, population: &[Movement], params: &AnalysisParams) -> Option<AnalysisResult> {
        let in_scope: Vec<&Movement> = population.iter().filter(|m| params.in_scope(m)).collect();

        let test_group: Vec<&Movement> = in_scope
            .iter()
            .copied()
            .filter(|m| m.is_significant(&params.threshold) && m.hours_before_kickoff <= params.hours_before)
            .collect();

        if test_group.is_empty() {
            debug!(analysis = %params.name, in_scope = in_scope.len(), "No movements in test group");
            return None;
        }

        let baseline = GroupRates::from_movements(in_scope.iter().copied().filter(|m| {
            params
                .threshold
                .is_below(m.movement_absolute, m.movement_pct)
        }));
        let test = GroupRates::from_movements(test_group.iter().copied());

        let expected_under_rate = baseline.under_rate.unwrap_or(DEFAULT_BASELINE_UNDER_RATE);
        let (chi_square, p_value) = chi_square_test(test.under_count, test.total, expected_under_rate);
        let (ci_low, ci_high) =
            wilson_interval(test.under_count, test.total, self.policy.confidence_level);

        let kickoffs = || test_group.iter().map(|m| m.game_commence_time);
        let date_range_start = params.start.or_else(|| kickoffs().min())?;
        let date_range_end = params.end.or_else(|| kickoffs().max())?;

        let result = AnalysisResult {
            analysis_name: params.name.clone(),
            prop_type: params.prop_type,
            threshold_pct: params.threshold.pct,
            threshold_abs: params.threshold.abs,
            hours_before: params.hours_before,
            date_range_start,
            date_range_end,
            sample_size: test.total,
            over_count: test.over_count,
            under_count: test.under_count,
            push_count: test.push_count,
            over_rate: test.over_rate.unwrap_or_default(),
            under_rate: test.under_rate.unwrap_or_default(),
            chi_square,
            p_value,
            is_significant: p_value < self.policy.significance_level,
            confidence_level: self.policy.confidence_level,
            ci_low,
            ci_high,
            expected_under_rate,
            baseline,
        };

        metrics::counter!(ANALYSES_PRODUCED).increment(1);
        debug!(
            analysis = %result.analysis_name,
            sample_size = result.sample_size,
            under_rate = result.under_rate,
            p_value = result.p_value,
            baseline_size = result.baseline.total,
            "Analysis complete"
        );

        Some(result)
    }
}
