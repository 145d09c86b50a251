//! Analysis result types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::movement::Movement;
use crate::snapshot::PropType;

/// Over/under/push counts and rates for a group of movements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupRates {
    pub total: usize,
    pub over_count: usize,
    pub under_count: usize,
    pub push_count: usize,
    /// `None` for an empty group
    pub over_rate: Option<f64>,
    pub under_rate: Option<f64>,
}

impl GroupRates {
    pub fn from_movements<'a>(movements: impl IntoIterator<Item = &'a Movement>) -> Self {
        let mut rates = Self::default();
        for m in movements {
            rates.total += 1;
            if m.went_over() {
                rates.over_count += 1;
            }
            if m.went_under() {
                rates.under_count += 1;
            }
        }
        rates.push_count = rates.total - rates.over_count - rates.under_count;

        if rates.total > 0 {
            let total = rates.total as f64;
            rates.over_rate = Some(rates.over_count as f64 / total);
            rates.under_rate = Some(rates.under_count as f64 / total);
        }
        rates
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// One correlation analysis over a threshold combination and prop filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Deterministic name derived from the parameters; the upsert key
    pub analysis_name: String,
    /// `None` means all prop types
    pub prop_type: Option<PropType>,

    pub threshold_pct: Decimal,
    pub threshold_abs: Decimal,
    pub hours_before: Decimal,

    pub date_range_start: DateTime<Utc>,
    pub date_range_end: DateTime<Utc>,

    // Test group
    pub sample_size: usize,
    pub over_count: usize,
    pub under_count: usize,
    pub push_count: usize,
    pub over_rate: f64,
    pub under_rate: f64,

    pub chi_square: f64,
    pub p_value: f64,
    pub is_significant: bool,
    pub confidence_level: f64,
    pub ci_low: f64,
    pub ci_high: f64,

    /// Under rate the chi-square test compared against
    pub expected_under_rate: f64,
    pub baseline: GroupRates,
}

/// Policy constants for significance and the report conclusion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThesisPolicy {
    pub confidence_level: f64,
    pub significance_level: f64,
    pub supported_under_rate: f64,
    pub trending_under_rate: f64,
}

impl Default for ThesisPolicy {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            significance_level: 0.05,
            supported_under_rate: 0.55,
            trending_under_rate: 0.50,
        }
    }
}

impl From<&crate::config::AnalysisConfig> for ThesisPolicy {
    fn from(config: &crate::config::AnalysisConfig) -> Self {
        Self {
            confidence_level: config.confidence_level,
            significance_level: config.significance_level,
            supported_under_rate: config.supported_under_rate,
            trending_under_rate: config.trending_under_rate,
        }
    }
}

/// Verdict on the thesis for one analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    /// Significant and under rate above the supported threshold
    Supported,
    /// Under rate above the trending threshold, short of supported
    Trending,
    NotSupported,
}

impl Conclusion {
    pub fn of(result: &AnalysisResult, policy: &ThesisPolicy) -> Self {
        if result.is_significant && result.under_rate > policy.supported_under_rate {
            Conclusion::Supported
        } else if result.under_rate > policy.trending_under_rate {
            Conclusion::Trending
        } else {
            Conclusion::NotSupported
        }
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conclusion::Supported => write!(f, "SUPPORTED"),
            Conclusion::Trending => write!(f, "TREND"),
            Conclusion::NotSupported => write!(f, "NOT SUPPORTED"),
        }
    }
}
