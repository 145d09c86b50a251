//! Correlation analysis
//!
//! Compares the under rate of movements with a significant late drop
//! against a baseline of movements without one:
//! - chi-square goodness-of-fit against the baseline under rate
//! - Wilson score interval on the test group's under rate
//! - sweep over a grid of thresholds and prop filters
//! - text report with a supported / trending / not supported conclusion

mod correlation;
mod report;
mod stats;
mod store;
mod sweep;
mod types;

pub use correlation::{AnalysisParams, CorrelationAnalyzer, DEFAULT_BASELINE_UNDER_RATE};
pub use report::{conclusion_text, primary_result, summary_report};
pub use stats::{chi_square_test, normal_cdf, wilson_interval, z_score};
pub use store::AnalysisStore;
pub use sweep::{analysis_name, default_threshold_sets, PropFilter, ThresholdGrid, ThresholdSet};
pub use types::{AnalysisResult, Conclusion, GroupRates, ThesisPolicy};
