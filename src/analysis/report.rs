//! Text summary report

use std::fmt::Write;

use super::sweep::{PropFilter, ThresholdSet};
use super::types::{AnalysisResult, Conclusion, ThesisPolicy};

const RULE_HEAVY: &str = "══════════════════════════════════════════════════════════════════════";
const RULE_LIGHT: &str = "──────────────────────────────────────────────────────────────────────";

/// Result for all props at the primary percent and lateness thresholds
pub fn primary_result<'a>(results: &'a [AnalysisResult], primary: &ThresholdSet) -> Option<&'a AnalysisResult> {
    results.iter().find(|r| {
        r.prop_type.is_none() && r.threshold_pct == primary.pct && r.hours_before == primary.hours
    })
}

/// Conclusion wording for the primary analysis
pub fn conclusion_text(result: &AnalysisResult, policy: &ThesisPolicy) -> String {
    let under_pct = result.under_rate * 100.0;
    match Conclusion::of(result, policy) {
        Conclusion::Supported => format!(
            "The thesis is SUPPORTED. Players with significant line drops\n\
             went under {:.1}% of the time (p = {:.4}).",
            under_pct, result.p_value
        ),
        Conclusion::Trending => format!(
            "The thesis shows a TREND. Players with significant line drops\n\
             went under {:.1}% of the time, but more data is needed.",
            under_pct
        ),
        Conclusion::NotSupported => format!(
            "The thesis is NOT SUPPORTED. Players with significant line drops\n\
             went under only {:.1}% of the time.",
            under_pct
        ),
    }
}

fn write_result(out: &mut String, r: &AnalysisResult) -> std::fmt::Result {
    let pct = |rate: f64| rate * 100.0;
    writeln!(out, "Analysis:         {}", r.analysis_name)?;
    writeln!(out, "Prop Type:        {}", PropFilter::from(r.prop_type))?;
    writeln!(out, "Thresholds:       {}% or {} yards", r.threshold_pct, r.threshold_abs)?;
    writeln!(out, "Time Window:      within {} hours of kickoff", r.hours_before)?;
    writeln!(
        out,
        "Games:            {} to {}",
        r.date_range_start.format("%Y-%m-%d"),
        r.date_range_end.format("%Y-%m-%d")
    )?;
    writeln!(out, "Sample Size:      {}", r.sample_size)?;
    writeln!(out, "Under Rate:       {:.1}% ({}/{})", pct(r.under_rate), r.under_count, r.sample_size)?;
    writeln!(out, "Over Rate:        {:.1}% ({}/{})", pct(r.over_rate), r.over_count, r.sample_size)?;
    if r.push_count > 0 {
        writeln!(out, "Pushes:           {}", r.push_count)?;
    }
    writeln!(
        out,
        "{:.0}% CI:           [{:.1}%, {:.1}%]",
        pct(r.confidence_level),
        pct(r.ci_low),
        pct(r.ci_high)
    )?;
    writeln!(out, "Chi-Square:       {:.4}", r.chi_square)?;
    writeln!(out, "P-Value:          {:.4}", r.p_value)?;
    writeln!(out, "Significant:      {}", if r.is_significant { "YES" } else { "NO" })?;
    match r.baseline.under_rate {
        Some(rate) => writeln!(
            out,
            "Baseline Under:   {:.1}% (n={})",
            pct(rate),
            r.baseline.total
        )?,
        None => writeln!(out, "Baseline Under:   n/a (expected {:.1}%)", pct(r.expected_under_rate))?,
    }
    writeln!(out, "{RULE_LIGHT}")
}

/// Human-readable report over a set of results
///
/// Results are listed in the order given. The conclusion is keyed on the
/// all-props result at the `primary` thresholds.
pub fn summary_report(results: &[AnalysisResult], primary: &ThresholdSet, policy: &ThesisPolicy) -> String {
    if results.is_empty() {
        return "No analysis results found.".to_string();
    }

    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, results, primary, policy);
    out
}

fn write_report(
    out: &mut String,
    results: &[AnalysisResult],
    primary: &ThresholdSet,
    policy: &ThesisPolicy,
) -> std::fmt::Result {
    writeln!(out, "{RULE_HEAVY}")?;
    writeln!(out, "        PROP LINE MOVEMENT ANALYSIS - THESIS VALIDATION REPORT")?;
    writeln!(out, "{RULE_HEAVY}")?;
    writeln!(out)?;
    writeln!(out, "THESIS: Large drops in yardage prop lines close to kickoff correlate")?;
    writeln!(out, "        with players going UNDER their prop line.")?;
    writeln!(out)?;
    writeln!(out, "{RULE_LIGHT}")?;

    for result in results {
        write_result(out, result)?;
    }

    writeln!(out)?;
    writeln!(out, "{RULE_HEAVY}")?;
    writeln!(out, "CONCLUSION")?;
    match primary_result(results, primary) {
        Some(main) => writeln!(out, "{}", conclusion_text(main, policy))?,
        None => writeln!(out, "Unable to generate conclusion - main analysis not found.")?,
    }
    writeln!(out, "{RULE_HEAVY}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::GroupRates;
    use crate::snapshot::PropType;
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn result(prop_type: Option<PropType>, pct: Decimal, under: usize, total: usize, p_value: f64) -> AnalysisResult {
        let start = DateTime::parse_from_rfc3339("2024-09-05T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let set = ThresholdSet::new(pct, dec!(5.0), dec!(3.0));
        AnalysisResult {
            analysis_name: crate::analysis::analysis_name(PropFilter::from(prop_type), &set, None, None),
            prop_type,
            threshold_pct: pct,
            threshold_abs: dec!(5.0),
            hours_before: dec!(3.0),
            date_range_start: start,
            date_range_end: start,
            sample_size: total,
            over_count: total - under,
            under_count: under,
            push_count: 0,
            over_rate: (total - under) as f64 / total as f64,
            under_rate: under as f64 / total as f64,
            chi_square: 6.4,
            p_value,
            is_significant: p_value < 0.05,
            confidence_level: 0.95,
            ci_low: 0.55,
            ci_high: 0.82,
            expected_under_rate: 0.5,
            baseline: GroupRates {
                total: 20,
                over_count: 10,
                under_count: 10,
                push_count: 0,
                over_rate: Some(0.5),
                under_rate: Some(0.5),
            },
        }
    }

    fn primary() -> ThresholdSet {
        ThresholdSet::new(dec!(10), dec!(5), dec!(3))
    }

    #[test]
    fn test_empty_report() {
        let report = summary_report(&[], &primary(), &ThesisPolicy::default());
        assert_eq!(report, "No analysis results found.");
    }

    #[test]
    fn test_supported_conclusion() {
        let results = vec![
            result(Some(PropType::RushingYards), dec!(10.0), 5, 20, 0.5),
            result(None, dec!(10.0), 28, 40, 0.0114),
        ];
        let report = summary_report(&results, &primary(), &ThesisPolicy::default());

        assert!(report.contains("THESIS: Large drops"));
        assert!(report.contains("Analysis:         thesis_all_pct10.0_abs5.0_hrs3.0"));
        assert!(report.contains("Prop Type:        rushing_yards"));
        assert!(report.contains("Under Rate:       70.0% (28/40)"));
        assert!(report.contains("95% CI:           [55.0%, 82.0%]"));
        assert!(report.contains("Baseline Under:   50.0% (n=20)"));
        assert!(report.contains("The thesis is SUPPORTED"));
        assert!(report.contains("went under 70.0% of the time"));
    }

    #[test]
    fn test_trend_and_not_supported() {
        let policy = ThesisPolicy::default();
        let trend = vec![result(None, dec!(10.0), 21, 40, 0.6)];
        assert!(summary_report(&trend, &primary(), &policy).contains("shows a TREND"));

        let not = vec![result(None, dec!(10.0), 16, 40, 0.2)];
        assert!(summary_report(&not, &primary(), &policy).contains("NOT SUPPORTED"));
    }

    #[test]
    fn test_missing_primary() {
        let results = vec![result(None, dec!(15.0), 28, 40, 0.01)];
        let report = summary_report(&results, &primary(), &ThesisPolicy::default());
        assert!(report.contains("main analysis not found"));
    }
}
