//! Statistical primitives
//!
//! Plain `f64` math over `statrs` distributions. The chi-square test here is
//! the one-sample two-cell goodness-of-fit, so one degree of freedom.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Chi-square goodness-of-fit of observed (under, over) against a rate
///
/// Observed over is `total - under`, so pushes fall into the over cell.
/// Returns `(chi2, p_value)`. Zero sample, a zero expected rate, or any
/// expected cell of zero short-circuits to `(0.0, 1.0)`.
pub fn chi_square_test(observed_under: usize, total: usize, expected_under_rate: f64) -> (f64, f64) {
    if total == 0 || expected_under_rate == 0.0 {
        return (0.0, 1.0);
    }

    let n = total as f64;
    let observed = [observed_under as f64, (total - observed_under.min(total)) as f64];
    let expected = [n * expected_under_rate, n * (1.0 - expected_under_rate)];

    if expected.iter().any(|e| *e <= 0.0) {
        return (0.0, 1.0);
    }

    let chi2: f64 = observed
        .iter()
        .zip(expected.iter())
        .map(|(o, e)| (o - e).powi(2) / e)
        .sum();

    if chi2 <= 0.0 {
        return (chi2, 1.0);
    }
    match ChiSquared::new(1.0) {
        Ok(dist) => (chi2, dist.sf(chi2).clamp(0.0, 1.0)),
        Err(_) => (chi2, 1.0),
    }
}

/// Wilson score interval for a proportion, clamped to [0, 1]
///
/// A zero sample gives the uninformative `(0.0, 1.0)`.
pub fn wilson_interval(successes: usize, total: usize, confidence: f64) -> (f64, f64) {
    if total == 0 {
        return (0.0, 1.0);
    }

    let n = total as f64;
    let p = successes as f64 / n;
    let z = z_score(confidence);
    let z2 = z * z;

    let denominator = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denominator;
    let spread = z * ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt() / denominator;

    ((center - spread).max(0.0), (center + spread).min(1.0))
}

/// Two-sided critical value for a confidence level (0.95 -> ~1.96)
///
/// Levels outside (0, 1) are clamped just inside the interval.
pub fn z_score(confidence: f64) -> f64 {
    let confidence = confidence.clamp(1e-12, 1.0 - 1e-12);
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf((1.0 + confidence) / 2.0),
        Err(_) => f64::NAN,
    }
}

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(x),
        Err(_) => f64::NAN,
    }
}
