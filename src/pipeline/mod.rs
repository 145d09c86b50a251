//! Batch detection pipeline
//!
//! Groups a snapshot feed into series, detects (or measures) the late
//! movement of each, and matches it against game stats. Each series is
//! processed independently: a series that fails validation is recorded in
//! the report and the rest of the batch carries on.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::SeriesError;
use crate::movement::{DetectorConfig, Movement, MovementDetector, ResultMatcher, StatsLookup};
use crate::snapshot::{group_into_series, SeriesKey, Snapshot};
use crate::telemetry::{MOVEMENTS_DETECTED, MOVEMENTS_MATCHED, SERIES_FAILED, SERIES_PROCESSED};

/// One series that could not be processed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesFailure {
    pub key: String,
    pub error: String,
    #[serde(skip)]
    pub source: SeriesError,
}

impl SeriesFailure {
    fn new(key: &SeriesKey, error: SeriesError) -> Self {
        Self {
            key: key.to_string(),
            error: error.to_string(),
            source: error,
        }
    }
}

/// Outcome of one batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Distinct (event, player, prop type) keys seen
    pub series_total: usize,
    pub movements: Vec<Movement>,
    pub failures: Vec<SeriesFailure>,
}

impl BatchReport {
    /// Movements with a matched result
    pub fn matched(&self) -> usize {
        self.movements.iter().filter(|m| m.has_outcome()).count()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Detection + result matching over a whole snapshot feed
pub struct DetectionBatch {
    detector: MovementDetector,
    keep_all_magnitudes: bool,
    kickoff_start: Option<DateTime<Utc>>,
    kickoff_end: Option<DateTime<Utc>>,
}

impl DetectionBatch {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            detector: MovementDetector::new(config),
            keep_all_magnitudes: false,
            kickoff_start: None,
            kickoff_end: None,
        }
    }

    /// Keep every measured movement, significant or not
    pub fn keep_all_magnitudes(mut self, keep: bool) -> Self {
        self.keep_all_magnitudes = keep;
        self
    }

    /// Only process games kicking off within the inclusive range
    pub fn with_kickoff_range(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.kickoff_start = start;
        self.kickoff_end = end;
        self
    }

    pub fn detector(&self) -> &MovementDetector {
        &self.detector
    }

    fn kickoff_in_range(&self, kickoff: DateTime<Utc>) -> bool {
        self.kickoff_start.map_or(true, |t| kickoff >= t) && self.kickoff_end.map_or(true, |t| kickoff <= t)
    }

    /// Run over a snapshot feed as of `now`
    ///
    /// Snapshots observed after `now` are ignored.
    pub fn run(&self, snapshots: Vec<Snapshot>, stats: &impl StatsLookup, now: DateTime<Utc>) -> BatchReport {
        let visible = snapshots.into_iter().filter(|s| s.observed_at <= now);
        let grouped = group_into_series(visible);

        let mut report = BatchReport {
            series_total: grouped.len(),
            ..Default::default()
        };

        for (key, series) in grouped {
            metrics::counter!(SERIES_PROCESSED).increment(1);

            let series = match series {
                Ok(series) => series,
                Err(e) => {
                    warn!(key = %key, error = %e, "Series failed validation");
                    metrics::counter!(SERIES_FAILED).increment(1);
                    report.failures.push(SeriesFailure::new(&key, e));
                    continue;
                }
            };

            let Some(kickoff) = series.game_commence_time() else {
                continue;
            };
            if !self.kickoff_in_range(kickoff) {
                continue;
            }

            let movement = if self.keep_all_magnitudes {
                self.detector.measure(&series, kickoff)
            } else {
                self.detector.detect(&series, kickoff)
            };
            let Some(movement) = movement else {
                continue;
            };

            metrics::counter!(MOVEMENTS_DETECTED).increment(1);
            let movement = ResultMatcher::annotate(movement, stats);
            if movement.has_outcome() {
                metrics::counter!(MOVEMENTS_MATCHED).increment(1);
            }

            debug!(
                key = %key,
                pct = %movement.movement_pct,
                abs = %movement.movement_absolute,
                hours_before = %movement.hours_before_kickoff,
                actual = ?movement.actual,
                "Movement recorded"
            );
            report.movements.push(movement);
        }

        info!(
            series = report.series_total,
            movements = report.movements.len(),
            matched = report.matched(),
            failures = report.failures.len(),
            "Detection batch complete"
        );
        report
    }
}

impl From<&crate::config::DetectionConfig> for DetectionBatch {
    fn from(config: &crate::config::DetectionConfig) -> Self {
        Self::new(DetectorConfig::from(config)).keep_all_magnitudes(config.keep_all_magnitudes)
    }
}
