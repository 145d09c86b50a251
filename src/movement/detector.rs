//! Late movement detection
//!
//! Compares the consensus line just before the lateness window to the most
//! recent consensus line. A movement is significant only as a drop past
//! either the percent or the absolute threshold.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::{line_change, DropThreshold, Movement};
use crate::config::DetectionConfig;
use crate::snapshot::{Snapshot, SnapshotSeries};

/// Configuration for movement detection
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Percent drop that counts as significant (default: 10%)
    pub threshold_pct: Decimal,

    /// Absolute drop that counts as significant (default: 5 yards)
    pub threshold_abs: Decimal,

    /// Lateness window before kickoff in hours (default: 3)
    pub hours_before: Decimal,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold_pct: dec!(10.0),
            threshold_abs: dec!(5.0),
            hours_before: dec!(3.0),
        }
    }
}

impl From<&DetectionConfig> for DetectorConfig {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            threshold_pct: config.threshold_pct,
            threshold_abs: config.threshold_abs,
            hours_before: config.hours_before,
        }
    }
}

impl DetectorConfig {
    pub fn threshold(&self) -> DropThreshold {
        DropThreshold::new(self.threshold_pct, self.threshold_abs)
    }

    fn lateness(&self) -> Duration {
        let secs = (self.hours_before * dec!(3600)).round().to_i64().unwrap_or(0);
        Duration::seconds(secs)
    }
}

/// Detects significant late drops in a series' consensus line
pub struct MovementDetector {
    config: DetectorConfig,
}

impl MovementDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(DetectorConfig::default())
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect a significant late drop
    ///
    /// Returns `None` when the series is too short, consensus data is missing
    /// at either endpoint, or the change does not cross the drop threshold.
    pub fn detect(&self, series: &SnapshotSeries, kickoff: DateTime<Utc>) -> Option<Movement> {
        let movement = self.measure(series, kickoff)?;

        if !movement.is_significant(&self.config.threshold()) {
            tracing::trace!(
                key = %series.key(),
                pct = %movement.movement_pct,
                abs = %movement.movement_absolute,
                "Movement below threshold"
            );
            return None;
        }

        Some(movement)
    }

    /// Measure the late movement without applying the significance rule
    pub fn measure(&self, series: &SnapshotSeries, kickoff: DateTime<Utc>) -> Option<Movement> {
        let (baseline, comparison) = self.endpoints(series, kickoff)?;

        let initial_line = baseline.consensus_line()?;
        let final_line = comparison.consensus_line()?;
        let (movement_absolute, movement_pct) = line_change(initial_line, final_line);

        let secs = (kickoff - comparison.observed_at).num_seconds();
        let hours_before_kickoff = (Decimal::from(secs) / dec!(3600)).round_dp(2);

        let key = series.key();
        Some(Movement {
            event_id: key.event_id.clone(),
            player: key.player.clone(),
            prop_type: key.prop_type,
            game_commence_time: kickoff,
            initial_line,
            final_line,
            initial_observed_at: baseline.observed_at,
            final_observed_at: comparison.observed_at,
            movement_absolute,
            movement_pct,
            hours_before_kickoff,
            actual: None,
            went_over: None,
            went_under: None,
        })
    }

    /// Pick the baseline and comparison observations
    ///
    /// With observations on both sides of the cutoff: the last one before it
    /// and the last one overall. Otherwise the first and last overall.
    fn endpoints<'a>(
        &self,
        series: &'a SnapshotSeries,
        kickoff: DateTime<Utc>,
    ) -> Option<(&'a Snapshot, &'a Snapshot)> {
        let snapshots = series.snapshots();
        if snapshots.len() < 2 {
            return None;
        }

        let cutoff = kickoff - self.config.lateness();
        let early = snapshots.iter().filter(|s| s.observed_at < cutoff).last();
        let late = snapshots.iter().filter(|s| s.observed_at >= cutoff).last();

        match (early, late) {
            (Some(early), Some(late)) => Some((early, late)),
            _ => Some((snapshots.first()?, snapshots.last()?)),
        }
    }
}
