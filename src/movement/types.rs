//! Movement types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::snapshot::{PropType, SeriesKey};

/// Disjunctive drop threshold
///
/// Only drops count: a line that rises is never significant no matter how
/// far it moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropThreshold {
    /// Percent drop, positive (10.0 means a 10% drop)
    pub pct: Decimal,
    /// Absolute drop in line units, positive
    pub abs: Decimal,
}

impl DropThreshold {
    pub fn new(pct: Decimal, abs: Decimal) -> Self {
        Self { pct, abs }
    }

    /// `absolute <= -abs OR percent <= -pct`
    pub fn is_met(&self, absolute: Decimal, percent: Decimal) -> bool {
        absolute <= -self.abs || percent <= -self.pct
    }

    /// Baseline rule: the drop is smaller than both thresholds
    pub fn is_below(&self, absolute: Decimal, percent: Decimal) -> bool {
        percent > -self.pct && absolute > -self.abs
    }
}

/// Absolute and percent change from `initial` to `last`
///
/// Percent is zero when the initial line is zero.
pub fn line_change(initial: Decimal, last: Decimal) -> (Decimal, Decimal) {
    let absolute = last - initial;
    let percent = if initial.is_zero() {
        Decimal::ZERO
    } else {
        absolute / initial * Decimal::ONE_HUNDRED
    };
    (absolute, percent)
}

/// A late line movement for one (event, player, prop type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub event_id: String,
    pub player: String,
    pub prop_type: PropType,
    pub game_commence_time: DateTime<Utc>,

    pub initial_line: Decimal,
    pub final_line: Decimal,
    pub initial_observed_at: DateTime<Utc>,
    pub final_observed_at: DateTime<Utc>,

    /// final - initial
    pub movement_absolute: Decimal,
    /// (final - initial) / initial * 100
    pub movement_pct: Decimal,
    /// Hours from the final observation to kickoff
    pub hours_before_kickoff: Decimal,

    /// Actual yards, once the game is final
    #[serde(default)]
    pub actual: Option<i32>,
    #[serde(default)]
    pub went_over: Option<bool>,
    #[serde(default)]
    pub went_under: Option<bool>,
}

impl Movement {
    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.event_id.clone(), self.player.clone(), self.prop_type)
    }

    /// Whether a result has been matched
    pub fn has_outcome(&self) -> bool {
        self.actual.is_some()
    }

    /// Actual equalled the final line
    pub fn is_push(&self) -> bool {
        self.has_outcome() && self.went_over == Some(false) && self.went_under == Some(false)
    }

    pub fn went_over(&self) -> bool {
        self.went_over.unwrap_or(false)
    }

    pub fn went_under(&self) -> bool {
        self.went_under.unwrap_or(false)
    }

    pub fn is_significant(&self, threshold: &DropThreshold) -> bool {
        threshold.is_met(self.movement_absolute, self.movement_pct)
    }
}
