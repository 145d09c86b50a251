//! Movement records keyed by (event, player, prop type)
//!
//! Re-detecting a key overwrites its record instead of adding a second one.
//! A matched outcome survives an unmatched re-detection as long as the final
//! line it was settled against is unchanged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::types::Movement;
use crate::data::{read_json_or_default, write_json};
use crate::error::StoreError;
use crate::snapshot::{PropType, SeriesKey};

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Query filter over stored movements
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    /// Case-insensitive substring of the player name
    pub player: Option<String>,
    pub prop_type: Option<PropType>,
    /// Minimum drop in percent, positive (5.0 keeps drops of 5% or more)
    pub min_drop_pct: Option<Decimal>,
    pub max_hours_before: Option<Decimal>,
    pub went_under: Option<bool>,
    pub with_outcome_only: bool,
    /// Only games kicking off after this instant
    pub upcoming_after: Option<DateTime<Utc>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl MovementFilter {
    pub fn matches(&self, m: &Movement) -> bool {
        if let Some(ref needle) = self.player {
            if !m.player.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if self.prop_type.is_some_and(|p| p != m.prop_type) {
            return false;
        }
        if self.min_drop_pct.is_some_and(|pct| m.movement_pct > -pct) {
            return false;
        }
        if self.max_hours_before.is_some_and(|h| m.hours_before_kickoff > h) {
            return false;
        }
        if self.went_under.is_some() && m.went_under != self.went_under {
            return false;
        }
        if self.with_outcome_only && !m.has_outcome() {
            return false;
        }
        if self.upcoming_after.is_some_and(|t| m.game_commence_time <= t) {
            return false;
        }
        if self.start.is_some_and(|t| m.game_commence_time < t) {
            return false;
        }
        if self.end.is_some_and(|t| m.game_commence_time > t) {
            return false;
        }
        true
    }
}

/// Aggregate counts over a set of movements
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovementSummary {
    pub total_movements: usize,
    pub with_results: usize,
    pub over_count: usize,
    pub under_count: usize,
    pub over_rate: Option<f64>,
    pub under_rate: Option<f64>,
}

/// One live movement per (event, player, prop type)
#[derive(Debug, Clone, Default)]
pub struct MovementStore {
    records: BTreeMap<SeriesKey, Movement>,
}

impl MovementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; a missing file is an empty store
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let movements: Vec<Movement> = read_json_or_default(path.as_ref())?;
        let mut store = Self::new();
        for movement in movements {
            store.upsert(movement);
        }
        Ok(store)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let movements: Vec<&Movement> = self.records.values().collect();
        write_json(path.as_ref(), &movements)
    }

    /// Insert, or overwrite the record with the same key
    ///
    /// An incoming record without an outcome keeps the stored outcome when
    /// both share the same final line.
    pub fn upsert(&mut self, mut movement: Movement) -> UpsertOutcome {
        let key = movement.key();
        if let Some(existing) = self.records.get(&key) {
            if !movement.has_outcome() && existing.has_outcome() && existing.final_line == movement.final_line {
                movement.actual = existing.actual;
                movement.went_over = existing.went_over;
                movement.went_under = existing.went_under;
            }
        }

        match self.records.insert(key, movement) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        }
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&Movement> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Movement> {
        self.records.values()
    }

    /// Movements with a matched result, the population for analysis
    pub fn with_outcomes(&self) -> Vec<Movement> {
        self.iter().filter(|m| m.has_outcome()).cloned().collect()
    }

    /// Matching movements, latest kickoff first
    pub fn query(&self, filter: &MovementFilter) -> Vec<&Movement> {
        let mut hits: Vec<&Movement> = self.iter().filter(|m| filter.matches(m)).collect();
        hits.sort_by(|a, b| b.game_commence_time.cmp(&a.game_commence_time));
        hits
    }

    pub fn summary(&self, filter: &MovementFilter) -> MovementSummary {
        let hits = self.query(filter);
        let with_results = hits.iter().filter(|m| m.has_outcome()).count();
        let over_count = hits.iter().filter(|m| m.went_over()).count();
        let under_count = hits.iter().filter(|m| m.went_under()).count();

        let rate = |count: usize| (with_results > 0).then(|| count as f64 / with_results as f64);

        MovementSummary {
            total_movements: hits.len(),
            with_results,
            over_count,
            under_count,
            over_rate: rate(over_count),
            under_rate: rate(under_count),
        }
    }
}
