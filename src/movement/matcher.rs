//! Matching movements to actual game results

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::Movement;
use crate::snapshot::PropType;

/// Authoritative box-score line for a player in a completed game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStat {
    pub event_id: String,
    pub player: String,
    #[serde(default)]
    pub game_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default)]
    pub week: Option<u32>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub rushing_attempts: Option<i32>,
    #[serde(default)]
    pub rushing_yards: Option<i32>,
    #[serde(default)]
    pub receptions: Option<i32>,
    #[serde(default)]
    pub receiving_yards: Option<i32>,
}

impl GameStat {
    pub fn new(event_id: impl Into<String>, player: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            player: player.into(),
            game_date: None,
            season: None,
            week: None,
            team: None,
            opponent: None,
            rushing_attempts: None,
            rushing_yards: None,
            receptions: None,
            receiving_yards: None,
        }
    }

    /// The stat a prop type settles on
    pub fn yards_for(&self, prop_type: PropType) -> Option<i32> {
        match prop_type {
            PropType::RushingYards => self.rushing_yards,
            PropType::ReceivingYards => self.receiving_yards,
        }
    }
}

/// Source of game stats keyed by (event, player)
pub trait StatsLookup {
    fn find(&self, event_id: &str, player: &str) -> Option<&GameStat>;
}

/// In-memory stats keyed by (event, player)
#[derive(Debug, Clone, Default)]
pub struct StatsIndex {
    stats: HashMap<(String, String), GameStat>,
}

impl StatsIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the stat line for (event, player)
    pub fn insert(&mut self, stat: GameStat) {
        self.stats
            .insert((stat.event_id.clone(), stat.player.clone()), stat);
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

impl FromIterator<GameStat> for StatsIndex {
    fn from_iter<I: IntoIterator<Item = GameStat>>(iter: I) -> Self {
        let mut index = Self::new();
        for stat in iter {
            index.insert(stat);
        }
        index
    }
}

impl StatsLookup for StatsIndex {
    fn find(&self, event_id: &str, player: &str) -> Option<&GameStat> {
        self.stats.get(&(event_id.to_string(), player.to_string()))
    }
}

/// Annotates movements with over/under outcomes
pub struct ResultMatcher;

impl ResultMatcher {
    /// Attach the actual result to a movement
    ///
    /// Without a stat line (or without the relevant stat) the movement comes
    /// back unchanged and its outcome fields stay empty.
    pub fn annotate(mut movement: Movement, stats: &impl StatsLookup) -> Movement {
        let Some(actual) = stats
            .find(&movement.event_id, &movement.player)
            .and_then(|stat| stat.yards_for(movement.prop_type))
        else {
            return movement;
        };

        let actual_line = Decimal::from(actual);
        movement.actual = Some(actual);
        movement.went_over = Some(actual_line > movement.final_line);
        movement.went_under = Some(actual_line < movement.final_line);
        movement
    }
}
