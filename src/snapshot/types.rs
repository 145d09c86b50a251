//! Snapshot types
//!
//! A snapshot is one observation of a player's prop line across the tracked
//! bookmakers. Bookmakers are an explicit enum keyed into a quote table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Player performance prop being quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropType {
    RushingYards,
    ReceivingYards,
}

impl PropType {
    pub const ALL: [PropType; 2] = [PropType::RushingYards, PropType::ReceivingYards];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropType::RushingYards => "rushing_yards",
            PropType::ReceivingYards => "receiving_yards",
        }
    }
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rushing_yards" | "rushing" => Ok(PropType::RushingYards),
            "receiving_yards" | "receiving" => Ok(PropType::ReceivingYards),
            other => Err(format!("invalid prop type: {other}")),
        }
    }
}

/// Tracked bookmakers, including the synthetic consensus line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bookmaker {
    Consensus,
    DraftKings,
    FanDuel,
    BetMgm,
    Caesars,
    PointsBet,
}

impl Bookmaker {
    pub const ALL: [Bookmaker; 6] = [
        Bookmaker::Consensus,
        Bookmaker::DraftKings,
        Bookmaker::FanDuel,
        Bookmaker::BetMgm,
        Bookmaker::Caesars,
        Bookmaker::PointsBet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bookmaker::Consensus => "consensus",
            Bookmaker::DraftKings => "draft_kings",
            Bookmaker::FanDuel => "fan_duel",
            Bookmaker::BetMgm => "bet_mgm",
            Bookmaker::Caesars => "caesars",
            Bookmaker::PointsBet => "points_bet",
        }
    }
}

impl fmt::Display for Bookmaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a snapshot was collected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    BettingPros,
    OddsApi,
}

/// One bookmaker's quote inside a snapshot
///
/// Prices are American odds. Every field is optional: a book may publish a
/// line without prices, or nothing at all for a given observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookQuote {
    #[serde(default)]
    pub line: Option<Decimal>,
    #[serde(default)]
    pub over_price: Option<i32>,
    #[serde(default)]
    pub under_price: Option<i32>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl BookQuote {
    /// Quote with only a line
    pub fn line(line: Decimal) -> Self {
        Self {
            line: Some(line),
            ..Default::default()
        }
    }

    /// Quote with a line and both prices
    pub fn priced(line: Decimal, over_price: i32, under_price: i32) -> Self {
        Self {
            line: Some(line),
            over_price: Some(over_price),
            under_price: Some(under_price),
            last_updated: None,
        }
    }
}

/// Immutable observation of one player prop at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub event_id: String,
    pub player: String,
    pub prop_type: PropType,
    pub game_commence_time: DateTime<Utc>,
    pub observed_at: DateTime<Utc>,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub source: DataSource,
    #[serde(default)]
    pub books: BTreeMap<Bookmaker, BookQuote>,
}

impl Snapshot {
    /// Create a snapshot with no quotes
    pub fn new(
        event_id: impl Into<String>,
        player: impl Into<String>,
        prop_type: PropType,
        game_commence_time: DateTime<Utc>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            player: player.into(),
            prop_type,
            game_commence_time,
            observed_at,
            home_team: None,
            away_team: None,
            source: DataSource::default(),
            books: BTreeMap::new(),
        }
    }

    /// Attach a quote for a bookmaker
    pub fn with_quote(mut self, book: Bookmaker, quote: BookQuote) -> Self {
        self.books.insert(book, quote);
        self
    }

    /// Attach a bare line for a bookmaker
    pub fn with_line(self, book: Bookmaker, line: Decimal) -> Self {
        self.with_quote(book, BookQuote::line(line))
    }

    pub fn quote(&self, book: Bookmaker) -> Option<&BookQuote> {
        self.books.get(&book)
    }

    pub fn line(&self, book: Bookmaker) -> Option<Decimal> {
        self.quote(book).and_then(|q| q.line)
    }

    pub fn consensus_line(&self) -> Option<Decimal> {
        self.line(Bookmaker::Consensus)
    }

    /// Hours between this observation and kickoff (negative after kickoff)
    pub fn hours_before_kickoff(&self) -> Decimal {
        let secs = (self.game_commence_time - self.observed_at).num_seconds();
        (Decimal::from(secs) / Decimal::from(3600)).round_dp(2)
    }
}
