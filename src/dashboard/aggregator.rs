//! Per-bookmaker window aggregation
//!
//! Each bookmaker is treated on its own history: a book that starts quoting
//! late has its own opening line, and a book with sparse history simply has
//! empty short-window deltas.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::window::{LookbackWindow, WindowDeltas};
use crate::movement::line_change;
use crate::snapshot::{group_into_series, BookQuote, Bookmaker, PropType, Snapshot, SnapshotSeries};

/// Change of one book's line between a past observation and now
///
/// All fields are empty when no qualifying past observation exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineDelta {
    pub absolute: Option<Decimal>,
    pub percent: Option<Decimal>,
    pub old_line: Option<Decimal>,
    pub old_observed_at: Option<DateTime<Utc>>,
    pub old_over_price: Option<i32>,
    pub old_under_price: Option<i32>,
    pub new_over_price: Option<i32>,
    pub new_under_price: Option<i32>,
}

impl LineDelta {
    fn between(old: &Observation<'_>, new: &Observation<'_>) -> Self {
        let (absolute, percent) = line_change(old.line, new.line);
        Self {
            absolute: Some(absolute),
            percent: Some(percent),
            old_line: Some(old.line),
            old_observed_at: Some(old.observed_at),
            old_over_price: old.quote.over_price,
            old_under_price: old.quote.under_price,
            new_over_price: new.quote.over_price,
            new_under_price: new.quote.under_price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.absolute.is_none()
    }
}

/// Current quote and window deltas for one bookmaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub line: Decimal,
    pub over_price: Option<i32>,
    pub under_price: Option<i32>,
    pub observed_at: DateTime<Utc>,
    pub last_updated: Option<DateTime<Utc>>,
    pub deltas: WindowDeltas,
}

/// Dashboard row for one (event, player, prop type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardItem {
    pub event_id: String,
    pub player: String,
    pub prop_type: PropType,
    pub game_commence_time: DateTime<Utc>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub books: BTreeMap<Bookmaker, BookSnapshot>,
}

impl DashboardItem {
    /// Most recent observation across all books
    pub fn last_observed_at(&self) -> Option<DateTime<Utc>> {
        self.books.values().map(|b| b.observed_at).max()
    }
}

#[derive(Debug, Clone, Copy)]
struct Observation<'a> {
    observed_at: DateTime<Utc>,
    line: Decimal,
    quote: &'a BookQuote,
}

/// Computes per-book current lines and window deltas
#[derive(Debug, Clone, Default)]
pub struct WindowAggregator;

impl WindowAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate one series as of `now`
    ///
    /// Observations after `now` are ignored. Books with no line at all are
    /// absent from the result.
    pub fn aggregate(
        &self,
        series: &SnapshotSeries,
        now: DateTime<Utc>,
    ) -> BTreeMap<Bookmaker, BookSnapshot> {
        Bookmaker::ALL
            .iter()
            .filter_map(|&book| {
                let history = Self::history(series, book, now);
                Self::book_snapshot(&history, now).map(|snapshot| (book, snapshot))
            })
            .collect()
    }

    /// Observations with a line for one book, oldest first
    fn history(series: &SnapshotSeries, book: Bookmaker, now: DateTime<Utc>) -> Vec<Observation<'_>> {
        series
            .snapshots()
            .iter()
            .filter(|s| s.observed_at <= now)
            .filter_map(|s| {
                let quote = s.quote(book)?;
                Some(Observation {
                    observed_at: s.observed_at,
                    line: quote.line?,
                    quote,
                })
            })
            .collect()
    }

    fn book_snapshot(history: &[Observation<'_>], now: DateTime<Utc>) -> Option<BookSnapshot> {
        let current = history.last()?;

        let mut deltas = WindowDeltas::default();
        for window in LookbackWindow::ALL {
            let baseline = match window.offset() {
                Some(offset) => Self::nearest_in_window(history, now - offset, now - offset * 2),
                None => history.first(),
            };
            if let Some(baseline) = baseline {
                *deltas.get_mut(window) = LineDelta::between(baseline, current);
            }
        }

        Some(BookSnapshot {
            line: current.line,
            over_price: current.quote.over_price,
            under_price: current.quote.under_price,
            observed_at: current.observed_at,
            last_updated: current.quote.last_updated,
            deltas,
        })
    }

    /// Closest observation to `target` among those at or before it
    ///
    /// History is oldest first, so that is the most recent one not after
    /// `target`. Observations older than `floor` are out of range.
    fn nearest_in_window<'h, 'a>(
        history: &'h [Observation<'a>],
        target: DateTime<Utc>,
        floor: DateTime<Utc>,
    ) -> Option<&'h Observation<'a>> {
        history
            .iter()
            .rev()
            .find(|o| o.observed_at <= target && o.observed_at >= floor)
    }
}

/// Build dashboard rows from raw snapshots
///
/// Rows without a current consensus line are dropped. Series that fail
/// validation are logged and skipped.
pub fn build_dashboard(snapshots: Vec<Snapshot>, now: DateTime<Utc>) -> Vec<DashboardItem> {
    let aggregator = WindowAggregator::new();
    let mut items = Vec::new();

    for (key, series) in group_into_series(snapshots) {
        let series = match series {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Skipping series on dashboard");
                continue;
            }
        };

        let books = aggregator.aggregate(&series, now);
        if !books.contains_key(&Bookmaker::Consensus) {
            continue;
        }

        let Some(latest) = series.last() else {
            continue;
        };
        items.push(DashboardItem {
            event_id: key.event_id,
            player: key.player,
            prop_type: key.prop_type,
            game_commence_time: latest.game_commence_time,
            home_team: latest.home_team.clone(),
            away_team: latest.away_team.clone(),
            books,
        });
    }

    items.sort_by(|a, b| {
        a.game_commence_time
            .cmp(&b.game_commence_time)
            .then_with(|| a.player.cmp(&b.player))
            .then_with(|| a.prop_type.cmp(&b.prop_type))
    });
    items
}
