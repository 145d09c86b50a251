//! Snapshot series
//!
//! All snapshots sharing (event, player, prop type), ordered by observation
//! time. Series are built on demand from the raw feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::types::{PropType, Snapshot};
use crate::error::SeriesError;

/// Natural key of a series (and of the movement detected on it)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub event_id: String,
    pub player: String,
    pub prop_type: PropType,
}

impl SeriesKey {
    pub fn new(event_id: impl Into<String>, player: impl Into<String>, prop_type: PropType) -> Self {
        Self {
            event_id: event_id.into(),
            player: player.into(),
            prop_type,
        }
    }

    pub fn of(snapshot: &Snapshot) -> Self {
        Self::new(snapshot.event_id.clone(), snapshot.player.clone(), snapshot.prop_type)
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.event_id, self.player, self.prop_type)
    }
}

/// Time-ordered snapshots for one key
#[derive(Debug, Clone)]
pub struct SnapshotSeries {
    key: SeriesKey,
    snapshots: Vec<Snapshot>,
}

impl SnapshotSeries {
    /// Build a series, sorting by observation time
    ///
    /// Fails if the input is empty, mixes keys, or has two observations at
    /// the same instant.
    pub fn new(mut snapshots: Vec<Snapshot>) -> Result<Self, SeriesError> {
        let key = snapshots.first().map(SeriesKey::of).ok_or(SeriesError::Empty)?;

        if let Some(other) = snapshots.iter().map(SeriesKey::of).find(|k| *k != key) {
            return Err(SeriesError::MixedKeys(key.to_string(), other.to_string()));
        }

        snapshots.sort_by_key(|s| s.observed_at);

        if let Some(dup) = snapshots
            .windows(2)
            .find(|pair| pair[0].observed_at == pair[1].observed_at)
        {
            return Err(SeriesError::DuplicateObservation(dup[0].observed_at));
        }

        Ok(Self { key, snapshots })
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn first(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Kickoff time as reported by the most recent observation
    ///
    /// Reschedules show up in later snapshots, so the latest one wins.
    pub fn game_commence_time(&self) -> Option<DateTime<Utc>> {
        self.last().map(|s| s.game_commence_time)
    }
}

/// Group a raw feed into series, one entry per key
///
/// Each key carries its own build result so one bad series never hides the
/// others.
pub fn group_into_series(
    snapshots: impl IntoIterator<Item = Snapshot>,
) -> Vec<(SeriesKey, Result<SnapshotSeries, SeriesError>)> {
    let mut groups: BTreeMap<SeriesKey, Vec<Snapshot>> = BTreeMap::new();
    for snapshot in snapshots {
        groups.entry(SeriesKey::of(&snapshot)).or_default().push(snapshot);
    }

    groups
        .into_iter()
        .map(|(key, group)| (key, SnapshotSeries::new(group)))
        .collect()
}
