//! JSON Lines feed readers
//!
//! The collection side appends one JSON record per line. Blank lines are
//! skipped; any malformed line fails the whole read with its line number.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::FeedError;
use crate::movement::GameStat;
use crate::snapshot::Snapshot;
use crate::telemetry::SNAPSHOTS_INGESTED;

/// Read every record from a JSON Lines file
pub fn read_jsonl<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, FeedError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| FeedError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })
        })
        .collect()
}

pub fn read_snapshots(path: impl AsRef<Path>) -> Result<Vec<Snapshot>, FeedError> {
    let snapshots: Vec<Snapshot> = read_jsonl(path)?;
    metrics::counter!(SNAPSHOTS_INGESTED).increment(snapshots.len() as u64);
    Ok(snapshots)
}

pub fn read_game_stats(path: impl AsRef<Path>) -> Result<Vec<GameStat>, FeedError> {
    read_jsonl(path)
}
