//! Error types
//!
//! Absence of data is never an error here; these cover invalid input and
//! upstream I/O failures.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// A snapshot series that cannot be analyzed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    /// No snapshots at all
    #[error("series has no snapshots")]
    Empty,
    /// Snapshots from different (event, player, prop) keys
    #[error("series mixes snapshots from {0} and {1}")]
    MixedKeys(String, String),
    /// Two snapshots observed at the same instant
    #[error("duplicate observation at {0}")]
    DuplicateObservation(DateTime<Utc>),
}

/// Failure reading an input feed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read feed {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed record at {path}:{line}: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure loading or saving a persisted store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
