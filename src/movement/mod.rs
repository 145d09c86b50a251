//! Line movement module
//!
//! Detects significant late drops in a prop line, attaches the actual game
//! outcome, and keeps the one-per-key movement records.
//!
//! 1. `MovementDetector` compares the last pre-window consensus line to the
//!    most recent one
//! 2. `ResultMatcher` annotates the movement with the player's actual yards
//! 3. `MovementStore` upserts by (event, player, prop type)

mod detector;
mod matcher;
mod store;
mod types;

pub use detector::{DetectorConfig, MovementDetector};
pub use matcher::{GameStat, ResultMatcher, StatsIndex, StatsLookup};
pub use store::{MovementFilter, MovementStore, MovementSummary, UpsertOutcome};
pub use types::{line_change, DropThreshold, Movement};
