//! Prop line snapshot model
//!
//! Raw per-bookmaker quote observations for one (event, player, prop type),
//! and their grouping into time-ordered series.

mod series;
mod types;

pub use series::{group_into_series, SeriesKey, SnapshotSeries};
pub use types::{BookQuote, Bookmaker, DataSource, PropType, Snapshot};
