//! Data input/output
//!
//! Feed readers for snapshots and game stats, JSON persistence for the
//! movement and analysis stores, and Parquet export for offline analysis.

mod feed;
mod json;
mod parquet;

pub use self::feed::{read_game_stats, read_jsonl, read_snapshots};
pub use self::json::{read_json_or_default, write_json};
pub use self::parquet::{analysis_schema, movement_schema, ParquetExporter, ParquetReader};
