//! Live dashboard computation
//!
//! Per-bookmaker current line plus line deltas over fixed lookback windows,
//! served through a short-lived cache that the collection side invalidates
//! after persisting new snapshots.

mod aggregator;
mod cache;
mod service;
mod window;

pub use aggregator::{build_dashboard, BookSnapshot, DashboardItem, LineDelta, WindowAggregator};
pub use cache::TtlCache;
pub use service::{
    DashboardKey, DashboardService, JsonlSnapshotSource, MemorySnapshotSource, SnapshotSource,
    MAX_LOOKBACK_HOURS,
};
pub use window::{LookbackWindow, WindowDeltas};
