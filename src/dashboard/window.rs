//! Lookback windows

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::aggregator::LineDelta;

/// Fixed lookback offsets plus the per-book opening line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookbackWindow {
    M5,
    M10,
    M15,
    M30,
    M45,
    H1,
    H12,
    H24,
    SinceOpen,
}

impl LookbackWindow {
    pub const ALL: [LookbackWindow; 9] = [
        LookbackWindow::M5,
        LookbackWindow::M10,
        LookbackWindow::M15,
        LookbackWindow::M30,
        LookbackWindow::M45,
        LookbackWindow::H1,
        LookbackWindow::H12,
        LookbackWindow::H24,
        LookbackWindow::SinceOpen,
    ];

    /// History a fixed window can reach back to for its baseline: twice the
    /// longest offset
    pub fn history_span() -> Duration {
        LookbackWindow::ALL
            .iter()
            .filter_map(|w| w.offset())
            .max()
            .unwrap_or_else(Duration::zero)
            * 2
    }

    /// Offset from now, `None` for `SinceOpen`
    pub fn offset(&self) -> Option<Duration> {
        match self {
            LookbackWindow::M5 => Some(Duration::minutes(5)),
            LookbackWindow::M10 => Some(Duration::minutes(10)),
            LookbackWindow::M15 => Some(Duration::minutes(15)),
            LookbackWindow::M30 => Some(Duration::minutes(30)),
            LookbackWindow::M45 => Some(Duration::minutes(45)),
            LookbackWindow::H1 => Some(Duration::hours(1)),
            LookbackWindow::H12 => Some(Duration::hours(12)),
            LookbackWindow::H24 => Some(Duration::hours(24)),
            LookbackWindow::SinceOpen => None,
        }
    }
}

/// One delta per lookback window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowDeltas {
    pub m5: LineDelta,
    pub m10: LineDelta,
    pub m15: LineDelta,
    pub m30: LineDelta,
    pub m45: LineDelta,
    pub h1: LineDelta,
    pub h12: LineDelta,
    pub h24: LineDelta,
    pub since_open: LineDelta,
}

impl WindowDeltas {
    pub fn get(&self, window: LookbackWindow) -> &LineDelta {
        match window {
            LookbackWindow::M5 => &self.m5,
            LookbackWindow::M10 => &self.m10,
            LookbackWindow::M15 => &self.m15,
            LookbackWindow::M30 => &self.m30,
            LookbackWindow::M45 => &self.m45,
            LookbackWindow::H1 => &self.h1,
            LookbackWindow::H12 => &self.h12,
            LookbackWindow::H24 => &self.h24,
            LookbackWindow::SinceOpen => &self.since_open,
        }
    }

    pub fn get_mut(&mut self, window: LookbackWindow) -> &mut LineDelta {
        match window {
            LookbackWindow::M5 => &mut self.m5,
            LookbackWindow::M10 => &mut self.m10,
            LookbackWindow::M15 => &mut self.m15,
            LookbackWindow::M30 => &mut self.m30,
            LookbackWindow::M45 => &mut self.m45,
            LookbackWindow::H1 => &mut self.h1,
            LookbackWindow::H12 => &mut self.h12,
            LookbackWindow::H24 => &mut self.h24,
            LookbackWindow::SinceOpen => &mut self.since_open,
        }
    }
}
