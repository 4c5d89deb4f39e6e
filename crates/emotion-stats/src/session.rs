//! Session-scoped statistics and render snapshots

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

use crate::label::EmotionLabel;
use crate::stats::EmotionStats;

/// Statistics owned by one connected session
#[derive(Debug, Clone)]
pub struct SessionStats {
    stats: EmotionStats,
    start_time: DateTime<Local>,
}

impl SessionStats {
    /// Start a session now
    pub fn new() -> Self {
        Self::starting_at(Local::now())
    }

    /// Start a session at a fixed time
    pub fn starting_at(start_time: DateTime<Local>) -> Self {
        Self {
            stats: EmotionStats::new(),
            start_time,
        }
    }

    /// Fold a classifier label into the counters
    pub fn update(&mut self, label: &str) -> Option<EmotionLabel> {
        self.stats.update(label)
    }

    /// Current counters
    pub fn stats(&self) -> &EmotionStats {
        &self.stats
    }

    /// When the session started
    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    /// Frames folded into the counters so far
    pub fn total_frames(&self) -> u64 {
        self.stats.total_frames()
    }

    /// Settled copy of the counters taken now
    pub fn snapshot(&self) -> StatsSnapshot {
        self.snapshot_at(Local::now())
    }

    /// Settled copy of the counters stamped with `taken_at`
    pub fn snapshot_at(&self, taken_at: DateTime<Local>) -> StatsSnapshot {
        StatsSnapshot {
            stats: self.stats.clone(),
            start_time: self.start_time,
            taken_at,
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable view of a session's statistics at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub stats: EmotionStats,
    pub start_time: DateTime<Local>,
    pub taken_at: DateTime<Local>,
}

impl StatsSnapshot {
    /// Time between session start and the snapshot, never negative
    pub fn elapsed(&self) -> Duration {
        (self.taken_at - self.start_time).max(Duration::zero())
    }
}
