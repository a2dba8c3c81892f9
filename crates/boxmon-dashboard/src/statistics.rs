//! Statistics aggregation.

use chrono::{DateTime, Utc};

use boxmon_models::StatisticsSnapshot;

/// Holds the latest statistics snapshot.
///
/// Two write paths feed it — the on-demand pull and the streamed push —
/// and both replace the held value wholesale. The last writer wins by
/// wall-clock arrival order; there are no sequence numbers, so a slow
/// pull that resolves after a newer push overwrites it.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    snapshot: StatisticsSnapshot,
    last_update: Option<DateTime<Utc>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held snapshot and stamp the update time.
    pub fn replace(&mut self, snapshot: StatisticsSnapshot) {
        self.snapshot = snapshot;
        self.last_update = Some(Utc::now());
    }

    /// The currently held snapshot.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        self.snapshot
    }

    /// When the held snapshot last changed, if ever.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}
