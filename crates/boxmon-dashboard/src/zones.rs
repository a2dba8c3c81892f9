//! Optimistic zone selection with a stale-response guard.

use boxmon_models::{ZoneId, ZoneInfo};

/// Local zone selection plus the remote-fetched info it keys.
///
/// Selection updates optimistically, ahead of remote confirmation. Every
/// change bumps an epoch; an info fetch resolves against the epoch and
/// zone it was issued for, and is discarded if either no longer matches.
#[derive(Debug, Default)]
pub struct ZoneSelector {
    selection: Option<ZoneId>,
    info: Option<ZoneInfo>,
    epoch: u64,
}

impl ZoneSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<ZoneId> {
        self.selection
    }

    pub fn info(&self) -> Option<&ZoneInfo> {
        self.info.as_ref()
    }

    /// Optimistically select a zone, invalidating any held info.
    /// Returns the epoch an info fetch for this selection must carry.
    pub fn select(&mut self, zone: ZoneId) -> u64 {
        self.selection = Some(zone);
        self.info = None;
        self.epoch += 1;
        self.epoch
    }

    /// Drop the selection and its info.
    pub fn clear(&mut self) {
        self.selection = None;
        self.info = None;
        self.epoch += 1;
    }

    /// Apply a resolved info fetch. `info` is `None` when the fetch
    /// failed, which still clears any stale value. Returns false when the
    /// result is stale and was discarded.
    pub fn apply_info(&mut self, epoch: u64, zone: ZoneId, info: Option<ZoneInfo>) -> bool {
        if epoch != self.epoch || self.selection != Some(zone) {
            return false;
        }
        self.info = info;
        true
    }
}
