//! Counter and statistics snapshots.
//!
//! Both snapshot types are always replaced wholesale — a later snapshot
//! entirely supersedes an earlier one regardless of whether it arrived via
//! push or pull.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Running box counters streamed over the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CountsSnapshot {
    /// Boxes detected but not yet dispatched
    pub pending_boxes: u64,

    /// Boxes dispatched and sold
    pub boxes_sold: u64,

    /// Server-side timestamp of the snapshot
    pub timestamp: DateTime<Utc>,
}

impl CountsSnapshot {
    /// One-line summary used for the audit log entry.
    pub fn summary(&self) -> String {
        format!("Pending: {}, Sold: {}", self.pending_boxes, self.boxes_sold)
    }
}

/// Full statistics snapshot, fetched on demand or streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct StatisticsSnapshot {
    /// All detections since the pipeline started
    #[serde(default)]
    pub total_detections: u64,

    /// Detections in the current session
    #[serde(default)]
    pub current_session: u64,

    /// Boxes dispatched and sold
    #[serde(default)]
    pub boxes_sold: u64,

    /// Boxes awaiting dispatch
    #[serde(default)]
    pub pending_boxes: u64,

    /// Open boxes currently inside the active zone
    #[serde(default)]
    pub open_boxes_in_zone: u64,

    /// Closed boxes currently inside the active zone
    #[serde(default)]
    pub closed_boxes_in_zone: u64,
}

impl StatisticsSnapshot {
    /// Boxes currently inside the active zone, open or closed.
    pub fn boxes_in_zone(&self) -> u64 {
        self.open_boxes_in_zone + self.closed_boxes_in_zone
    }
}
