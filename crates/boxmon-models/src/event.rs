//! Audit event records for the bounded dashboard log.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Category of an audit event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Object detection reported by the pipeline
    Detection,
    /// Raw server log line
    Log,
    /// Counter update
    Counts,
    /// Processing status change
    Processing,
    /// Pipeline error
    Error,
    /// Dispatch zone change
    Zone,
    /// Connectivity and other client-side events
    System,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Detection => "detection",
            EventKind::Log => "log",
            EventKind::Counts => "counts",
            EventKind::Processing => "processing",
            EventKind::Error => "error",
            EventKind::Zone => "zone",
            EventKind::System => "system",
        }
    }
}

/// A single entry in the bounded audit log.
///
/// Records are immutable once appended; the log evicts oldest-first when
/// full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventRecord {
    /// Arrival time, stamped by the consumer
    pub timestamp: DateTime<Utc>,

    /// Event category
    pub kind: EventKind,

    /// Human-readable details
    pub details: String,

    /// Originating video source, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Frame number the event refers to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<u64>,
}

impl EventRecord {
    /// Create a record stamped with the current wall-clock time.
    pub fn new(kind: EventKind, details: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            details: details.into(),
            source: None,
            frame: None,
        }
    }

    /// Attach the originating source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach an optional originating source.
    pub fn with_source_opt(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    /// Attach the frame number.
    pub fn with_frame(mut self, frame: u64) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Attach an optional frame number.
    pub fn with_frame_opt(mut self, frame: Option<u64>) -> Self {
        self.frame = frame;
        self
    }

    /// Create a system-kind record (connectivity, resets).
    pub fn system(details: impl Into<String>) -> Self {
        Self::new(EventKind::System, details)
    }
}

/// A raw server log line, kept in its own narrower bounded buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogMessage {
    /// Log line text
    pub message: String,

    /// Server-side timestamp
    pub timestamp: DateTime<Utc>,
}

impl LogMessage {
    /// Create a log message stamped with the current wall-clock time.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
