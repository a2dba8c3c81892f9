//! Push-channel message schemas.
//!
//! Every message on the persistent channel is a JSON envelope
//! `{"event": <name>, "data": <payload>}`. Inbound events cover frames,
//! detections, log lines, counters, statistics, processing status and
//! zone changes; the only outbound message is `join_video`.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::counts::{CountsSnapshot, StatisticsSnapshot};
use crate::event::LogMessage;

/// Processing status as reported by the pipeline.
///
/// Display-only: the dashboard never derives lifecycle transitions from
/// these pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingStatusUpdate {
    /// Stream key of the source being processed
    pub source: String,

    /// Status label (started, processing, completed, stopped, error)
    pub status: String,

    /// Human-readable detail
    pub message: String,
}

/// Inbound server-originated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    /// Annotated video frame
    VideoFrame {
        /// Stream key of the originating source
        source: String,
        /// Base64-encoded JPEG payload
        frame: String,
        /// Monotonic frame counter
        frame_count: u64,
    },

    /// Object detection notification
    Detection {
        timestamp: DateTime<Utc>,
        details: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frame: Option<u64>,
    },

    /// Raw server log line
    LogMessage(LogMessage),

    /// Running counter update
    CountsUpdate(CountsSnapshot),

    /// Full statistics snapshot
    StatisticsUpdate(StatisticsSnapshot),

    /// Processing status change
    ProcessingStatus(ProcessingStatusUpdate),

    /// Processing error
    ProcessingError { source: String, message: String },

    /// Remote zone configuration change
    ZoneUpdated { zone_id: u8, status: String },

    /// Server asked clients to reset their view
    GuiReset { message: String },
}

impl PushEvent {
    /// The event's routing kind.
    pub fn kind(&self) -> PushEventKind {
        match self {
            PushEvent::VideoFrame { .. } => PushEventKind::VideoFrame,
            PushEvent::Detection { .. } => PushEventKind::Detection,
            PushEvent::LogMessage(_) => PushEventKind::LogMessage,
            PushEvent::CountsUpdate(_) => PushEventKind::CountsUpdate,
            PushEvent::StatisticsUpdate(_) => PushEventKind::StatisticsUpdate,
            PushEvent::ProcessingStatus(_) => PushEventKind::ProcessingStatus,
            PushEvent::ProcessingError { .. } => PushEventKind::ProcessingError,
            PushEvent::ZoneUpdated { .. } => PushEventKind::ZoneUpdated,
            PushEvent::GuiReset { .. } => PushEventKind::GuiReset,
        }
    }
}

/// Routing key for push-channel subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PushEventKind {
    VideoFrame,
    Detection,
    LogMessage,
    CountsUpdate,
    StatisticsUpdate,
    ProcessingStatus,
    ProcessingError,
    ZoneUpdated,
    GuiReset,
}

impl PushEventKind {
    /// All inbound event kinds.
    pub const ALL: [PushEventKind; 9] = [
        PushEventKind::VideoFrame,
        PushEventKind::Detection,
        PushEventKind::LogMessage,
        PushEventKind::CountsUpdate,
        PushEventKind::StatisticsUpdate,
        PushEventKind::ProcessingStatus,
        PushEventKind::ProcessingError,
        PushEventKind::ZoneUpdated,
        PushEventKind::GuiReset,
    ];

    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            PushEventKind::VideoFrame => "video_frame",
            PushEventKind::Detection => "detection",
            PushEventKind::LogMessage => "log_message",
            PushEventKind::CountsUpdate => "counts_update",
            PushEventKind::StatisticsUpdate => "statistics_update",
            PushEventKind::ProcessingStatus => "processing_status",
            PushEventKind::ProcessingError => "processing_error",
            PushEventKind::ZoneUpdated => "zone_updated",
            PushEventKind::GuiReset => "gui_reset",
        }
    }
}

/// Outbound client-originated message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to the frame stream of a source
    JoinVideo { source: String },
}

impl ClientMessage {
    /// Create a join_video message.
    pub fn join_video(source: impl Into<String>) -> Self {
        ClientMessage::JoinVideo {
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_event_envelope() {
        let json = r#"{"event":"counts_update","data":{"pending_boxes":2,"boxes_sold":7,"timestamp":"2026-01-05T10:00:00Z"}}"#;
        let event: PushEvent = serde_json::from_str(json).unwrap();
        match event {
            PushEvent::CountsUpdate(counts) => {
                assert_eq!(counts.pending_boxes, 2);
                assert_eq!(counts.boxes_sold, 7);
            }
            other => panic!("Expected CountsUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_video_frame_payload_fields() {
        let json = r#"{"event":"video_frame","data":{"source":"0","frame":"aGVsbG8=","frame_count":5}}"#;
        let event: PushEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), PushEventKind::VideoFrame);
    }

    #[test]
    fn test_detection_without_optional_fields() {
        let json = r#"{"event":"detection","data":{"timestamp":"2026-01-05T10:00:00Z","details":"box opened"}}"#;
        let event: PushEvent = serde_json::from_str(json).unwrap();
        match event {
            PushEvent::Detection { source, frame, .. } => {
                assert!(source.is_none());
                assert!(frame.is_none());
            }
            other => panic!("Expected Detection, got {:?}", other),
        }
    }

    #[test]
    fn test_kind_wire_names_match_serde() {
        for kind in PushEventKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_join_video_serialization() {
        let msg = ClientMessage::join_video("0");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"event\":\"join_video\""));
        assert!(json.contains("\"source\":\"0\""));
    }
}
