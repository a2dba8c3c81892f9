//! Shared data models for the boxmon monitoring core.
//!
//! This crate provides Serde-serializable types for:
//! - Audit event records and raw log lines
//! - Counter and statistics snapshots
//! - Processing lifecycle states
//! - Video source selection and upload progress
//! - Dispatch zone selection and zone info
//! - Push-channel message schemas

pub mod counts;
pub mod event;
pub mod processing;
pub mod push;
pub mod source;
pub mod utils;
pub mod zone;

// Re-export common types
pub use counts::{CountsSnapshot, StatisticsSnapshot};
pub use event::{EventKind, EventRecord, LogMessage};
pub use processing::{ProcessingAction, ProcessingState};
pub use push::{ClientMessage, ProcessingStatusUpdate, PushEvent, PushEventKind};
pub use source::{SourceSelection, UploadProgress, UploadState, UploadedFileMeta};
pub use utils::format_bytes;
pub use zone::{ZoneAlert, ZoneAlertKind, ZoneId, ZoneIdError, ZoneInfo};
