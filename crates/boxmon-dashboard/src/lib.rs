//! Stateful dashboard core.
//!
//! Reconciles the push channel and the request/response API into one
//! consistent view of the pipeline: a bounded audit log, running
//! counters, the latest annotated frame, the upload state machine, the
//! processing lifecycle gate, and the zone selection — all owned by the
//! [`dashboard::Dashboard`] composer and mutated only through its named
//! transition functions.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod event_log;
pub mod lifecycle;
pub mod renderer;
pub mod source;
pub mod statistics;
pub mod zones;

pub use config::MonitorConfig;
pub use dashboard::Dashboard;
pub use error::{DashboardError, DashboardResult};
pub use event_log::{BoundedLog, EVENT_LOG_CAPACITY, RAW_LOG_CAPACITY};
pub use lifecycle::ProcessingGate;
pub use renderer::{DecodedFrame, FramePainter, FramePayload, FrameRenderer, LatestFrameSlot};
pub use source::{validate_upload, SourceKind, UploadManager, UploadRejection, UploadRequest};
pub use statistics::StatsAggregator;
pub use zones::ZoneSelector;
