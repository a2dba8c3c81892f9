//! Source selection kinds and the upload state machine.

use std::path::PathBuf;

use thiserror::Error;

use boxmon_client::MAX_UPLOAD_BYTES;
use boxmon_models::{UploadProgress, UploadState, UploadedFileMeta};

/// Coarse source choice offered by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Live camera
    Webcam,
    /// Uploaded video file
    Upload,
}

/// Synchronous rejection of a picked file, before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Please select a valid video file")]
    NotAVideo,

    #[error("File size exceeds 2GB limit")]
    TooLarge,
}

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Local path to read from
    pub path: PathBuf,
    /// Original client-side file name
    pub original_name: String,
    /// MIME type reported by the picker
    pub content_type: String,
    /// Size reported by the picker, validated before any network call
    pub size_bytes: u64,
}

/// Validate a picked file. Rejections happen synchronously and never
/// reach the network.
pub fn validate_upload(content_type: &str, size_bytes: u64) -> Result<(), UploadRejection> {
    if !content_type.starts_with("video/") {
        return Err(UploadRejection::NotAVideo);
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge);
    }
    Ok(())
}

/// Upload state machine.
///
/// Every accepted file bumps a generation counter; an in-flight transfer
/// whose generation no longer matches has lost the UI's interest and its
/// completion is ignored. The transfer itself is never cancelled.
#[derive(Debug, Default)]
pub struct UploadManager {
    state: UploadState,
    percent: u8,
    file: Option<UploadedFileMeta>,
    error: Option<String>,
    generation: u64,
}

impl UploadManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displayable projection of the current upload.
    pub fn progress(&self) -> UploadProgress {
        UploadProgress {
            state: self.state,
            percent: self.percent,
            file: self.file.clone(),
        }
    }

    /// Reason for the last failure, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start tracking an accepted file. Returns the transfer generation.
    pub fn begin(&mut self, file: UploadedFileMeta) -> u64 {
        self.generation += 1;
        self.state = UploadState::Uploading;
        self.percent = 0;
        self.file = Some(file);
        self.error = None;
        self.generation
    }

    /// Record a synchronous validation rejection.
    pub fn reject(&mut self, file: UploadedFileMeta, rejection: &UploadRejection) {
        self.generation += 1;
        self.state = UploadState::Failed;
        self.percent = 0;
        self.file = Some(file);
        self.error = Some(rejection.to_string());
    }

    /// Update progress for a transfer, if it still holds interest.
    /// The displayed percent never regresses.
    pub fn set_percent(&mut self, generation: u64, percent: u8) -> bool {
        if generation != self.generation || self.state != UploadState::Uploading {
            return false;
        }
        self.percent = self.percent.max(percent.min(100));
        true
    }

    /// Mark a transfer done. Returns false for a detached transfer whose
    /// result must be ignored.
    pub fn complete(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state != UploadState::Uploading {
            return false;
        }
        self.state = UploadState::Done;
        self.percent = 100;
        true
    }

    /// Mark a transfer failed with a surfaced reason. Returns false for a
    /// detached transfer.
    pub fn fail(&mut self, generation: u64, reason: impl Into<String>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.state = UploadState::Failed;
        self.error = Some(reason.into());
        true
    }

    /// Detach from any in-flight transfer and reset the display. The
    /// transfer keeps running; its completion will no longer match.
    pub fn detach(&mut self) {
        self.generation += 1;
        self.state = UploadState::Idle;
        self.percent = 0;
        self.file = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_rejects_non_video() {
        assert_eq!(
            validate_upload("image/png", 1024),
            Err(UploadRejection::NotAVideo)
        );
    }

    #[test]
    fn test_validation_rejects_oversized_file() {
        let three_gib = 3 * 1024 * 1024 * 1024;
        assert_eq!(
            validate_upload("video/mp4", three_gib),
            Err(UploadRejection::TooLarge)
        );
    }

    #[test]
    fn test_validation_accepts_video_at_cap() {
        assert_eq!(validate_upload("video/mp4", MAX_UPLOAD_BYTES), Ok(()));
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut manager = UploadManager::new();
        let generation = manager.begin(UploadedFileMeta::new("clip.mp4", 100));

        assert!(manager.set_percent(generation, 40));
        assert!(manager.set_percent(generation, 25));
        assert_eq!(manager.progress().percent, 40);

        assert!(manager.set_percent(generation, 90));
        assert_eq!(manager.progress().percent, 90);
    }

    #[test]
    fn test_detached_transfer_is_ignored() {
        let mut manager = UploadManager::new();
        let generation = manager.begin(UploadedFileMeta::new("clip.mp4", 100));

        manager.detach();

        assert!(!manager.set_percent(generation, 50));
        assert!(!manager.complete(generation));
        assert!(!manager.fail(generation, "too late"));
        assert_eq!(manager.progress().state, UploadState::Idle);
    }

    #[test]
    fn test_complete_finishes_at_100() {
        let mut manager = UploadManager::new();
        let generation = manager.begin(UploadedFileMeta::new("clip.mp4", 100));
        manager.set_percent(generation, 60);

        assert!(manager.complete(generation));
        let progress = manager.progress();
        assert_eq!(progress.state, UploadState::Done);
        assert_eq!(progress.percent, 100);
    }

    #[test]
    fn test_failure_surfaces_reason() {
        let mut manager = UploadManager::new();
        let generation = manager.begin(UploadedFileMeta::new("clip.mp4", 100));

        assert!(manager.fail(generation, "server rejected the file"));
        assert_eq!(manager.progress().state, UploadState::Failed);
        assert_eq!(manager.error(), Some("server rejected the file"));
    }
}
