//! Video source selection and upload progress.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::utils::format_bytes;

/// Stream key the server uses for the live webcam source.
pub const WEBCAM_STREAM_KEY: &str = "0";

/// The user's chosen video source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSelection {
    /// No source chosen yet
    #[default]
    None,
    /// Live camera
    Webcam,
    /// A previously uploaded asset
    UploadedFile {
        /// Storage path resolved by the server on upload
        path: String,
        /// Original client-side file name
        original_name: String,
        /// File size in bytes
        size_bytes: u64,
    },
}

impl SourceSelection {
    /// True when processing can be started against this source.
    ///
    /// The webcam is always ready; an uploaded file is ready once the
    /// server has resolved a non-empty storage path.
    pub fn is_ready(&self) -> bool {
        match self {
            SourceSelection::None => false,
            SourceSelection::Webcam => true,
            SourceSelection::UploadedFile { path, .. } => !path.is_empty(),
        }
    }

    /// Server-side stream key for this source, if it is ready.
    pub fn stream_key(&self) -> Option<&str> {
        match self {
            SourceSelection::None => None,
            SourceSelection::Webcam => Some(WEBCAM_STREAM_KEY),
            SourceSelection::UploadedFile { path, .. } => {
                if path.is_empty() {
                    None
                } else {
                    Some(path)
                }
            }
        }
    }
}

/// Upload lifecycle as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    #[default]
    Idle,
    Uploading,
    Done,
    Failed,
}

/// Metadata of the file being uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadedFileMeta {
    /// Original file name
    pub name: String,
    /// File size in bytes
    pub size_bytes: u64,
}

impl UploadedFileMeta {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
        }
    }

    /// Human-readable file size.
    pub fn formatted_size(&self) -> String {
        format_bytes(self.size_bytes)
    }
}

/// Displayable upload progress projection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct UploadProgress {
    /// Current upload lifecycle state
    pub state: UploadState,

    /// Transfer progress, 0..=100, monotonically non-decreasing
    pub percent: u8,

    /// File being uploaded, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<UploadedFileMeta>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webcam_is_ready_immediately() {
        assert!(SourceSelection::Webcam.is_ready());
        assert_eq!(SourceSelection::Webcam.stream_key(), Some("0"));
    }

    #[test]
    fn test_uploaded_file_with_empty_path_is_not_ready() {
        let source = SourceSelection::UploadedFile {
            path: String::new(),
            original_name: "clip.mp4".to_string(),
            size_bytes: 1024,
        };
        assert!(!source.is_ready());
        assert_eq!(source.stream_key(), None);
    }

    #[test]
    fn test_uploaded_file_with_path_is_ready() {
        let source = SourceSelection::UploadedFile {
            path: "uploads/clip.mp4".to_string(),
            original_name: "clip.mp4".to_string(),
            size_bytes: 1024,
        };
        assert!(source.is_ready());
        assert_eq!(source.stream_key(), Some("uploads/clip.mp4"));
    }

    #[test]
    fn test_no_source_is_not_ready() {
        assert!(!SourceSelection::None.is_ready());
        assert_eq!(SourceSelection::None.stream_key(), None);
    }

    #[test]
    fn test_file_meta_formatted_size() {
        let meta = UploadedFileMeta::new("clip.mp4", 5 * 1024 * 1024);
        assert_eq!(meta.formatted_size(), "5.00 MB");
    }
}
