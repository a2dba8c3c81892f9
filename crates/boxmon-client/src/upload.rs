//! Progress-tracked video upload.
//!
//! The file is streamed as a multipart request in fixed-size chunks; a
//! `watch` channel carries the transfer percentage. The reported percent
//! is monotonically non-decreasing and only reaches 100 once the server
//! has confirmed the upload.

use std::path::Path;

use futures_util::{stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::sync::watch;
use tracing::debug;

use crate::error::ClientResult;
use crate::{check_status, ApiClient};

/// Upload size ceiling (2 GiB), enforced by the server and checked
/// client-side before any network call.
pub const MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Bytes read from disk per chunk.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Server response to a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedVideo {
    /// Storage path the server resolved for the asset
    #[serde(rename = "videoPath")]
    pub video_path: String,

    /// Stored file name
    pub filename: String,

    /// Stored size in bytes
    #[serde(rename = "size")]
    pub size_bytes: u64,
}

/// Monotonic percent reporter for an in-flight transfer.
///
/// Out-of-order or repeated progress reports are clamped: the published
/// percent never regresses. The transfer itself tops out at 99; the final
/// 100 is published only after the server confirms.
pub(crate) struct ProgressTracker {
    total: u64,
    sent: u64,
    last_percent: u8,
    tx: watch::Sender<u8>,
}

impl ProgressTracker {
    pub(crate) fn new(total: u64, tx: watch::Sender<u8>) -> Self {
        Self {
            total,
            sent: 0,
            last_percent: 0,
            tx,
        }
    }

    /// Account for `n` more bytes on the wire.
    pub(crate) fn advance(&mut self, n: u64) {
        self.sent = self.sent.saturating_add(n);
        let percent = if self.total == 0 {
            99
        } else {
            ((self.sent.min(self.total) * 100) / self.total).min(99) as u8
        };
        self.record_percent(percent);
    }

    /// Publish a percent value, ignoring anything that would regress.
    pub(crate) fn record_percent(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent > self.last_percent {
            self.last_percent = percent;
            let _ = self.tx.send(percent);
        }
    }
}

impl ApiClient {
    /// Upload a video file, streaming progress into `progress`.
    ///
    /// The caller is responsible for validating MIME type and size before
    /// calling (rejections must happen without a network round trip).
    pub async fn upload_video(
        &self,
        path: &Path,
        original_name: &str,
        content_type: &str,
        progress: watch::Sender<u8>,
    ) -> ClientResult<UploadedVideo> {
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();
        let confirm_tx = progress.clone();
        let mut tracker = ProgressTracker::new(total, progress);

        let chunks = stream::unfold(Some(file), move |state| async move {
            let mut file = state?;
            let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
            match file.read(&mut buf).await {
                Ok(0) => None,
                Ok(n) => {
                    buf.truncate(n);
                    Some((Ok::<_, std::io::Error>(buf), Some(file)))
                }
                Err(e) => Some((Err(e), None)),
            }
        });

        // Count the bytes as they are handed to the transport.
        let counted = chunks.inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                tracker.advance(bytes.len() as u64);
            }
        });

        let part = Part::stream_with_length(Body::wrap_stream(counted), total)
            .file_name(original_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("video", part);

        let url = self.endpoint("/api/upload-video")?;
        let response = check_status(self.http().post(url).multipart(form).send().await?).await?;
        let uploaded: UploadedVideo = response.json().await?;
        let _ = confirm_tx.send(100);

        debug!(
            path = %uploaded.video_path,
            size = uploaded.size_bytes,
            "video upload confirmed"
        );
        Ok(uploaded)
    }
}
