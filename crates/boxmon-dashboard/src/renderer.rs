//! Frame rendering with last-write-wins semantics.
//!
//! The renderer never queues more than one pending frame: a payload
//! arriving while a decode is in flight simply replaces whatever was
//! waiting. Dropped frames are not reported or retried — an overloaded
//! consumer sheds load instead of falling behind.

use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;

/// Raw frame payload as received from the push channel.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePayload {
    /// Stream key of the originating source
    pub source: String,
    /// Base64-encoded JPEG bytes
    pub frame_b64: String,
    /// Monotonic frame counter
    pub frame_count: u64,
}

/// A decoded frame ready to paint.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub bytes: Vec<u8>,
    pub source: String,
    pub frame_count: u64,
}

/// The external paint boundary. The actual pixel codec and surface live
/// behind this trait.
#[cfg_attr(test, mockall::automock)]
pub trait FramePainter: Send {
    fn paint(&mut self, frame: &DecodedFrame);
}

/// Single-slot mailbox holding the most recent frame payload.
#[derive(Debug, Default)]
pub struct LatestFrameSlot {
    slot: Mutex<Option<FramePayload>>,
    notify: Notify,
}

impl LatestFrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload as the latest, replacing any pending one.
    pub fn offer(&self, payload: FramePayload) {
        *self.slot.lock().expect("frame slot poisoned") = Some(payload);
        self.notify.notify_one();
    }

    /// Take the pending payload, leaving the slot empty.
    pub fn take(&self) -> Option<FramePayload> {
        self.slot.lock().expect("frame slot poisoned").take()
    }

    /// Wait until a payload has been offered.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Decode-and-paint task over a [`LatestFrameSlot`].
pub struct FrameRenderer;

impl FrameRenderer {
    /// Spawn the render loop. Each cycle drains the slot, decodes the
    /// then-latest payload, and paints it; decode failures are swallowed
    /// and the last successfully painted frame stays on screen.
    pub fn spawn(slot: Arc<LatestFrameSlot>, mut painter: Box<dyn FramePainter>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                slot.wait().await;
                render_pending(&slot, painter.as_mut());
            }
        })
    }
}

/// Drain and paint everything currently pending. Split out of the task
/// loop so the cycle is testable without timing.
pub(crate) fn render_pending(slot: &LatestFrameSlot, painter: &mut dyn FramePainter) {
    while let Some(payload) = slot.take() {
        match decode(&payload) {
            Ok(frame) => painter.paint(&frame),
            Err(e) => {
                // Malformed payload: keep showing the last good frame.
                debug!(frame = payload.frame_count, "frame decode failed: {}", e);
            }
        }
    }
}

fn decode(payload: &FramePayload) -> Result<DecodedFrame, base64::DecodeError> {
    let bytes = BASE64.decode(&payload.frame_b64)?;
    Ok(DecodedFrame {
        bytes,
        source: payload.source.clone(),
        frame_count: payload.frame_count,
    })
}
