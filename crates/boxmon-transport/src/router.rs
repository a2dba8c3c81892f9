//! Subscription registry for push events.
//!
//! The router lives independently of any underlying connection: a
//! [`Subscription`] keeps working across reconnects, and nothing is ever
//! re-registered when the connection drops and comes back.

use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use boxmon_models::{PushEvent, PushEventKind};

/// Events buffered per subscriber before oldest entries are dropped.
///
/// A lagging subscriber loses the oldest events and keeps going; the
/// publisher never blocks.
const SUBSCRIPTION_BUFFER: usize = 256;

/// Fan-out registry mapping event kinds to their subscribers.
pub struct EventRouter {
    firehose: broadcast::Sender<PushEvent>,
    channels: RwLock<HashMap<PushEventKind, broadcast::Sender<PushEvent>>>,
}

impl EventRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        let (firehose, _) = broadcast::channel(SUBSCRIPTION_BUFFER);
        Self {
            firehose,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to one event kind.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes.
    pub fn subscribe(&self, kind: PushEventKind) -> Subscription {
        let mut channels = self.channels.write().expect("router lock poisoned");
        let sender = channels
            .entry(kind)
            .or_insert_with(|| broadcast::channel(SUBSCRIPTION_BUFFER).0);
        Subscription {
            rx: sender.subscribe(),
        }
    }

    /// Subscribe to every inbound event.
    pub fn subscribe_all(&self) -> Subscription {
        Subscription {
            rx: self.firehose.subscribe(),
        }
    }

    /// Deliver an event to all interested subscribers.
    ///
    /// Returns the number of subscribers the event was handed to.
    pub fn publish(&self, event: PushEvent) -> usize {
        let mut delivered = 0;

        let channels = self.channels.read().expect("router lock poisoned");
        if let Some(sender) = channels.get(&event.kind()) {
            delivered += sender.send(event.clone()).unwrap_or(0);
        }
        drop(channels);

        delivered += self.firehose.send(event).unwrap_or(0);

        if delivered == 0 {
            debug!("push event dropped: no subscribers");
        }
        delivered
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to push events.
pub struct Subscription {
    rx: broadcast::Receiver<PushEvent>,
}

impl Subscription {
    /// Receive the next event in arrival order.
    ///
    /// Returns `None` once the router is gone. A lagged subscriber skips
    /// the lost events and resumes from the oldest still buffered.
    pub async fn recv(&mut self) -> Option<PushEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscription lagged, dropping oldest events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take whatever is immediately available without waiting.
    pub fn try_recv(&mut self) -> Option<PushEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscription lagged, dropping oldest events");
                }
                Err(_) => return None,
            }
        }
    }
}
