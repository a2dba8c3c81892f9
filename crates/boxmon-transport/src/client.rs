//! Channel client: one logical connection, transparent reconnect.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use boxmon_models::{ClientMessage, PushEvent, PushEventKind};

use crate::error::{TransportError, TransportResult};
use crate::router::{EventRouter, Subscription};

/// Outbound messages buffered before emits are dropped.
const EMIT_BUFFER_SIZE: usize = 32;

/// Connection state of the underlying channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    Connected,
    #[default]
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Reconnect backoff configuration.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between attempts.
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.min(16);
        let delay = self.base_delay.saturating_mul(1u32 << shift);
        delay.min(self.max_delay)
    }
}

/// Client side of the persistent push channel.
///
/// Guarantees at most one active underlying connection. Reconnection is
/// transparent to subscribers: the router and every [`Subscription`]
/// survive, and handlers are never re-registered. The client itself does
/// not write audit records for connect/disconnect transitions — consumers
/// observe them through [`ChannelClient::connection_state`].
pub struct ChannelClient {
    router: Arc<EventRouter>,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    out_tx: mpsc::Sender<ClientMessage>,
    out_rx: Mutex<Option<mpsc::Receiver<ClientMessage>>>,
    reconnect: ReconnectConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChannelClient {
    /// Create a disconnected client with the default backoff.
    pub fn new() -> Self {
        Self::with_reconnect(ReconnectConfig::default())
    }

    /// Create a disconnected client with an explicit backoff.
    pub fn with_reconnect(reconnect: ReconnectConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (out_tx, out_rx) = mpsc::channel(EMIT_BUFFER_SIZE);
        Self {
            router: Arc::new(EventRouter::new()),
            state_tx,
            state_rx,
            out_tx,
            out_rx: Mutex::new(Some(out_rx)),
            reconnect,
            task: Mutex::new(None),
        }
    }

    /// The subscription registry backing this client.
    pub fn router(&self) -> Arc<EventRouter> {
        Arc::clone(&self.router)
    }

    /// Subscribe to one event kind.
    pub fn subscribe(&self, kind: PushEventKind) -> Subscription {
        self.router.subscribe(kind)
    }

    /// Subscribe to every inbound event.
    pub fn subscribe_all(&self) -> Subscription {
        self.router.subscribe_all()
    }

    /// Watch connection transitions.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Current connection state.
    pub fn is_connected(&self) -> bool {
        self.state_rx.borrow().is_connected()
    }

    /// Send a message to the server, best-effort.
    ///
    /// While disconnected, or when the send buffer is full, the message is
    /// dropped with a warning rather than blocking the caller.
    pub fn emit(&self, message: ClientMessage) -> TransportResult<()> {
        if !self.is_connected() {
            warn!("emit dropped: channel disconnected");
            return Ok(());
        }
        match self.out_tx.try_send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("emit dropped: send buffer full");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(TransportError::Closed),
        }
    }

    /// Start the connection task.
    ///
    /// Spawns the read/write loop; reconnects with capped exponential
    /// backoff until [`ChannelClient::shutdown`] is called. Errors if a
    /// connection task is already running.
    pub fn connect(&self, url: &str) -> TransportResult<()> {
        let parsed = Url::parse(url)?;
        match parsed.scheme() {
            "ws" | "wss" => {}
            other => return Err(TransportError::UnsupportedScheme(other.to_string())),
        }

        let mut task = self.task.lock().expect("task lock poisoned");
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return Err(TransportError::AlreadyConnected);
        }

        let out_rx = self
            .out_rx
            .lock()
            .expect("out_rx lock poisoned")
            .take()
            .ok_or(TransportError::AlreadyConnected)?;

        let router = Arc::clone(&self.router);
        let state_tx = self.state_tx.clone();
        let reconnect = self.reconnect.clone();
        let url = parsed.to_string();

        *task = Some(tokio::spawn(run_loop(
            url, router, state_tx, out_rx, reconnect,
        )));
        Ok(())
    }

    /// Stop the connection task and mark the channel disconnected.
    pub fn shutdown(&self) {
        if let Some(task) = self.task.lock().expect("task lock poisoned").take() {
            task.abort();
        }
        let _ = self.state_tx.send(ConnectionState::Disconnected);
    }
}

impl Default for ChannelClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChannelClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Connect, pump, reconnect.
async fn run_loop(
    url: String,
    router: Arc<EventRouter>,
    state_tx: watch::Sender<ConnectionState>,
    mut out_rx: mpsc::Receiver<ClientMessage>,
    reconnect: ReconnectConfig,
) {
    let mut attempt = 0u32;
    loop {
        match connect_async(url.as_str()).await {
            Ok((stream, _response)) => {
                attempt = 0;
                let _ = state_tx.send(ConnectionState::Connected);
                info!(%url, "push channel connected");

                let (mut write, mut read) = stream.split();
                loop {
                    tokio::select! {
                        incoming = read.next() => match incoming {
                            Some(Ok(Message::Text(text))) => dispatch(&router, &text),
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!("push channel read error: {}", e);
                                break;
                            }
                        },
                        outgoing = out_rx.recv() => match outgoing {
                            Some(message) => {
                                let text = match serde_json::to_string(&message) {
                                    Ok(t) => t,
                                    Err(e) => {
                                        warn!("failed to encode outbound message: {}", e);
                                        continue;
                                    }
                                };
                                if let Err(e) = write.send(Message::Text(text)).await {
                                    warn!("push channel write error: {}", e);
                                    break;
                                }
                            }
                            // All senders gone: the client was dropped.
                            None => return,
                        },
                    }
                }

                let _ = state_tx.send(ConnectionState::Disconnected);
                warn!("push channel disconnected");
            }
            Err(e) => {
                debug!(%url, "push channel connect failed: {}", e);
            }
        }

        let delay = reconnect.delay_for_attempt(attempt);
        attempt = attempt.saturating_add(1);
        tokio::time::sleep(delay).await;
    }
}

/// Decode one wire message and hand it to the router.
fn dispatch(router: &EventRouter, text: &str) {
    match serde_json::from_str::<PushEvent>(text) {
        Ok(event) => {
            router.publish(event);
        }
        Err(e) => {
            debug!("ignoring unrecognized push message: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_delay_caps_at_max() {
        let config = ReconnectConfig {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(30));
        assert_eq!(config.delay_for_attempt(u32::MAX), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_emit_while_disconnected_is_dropped() {
        let client = ChannelClient::new();
        assert!(!client.is_connected());
        assert!(client.emit(ClientMessage::join_video("0")).is_ok());
    }

    #[tokio::test]
    async fn test_connect_rejects_non_websocket_url() {
        let client = ChannelClient::new();
        let err = client.connect("http://localhost:5000").unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedScheme(_)));
    }

    #[tokio::test]
    async fn test_second_connect_is_rejected() {
        let client = ChannelClient::new();
        client.connect("ws://127.0.0.1:1/ws").unwrap();
        let err = client.connect("ws://127.0.0.1:1/ws").unwrap_err();
        assert!(matches!(err, TransportError::AlreadyConnected));
        client.shutdown();
    }

    #[tokio::test]
    async fn test_subscriptions_survive_without_connection() {
        // The router outlives any connection: publishing works even while
        // the channel has never been connected.
        let client = ChannelClient::new();
        let mut sub = client.subscribe(PushEventKind::GuiReset);
        client.router().publish(PushEvent::GuiReset {
            message: "view reset".to_string(),
        });
        assert!(matches!(
            sub.recv().await.unwrap(),
            PushEvent::GuiReset { .. }
        ));
    }
}
