//! App-stream WebSocket monitor with periodic keepalive.
//!
//! Connects to a pnut.io app-stream endpoint and forwards decoded JSON
//! frames through a [`tokio::sync::broadcast`] channel. A text
//! keepalive frame goes out every 30 seconds while the connection is
//! open so idle connections are not reaped. There is no automatic
//! reconnect: when the connection ends, a [`MonitorEvent::Closed`] is
//! broadcast and the background task exits.
//!
//! # Example
//!
//! ```rust,ignore
//! use pnut_api::websocket::{MonitorEvent, MonitorHandle};
//! use url::Url;
//!
//! let url = Url::parse("wss://stream.pnut.io/v0/app?access_token=...")?;
//! let handle = MonitorHandle::connect(url).await?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     if let Some(notification) = event.notification() {
//!         println!("{}", notification.message);
//!     }
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::notification::Notification;

// ── Channel and keepalive tuning ─────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Interval between keepalive frames. The first one goes out as soon
/// as the connection is up.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Application-level keepalive payload. Any traffic keeps the stream
/// alive; the server ignores the content.
const KEEPALIVE_FRAME: &str = "ping";

// ── MonitorEvent ─────────────────────────────────────────────────────

/// Lifecycle and payload events from the app-stream connection.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// The connection is established and the read loop is running.
    Open,
    /// A frame arrived and decoded as JSON.
    Message(Value),
    /// A frame arrived but was not valid JSON. Non-fatal: the
    /// connection stays up and later frames are still delivered.
    InvalidFrame { error: String },
    /// The connection ended — server close frame, transport error, end
    /// of stream, or local shutdown. `code` and `reason` carry
    /// whatever the transport reported.
    Closed {
        code: Option<u16>,
        reason: Option<String>,
    },
}

impl MonitorEvent {
    /// The notification carried by this event, if it is a message
    /// frame that normalizes to one.
    pub fn notification(&self) -> Option<Notification> {
        if let Self::Message(payload) = self {
            Notification::from_value(payload)
        } else {
            None
        }
    }
}

// ── MonitorHandle ────────────────────────────────────────────────────

/// Handle to a running app-stream monitor.
pub struct MonitorHandle {
    /// Receiver created before the read loop starts, holding the
    /// channel position that observes every event from
    /// [`MonitorEvent::Open`] onward. Claimed by the first `subscribe`.
    initial_rx: Mutex<Option<broadcast::Receiver<Arc<MonitorEvent>>>>,
    /// Tail-positioned template for later `subscribe` calls.
    event_rx: broadcast::Receiver<Arc<MonitorEvent>>,
    cancel: CancellationToken,
}

impl MonitorHandle {
    /// Connect to an app-stream endpoint and spawn the read loop.
    ///
    /// The WebSocket handshake completes before this returns, so a
    /// refused or failed upgrade surfaces here as
    /// [`Error::WebSocketConnect`] rather than through the event
    /// channel.
    pub async fn connect(url: Url) -> Result<Self, Error> {
        tracing::info!(url = %url, "connecting to app stream");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        tracing::info!("app stream connected");

        let (event_tx, initial_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let event_rx = event_tx.subscribe();
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            read_loop(ws_stream, event_tx, task_cancel).await;
        });

        Ok(Self {
            initial_rx: Mutex::new(Some(initial_rx)),
            event_rx,
            cancel,
        })
    }

    /// Get a broadcast receiver for the event stream.
    ///
    /// The first call returns the receiver created before the read
    /// loop started, so the first consumer observes every event from
    /// [`MonitorEvent::Open`] onward no matter how late it subscribes.
    /// Later calls subscribe at the current tail and only observe
    /// events sent afterwards. Multiple consumers can subscribe
    /// concurrently; a consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<MonitorEvent>> {
        let mut initial = self.initial_rx.lock().expect("receiver lock poisoned");
        if let Some(rx) = initial.take() {
            return rx;
        }
        self.event_rx.resubscribe()
    }

    /// Tear the connection down and stop the keepalive timer.
    ///
    /// Idempotent; a final [`MonitorEvent::Closed`] is broadcast once
    /// the background task winds down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Connection read loop ─────────────────────────────────────────────

/// Read frames and tick the keepalive until the connection ends.
async fn read_loop<S>(
    ws_stream: WebSocketStream<S>,
    event_tx: broadcast::Sender<Arc<MonitorEvent>>,
    cancel: CancellationToken,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut write, mut read) = ws_stream.split();
    let mut keepalive = tokio::time::interval(KEEPALIVE_INTERVAL);

    let _ = event_tx.send(Arc::new(MonitorEvent::Open));

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = write.send(tungstenite::Message::Close(None)).await;
                tracing::info!("app stream shut down");
                let _ = event_tx.send(Arc::new(MonitorEvent::Closed { code: None, reason: None }));
                return;
            }
            _ = keepalive.tick() => {
                // A failed send means the connection is already on its
                // way down; the read side will report why.
                if write.send(tungstenite::Message::text(KEEPALIVE_FRAME)).await.is_err() {
                    tracing::debug!("keepalive send failed, connection closing");
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        broadcast_frame(&text, &event_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("app stream ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        let _ = event_tx.send(Arc::new(close_event(frame)));
                        return;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "app stream transport error");
                        let _ = event_tx.send(Arc::new(MonitorEvent::Closed {
                            code: None,
                            reason: Some(e.to_string()),
                        }));
                        return;
                    }
                    None => {
                        // Stream ended without a close frame
                        tracing::info!("app stream ended");
                        let _ = event_tx.send(Arc::new(MonitorEvent::Closed { code: None, reason: None }));
                        return;
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

// ── Client surface ───────────────────────────────────────────────────

impl crate::client::Client {
    /// Connect an app-stream monitor for `url`.
    ///
    /// Equivalent to [`MonitorHandle::connect`]; the monitor shares no
    /// state with the HTTP side, so the app-stream URL (including any
    /// `access_token` query parameter) is taken as given.
    #[allow(clippy::unused_self)]
    pub async fn monitor_web_socket(&self, url: Url) -> Result<MonitorHandle, Error> {
        MonitorHandle::connect(url).await
    }
}

// ── Frame handling ───────────────────────────────────────────────────

/// Decode a text frame and broadcast the event it produces.
fn broadcast_frame(text: &str, event_tx: &broadcast::Sender<Arc<MonitorEvent>>) {
    let event = match serde_json::from_str::<Value>(text) {
        Ok(payload) => MonitorEvent::Message(payload),
        Err(e) => {
            tracing::debug!(error = %e, "app-stream frame is not valid JSON");
            MonitorEvent::InvalidFrame {
                error: e.to_string(),
            }
        }
    };

    // Ignore send errors -- just means no active subscribers right now
    let _ = event_tx.send(Arc::new(event));
}

/// Map a server close frame to the closed event.
fn close_event(frame: Option<tungstenite::protocol::CloseFrame>) -> MonitorEvent {
    match frame {
        Some(cf) => {
            tracing::info!(code = %cf.code, reason = %cf.reason, "app stream close frame received");
            MonitorEvent::Closed {
                code: Some(cf.code.into()),
                reason: (!cf.reason.is_empty()).then(|| cf.reason.to_string()),
            }
        }
        None => {
            tracing::info!("app stream close frame received (no payload)");
            MonitorEvent::Closed {
                code: None,
                reason: None,
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
