//! Persistent WebSocket connection with fixed-delay reconnect.
//!
//! A [`Connection`] owns exactly one socket at a time and walks the state
//! machine `Connecting → Open → Closed → Connecting → …` forever (until
//! cancelled). Inbound text frames are handed to a [`FrameHandler`] inside
//! the connection task, so they are processed strictly in arrival order.
//! Outbound frames go through [`Connection::send`], which never blocks: it
//! either enqueues onto the open socket or fails with
//! [`Error::NotConnected`]. There is no outbound queue across reconnects.
//!
//! # Example
//!
//! ```rust,ignore
//! use aquadash_api::{Connection, ConnectionOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let url = aquadash_api::websocket::session_url(&endpoint, "abc123");
//! let conn = Connection::new(url, ConnectionOptions::default());
//! let task = conn.spawn(handler, CancellationToken::new());
//! conn.send(&msg)?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::protocol::OutboundMessage;

/// Query parameter carrying the externally issued session token.
pub const SESSION_QUERY_PARAM: &str = "session_id";

// ── ConnectionState ──────────────────────────────────────────────────

/// Lifecycle state of the single persistent connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ConnectionState {
    /// Handshake in progress (initial state).
    Connecting,
    /// Ready to send.
    Open,
    /// Dropped; a reconnect is scheduled after the fixed delay.
    Closed,
}

// ── ConnectionOptions ────────────────────────────────────────────────

/// Transport tuning.
///
/// Reconnect is a single fixed delay with no backoff and no retry cap.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Wait between a close and the next connect attempt. Default: 3s.
    pub reconnect_delay: Duration,

    /// Upper bound on a single handshake. Default: 10s.
    pub connect_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(3000),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

// ── Seams ────────────────────────────────────────────────────────────

/// Receives every inbound text frame, in order, on the connection task.
///
/// Implementations must not block: the next frame is not read until
/// `on_text` returns.
pub trait FrameHandler: Send + Sync + 'static {
    fn on_text(&self, text: &str);
}

/// Anything that can accept an outbound protocol message.
///
/// [`Connection`] is the production implementation; tests substitute a
/// recorder.
pub trait Outbox: Send + Sync {
    fn send(&self, message: &OutboundMessage) -> Result<(), Error>;
}

// ── Connection ───────────────────────────────────────────────────────

/// Handle to the single persistent connection.
///
/// Cheaply cloneable; all clones observe and drive the same socket.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Shared>,
}

struct Shared {
    url: Url,
    options: ConnectionOptions,
    state: watch::Sender<ConnectionState>,
    /// Present only while a socket is open.
    outbound: ArcSwapOption<mpsc::UnboundedSender<String>>,
    attempts: AtomicU64,
}

impl Connection {
    /// Create the connection handle in the `Connecting` state.
    ///
    /// No I/O happens until [`spawn`](Self::spawn).
    pub fn new(url: Url, options: ConnectionOptions) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        Self {
            inner: Arc::new(Shared {
                url,
                options,
                state,
                outbound: ArcSwapOption::empty(),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    /// Spawn the connect/read/reconnect loop on the current runtime.
    pub fn spawn(&self, handler: Arc<dyn FrameHandler>, cancel: CancellationToken) -> JoinHandle<()> {
        let shared = Arc::clone(&self.inner);
        tokio::spawn(async move {
            connection_loop(shared, handler, cancel).await;
        })
    }

    /// The endpoint this connection dials, including the session parameter.
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Number of handshakes attempted so far (successful or not).
    pub fn connect_attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::Relaxed)
    }

    /// Send a raw text frame.
    ///
    /// Succeeds only in `Open`. Frames accepted here reach the transport in
    /// call order.
    pub fn send_text(&self, text: String) -> Result<(), Error> {
        if self.state() != ConnectionState::Open {
            return Err(Error::NotConnected);
        }
        let guard = self.inner.outbound.load();
        let Some(tx) = &*guard else {
            return Err(Error::NotConnected);
        };
        tx.send(text).map_err(|_| Error::NotConnected)
    }
}

impl Outbox for Connection {
    fn send(&self, message: &OutboundMessage) -> Result<(), Error> {
        self.send_text(message.encode())
    }
}

impl Shared {
    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            tracing::debug!(from = %prev, to = %next, "connection state changed");
        }
    }

    /// Drop the outbound channel, then mark the connection closed.
    fn close(&self) {
        self.outbound.store(None);
        self.set_state(ConnectionState::Closed);
    }
}

/// Append (or replace) the `session_id` query parameter on an endpoint.
///
/// Other query parameters are kept in their original order.
pub fn session_url(endpoint: &Url, session_id: &str) -> Url {
    let mut url = endpoint.clone();
    let retained: Vec<(String, String)> = endpoint
        .query_pairs()
        .filter(|(key, _)| key != SESSION_QUERY_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(SESSION_QUERY_PARAM, session_id);
    url
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → serve → on close, wait the fixed delay → reconnect.
async fn connection_loop(shared: Arc<Shared>, handler: Arc<dyn FrameHandler>, cancel: CancellationToken) {
    let delay = shared.options.reconnect_delay;

    loop {
        shared.set_state(ConnectionState::Connecting);

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_serve(&shared, handler.as_ref(), &cancel) => result,
        };

        shared.close();

        match result {
            Ok(()) => tracing::info!("connection closed"),
            Err(e) => tracing::warn!(error = %e, "connection lost"),
        }

        if cancel.is_cancelled() {
            break;
        }

        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    shared.close();
    tracing::debug!("connection loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one socket and pump frames until it drops.
///
/// `Ok(())` means a clean end (close frame, end of stream, cancellation);
/// `Err` means a handshake or transport failure.
async fn connect_and_serve(
    shared: &Shared,
    handler: &dyn FrameHandler,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    shared.attempts.fetch_add(1, Ordering::Relaxed);
    tracing::info!(url = %redacted(&shared.url), "connecting");

    let handshake = tokio_tungstenite::connect_async(shared.url.as_str());
    let (ws_stream, _response) = tokio::time::timeout(shared.options.connect_timeout, handshake)
        .await
        .map_err(|_| {
            Error::WebSocketConnect(format!(
                "handshake timed out after {}s",
                shared.options.connect_timeout.as_secs()
            ))
        })?
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let (mut write, mut read) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    shared.outbound.store(Some(Arc::new(tx)));
    shared.set_state(ConnectionState::Open);
    tracing::info!("connected");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                return Ok(());
            }
            Some(text) = rx.recv() => {
                write
                    .send(Message::text(text))
                    .await
                    .map_err(|e| Error::TransportClosed { reason: e.to_string() })?;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => handler.on_text(&text),
                    Some(Ok(Message::Ping(_))) => {
                        // tungstenite queues the pong itself
                        tracing::trace!("ping");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "close frame received");
                        } else {
                            tracing::info!("close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::TransportClosed { reason: e.to_string() });
                    }
                    None => {
                        tracing::info!("stream ended");
                        return Ok(());
                    }
                    Some(Ok(_)) => {
                        // Binary, Pong, raw Frame -- not part of the protocol
                    }
                }
            }
        }
    }
}

/// The endpoint with the session token masked, for logs.
fn redacted(url: &Url) -> Url {
    if url.query_pairs().any(|(key, _)| key == SESSION_QUERY_PARAM) {
        session_url(url, "****")
    } else {
        url.clone()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
