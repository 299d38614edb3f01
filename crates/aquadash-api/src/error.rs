use thiserror::Error;

use crate::protocol::DecodeError;

/// Top-level error type for the `aquadash-api` crate.
///
/// Covers transport and codec failures. `aquadash-core` maps these into
/// domain errors; none of them is fatal to a running connection loop.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// WebSocket handshake failed (refused, DNS failure, bad upgrade, timeout).
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// The open connection failed mid-stream (read or write error).
    #[error("Connection closed: {reason}")]
    TransportClosed { reason: String },

    /// A send was attempted while the connection is not `Open`.
    /// The message was dropped; nothing is queued.
    #[error("Not connected -- message dropped")]
    NotConnected,

    /// Endpoint URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// Inbound payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl Error {
    /// Returns `true` if a send was rejected because the connection is not open.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected)
    }
}
