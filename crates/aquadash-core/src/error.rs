// ── Core error types ──
//
// User-facing errors from aquadash-core. Consumers never see tungstenite
// or serde failures directly; the `From<aquadash_api::Error>` impl maps
// transport errors into domain variants.

use thiserror::Error;

use crate::validate::FieldErrors;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to dashboard server: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Not connected to the dashboard server")]
    NotConnected,

    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Invalid device: {0}")]
    Validation(FieldErrors),

    #[error("Malformed server message: {message}")]
    Decode { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<aquadash_api::Error> for CoreError {
    fn from(err: aquadash_api::Error) -> Self {
        match err {
            aquadash_api::Error::NotConnected => CoreError::NotConnected,
            aquadash_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed { reason },
            aquadash_api::Error::TransportClosed { reason } => CoreError::ConnectionFailed {
                reason: format!("connection closed: {reason}"),
            },
            aquadash_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            aquadash_api::Error::Decode(e) => CoreError::Decode {
                message: e.to_string(),
            },
        }
    }
}

impl From<FieldErrors> for CoreError {
    fn from(errors: FieldErrors) -> Self {
        CoreError::Validation(errors)
    }
}
