// ── Runtime engine configuration ──
//
// Describes *where* to connect and how to recover. Carries the session
// token, but never touches disk: the CLI resolves profiles and hands a
// finished `EngineConfig` in.

use std::time::Duration;

use aquadash_api::ConnectionOptions;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::CoreError;

/// Fixed-delay reconnect policy.
///
/// Only the delay is tunable. There is no backoff and no retry cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(3000),
        }
    }
}

/// Configuration for one engine session.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:8000/ws`.
    pub endpoint: Url,
    /// Externally issued session token, appended as `?session_id=`.
    pub session_id: SecretString,
    pub reconnect: ReconnectPolicy,
    /// Upper bound on a single handshake.
    pub connect_timeout: Duration,
}

impl EngineConfig {
    /// Build a config with default reconnect and timeout settings.
    ///
    /// Only `ws` and `wss` endpoints are accepted.
    pub fn new(endpoint: Url, session_id: SecretString) -> Result<Self, CoreError> {
        match endpoint.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(CoreError::Config {
                    message: format!("endpoint must use ws:// or wss://, got {other}://"),
                });
            }
        }

        Ok(Self {
            endpoint,
            session_id,
            reconnect: ReconnectPolicy::default(),
            connect_timeout: Duration::from_secs(10),
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect.delay = delay;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The endpoint with the session token attached.
    pub fn session_url(&self) -> Url {
        aquadash_api::websocket::session_url(&self.endpoint, self.session_id.expose_secret())
    }

    pub(crate) fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            reconnect_delay: self.reconnect.delay,
            connect_timeout: self.connect_timeout,
        }
    }
}
