// ── Inbound message router ──
//
// Decodes each text frame and routes it: `all_devices` always goes to
// the store; any other discriminant goes to the handler registered for
// it, or is dropped. Runs on the connection task, one frame at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde_json::Value;

use aquadash_api::protocol::{self, DecodeError, InboundMessage};
use aquadash_api::FrameHandler;

use crate::model::Device;
use crate::store::DeviceStore;

/// Callback for a non-snapshot message type. Receives the whole payload.
pub type MessageHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Applied to the store.
    Snapshot { devices: usize },
    /// Passed to a registered handler.
    Handled { kind: String },
    /// No handler for this discriminant.
    Ignored { kind: String },
}

pub struct MessageRouter {
    store: Arc<DeviceStore>,
    handlers: DashMap<String, MessageHandler>,
    decode_failures: AtomicU64,
}

impl MessageRouter {
    pub fn new(store: Arc<DeviceStore>) -> Self {
        Self {
            store,
            handlers: DashMap::new(),
            decode_failures: AtomicU64::new(0),
        }
    }

    /// Register (or replace) the handler for a message type.
    ///
    /// Snapshots are never dispatched here, so a handler registered for
    /// `all_devices` is never called.
    pub fn register(&self, kind: impl Into<String>, handler: MessageHandler) {
        let kind = kind.into();
        if kind == protocol::ALL_DEVICES {
            tracing::warn!("handlers for all_devices are never invoked");
        }
        self.handlers.insert(kind, handler);
    }

    pub fn unregister(&self, kind: &str) -> bool {
        self.handlers.remove(kind).is_some()
    }

    /// Frames dropped because they failed to decode.
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    /// Decode and route one frame.
    ///
    /// A decode error leaves the store untouched.
    pub fn on_message(&self, raw: &str) -> Result<Routed, DecodeError> {
        let message = match protocol::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                self.decode_failures.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        match message {
            InboundMessage::AllDevices(wire) => {
                let devices: Vec<Device> = wire.into_iter().map(Device::from).collect();
                let count = devices.len();
                self.store.apply_snapshot(devices);
                Ok(Routed::Snapshot { devices: count })
            }
            InboundMessage::Other { kind, payload } => {
                // Clone out so a handler may (re)register without deadlocking.
                let handler = self.handlers.get(&kind).map(|h| Arc::clone(h.value()));
                match handler {
                    Some(handler) => {
                        handler(&payload);
                        Ok(Routed::Handled { kind })
                    }
                    None => {
                        tracing::debug!(kind = %kind, "no handler for message type, ignoring");
                        Ok(Routed::Ignored { kind })
                    }
                }
            }
        }
    }
}

impl FrameHandler for MessageRouter {
    fn on_text(&self, text: &str) {
        if let Err(e) = self.on_message(text) {
            tracing::warn!(
                error = %e,
                failures = self.decode_failures(),
                "dropping undecodable message"
            );
        }
    }
}
