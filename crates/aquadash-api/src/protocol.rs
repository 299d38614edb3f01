//! Message codec for the dashboard WebSocket protocol.
//!
//! Every frame is a JSON object carrying a `type` discriminant. The client
//! sends three command shapes and reacts to one snapshot shape:
//!
//! ```text
//! → {"type":"add_device","device":{"id":..,"name":..,"location":..}}
//! → {"type":"remove_device","device_id":..}
//! → {"type":"command","device_id":..,"command":..,"params":..}
//! ← {"type":"all_devices","data":[{..device..}, ..]}
//! ```
//!
//! Any other inbound `type` decodes to [`InboundMessage::Other`] so callers
//! can route it to a registered handler or drop it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Discriminant of the full-state snapshot broadcast.
pub const ALL_DEVICES: &str = "all_devices";

// ── Outbound ─────────────────────────────────────────────────────────

/// Device fields submitted with an `add_device` command.
///
/// `location` is always present on the wire; an unknown location is `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevice {
    pub id: String,
    pub name: String,
    pub location: String,
}

/// Client → server messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    AddDevice {
        device: NewDevice,
    },
    RemoveDevice {
        device_id: String,
    },
    Command {
        device_id: String,
        command: String,
        params: Value,
    },
}

impl OutboundMessage {
    /// The wire discriminant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddDevice { .. } => "add_device",
            Self::RemoveDevice { .. } => "remove_device",
            Self::Command { .. } => "command",
        }
    }

    /// Serialize to the text frame sent over the socket.
    pub fn encode(&self) -> String {
        // Plain strings and an already-built `Value` have no failing path.
        serde_json::to_string(self).expect("outbound messages always serialize")
    }
}

// ── Inbound ──────────────────────────────────────────────────────────

/// A device as the server broadcasts it.
///
/// Only `id` and `name` are required. Everything else is tolerated as
/// missing, and unknown fields are kept in `extra` so nothing the server
/// sends is silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDevice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub pump_status: Option<bool>,
    #[serde(default)]
    pub water_level: Option<f64>,
    #[serde(default)]
    pub alert: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Complete device set; replaces any prior local copy.
    AllDevices(Vec<WireDevice>),
    /// Any other discriminant, with the whole payload preserved.
    Other { kind: String, payload: Value },
}

impl InboundMessage {
    /// The wire discriminant.
    pub fn kind(&self) -> &str {
        match self {
            Self::AllDevices(_) => ALL_DEVICES,
            Self::Other { kind, .. } => kind,
        }
    }
}

/// Why an inbound frame was dropped.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing or non-string `type` discriminant")]
    MissingType,

    #[error("invalid `{kind}` payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode one inbound text frame.
pub fn decode(text: &str) -> Result<InboundMessage, DecodeError> {
    let value: Value = serde_json::from_str(text).map_err(DecodeError::Syntax)?;

    let Value::Object(mut object) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?
        .to_owned();

    if kind == ALL_DEVICES {
        let data = object.remove("data").unwrap_or(Value::Null);
        let devices = serde_json::from_value::<Vec<WireDevice>>(data)
            .map_err(|source| DecodeError::InvalidPayload { kind, source })?;
        return Ok(InboundMessage::AllDevices(devices));
    }

    Ok(InboundMessage::Other {
        kind,
        payload: Value::Object(object),
    })
}

// ── Tests ────────────────────────────────────────────────────────────
