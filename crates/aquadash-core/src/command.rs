// ── Device commands ──
//
// Typed view over the free-form `command` message. The server defines
// the vocabulary; the two the dashboard itself issues get variants, and
// anything else passes through `Custom` untouched.

use serde_json::Value;

use crate::model::DeviceMode;

pub const SET_MODE: &str = "setMode";
pub const SET_PUMP_STATUS: &str = "setPumpStatus";

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// `setMode` with `"manual"` / `"automatic"`.
    SetMode(DeviceMode),
    /// `setPumpStatus` with a boolean.
    SetPumpStatus(bool),
    Custom { name: String, params: Value },
}

impl DeviceCommand {
    pub fn name(&self) -> &str {
        match self {
            Self::SetMode(_) => SET_MODE,
            Self::SetPumpStatus(_) => SET_PUMP_STATUS,
            Self::Custom { name, .. } => name,
        }
    }

    pub fn params(&self) -> Value {
        match self {
            Self::SetMode(mode) => Value::String(mode.to_string()),
            Self::SetPumpStatus(on) => Value::Bool(*on),
            Self::Custom { params, .. } => params.clone(),
        }
    }

    pub fn into_parts(self) -> (String, Value) {
        match self {
            Self::Custom { name, params } => (name, params),
            other => (other.name().to_owned(), other.params()),
        }
    }
}
