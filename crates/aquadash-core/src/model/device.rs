// ── Device domain types ──

use serde::{Deserialize, Serialize};

/// Control mode reported by the server.
///
/// Anything the server sends other than `"automatic"` is treated as
/// manual, matching how the dashboard labels devices.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceMode {
    #[default]
    Manual,
    Automatic,
}

impl DeviceMode {
    /// Parse the wire value, falling back to `Manual`.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("automatic") => Self::Automatic,
            _ => Self::Manual,
        }
    }

    /// The mode a "switch mode" action moves to.
    pub fn toggled(self) -> Self {
        match self {
            Self::Manual => Self::Automatic,
            Self::Automatic => Self::Manual,
        }
    }

    pub fn is_manual(self) -> bool {
        matches!(self, Self::Manual)
    }
}

/// One tank/pump controller.
///
/// Created only from server snapshots; the client never fabricates one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Opaque identifier, assigned at creation and immutable.
    pub id: String,
    pub name: String,
    /// `None` means unknown.
    pub location: Option<String>,
    pub mode: DeviceMode,
    /// Only settable while `mode` is manual (enforced by the server).
    pub pump_status: bool,
    /// Percentage. Out-of-range values are kept as received.
    pub water_level: f64,
    pub alert: Option<String>,
}

impl Device {
    /// Location label with the dashboard's placeholder for unknown.
    pub fn location_label(&self) -> &str {
        self.location.as_deref().unwrap_or("—")
    }

    /// Whether pump on/off controls apply (the device is in manual mode).
    pub fn pump_controllable(&self) -> bool {
        self.mode.is_manual()
    }

    /// Water level clamped to [0, 100] for gauges.
    pub fn water_level_pct(&self) -> f64 {
        self.water_level.clamp(0.0, 100.0)
    }

    /// First six characters of the id, as shown on device cards.
    pub fn short_id(&self) -> &str {
        self.id
            .char_indices()
            .nth(6)
            .map_or(self.id.as_str(), |(idx, _)| &self.id[..idx])
    }
}
