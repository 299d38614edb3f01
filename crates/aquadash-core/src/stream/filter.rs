// ── Filter predicates for device snapshots ──
//
// Used by presenters to narrow a snapshot without touching the store.

use crate::model::{Device, DeviceMode};

/// Filter predicate for device collections.
pub enum DeviceFilter {
    All,
    ByMode(DeviceMode),
    PumpOn,
    PumpOff,
    /// Devices reporting an alert.
    Alerting,
    /// Water level strictly below the given percentage.
    LevelBelow(f64),
    Custom(Box<dyn Fn(&Device) -> bool + Send + Sync>),
}

impl DeviceFilter {
    pub fn matches(&self, device: &Device) -> bool {
        match self {
            Self::All => true,
            Self::ByMode(mode) => device.mode == *mode,
            Self::PumpOn => device.pump_status,
            Self::PumpOff => !device.pump_status,
            Self::Alerting => device.alert.is_some(),
            Self::LevelBelow(pct) => device.water_level < *pct,
            Self::Custom(f) => f(device),
        }
    }
}
