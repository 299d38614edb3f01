// ── Wire → domain conversion ──
//
// Snapshot payloads are lenient: missing optional fields get the same
// defaults the dashboard renders (manual mode, pump off, 0% water).

use aquadash_api::WireDevice;

use crate::model::{Device, DeviceMode};

impl From<WireDevice> for Device {
    fn from(wire: WireDevice) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            location: non_blank(wire.location),
            mode: DeviceMode::from_wire(wire.mode.as_deref()),
            pump_status: wire.pump_status.unwrap_or(false),
            water_level: wire.water_level.unwrap_or(0.0),
            alert: non_blank(wire.alert),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
