// ── Snapshot application ──
//
// `all_devices` carries the complete device set. It replaces whatever the
// store held, with no merging and no diffing.

use chrono::Utc;
use indexmap::IndexMap;

use super::DeviceStore;
use super::collection::Generation;
use crate::model::Device;

impl DeviceStore {
    /// Replace the device set with a server snapshot.
    ///
    /// - Duplicate ids keep the last occurrence (at the position of the
    ///   first).
    /// - A pending deletion whose device is gone is cleared.
    /// - The render sink is notified unconditionally.
    pub fn apply_snapshot(&self, devices: Vec<Device>) {
        let received = devices.len();
        let mut by_id: IndexMap<String, Device> = IndexMap::with_capacity(received);
        for device in devices {
            by_id.insert(device.id.clone(), device);
        }
        if by_id.len() != received {
            tracing::warn!(
                received,
                unique = by_id.len(),
                "snapshot contains duplicate device ids, keeping last"
            );
        }

        // The stale-target check and the publish happen under the pending
        // lock, so `confirm_delete` never takes a target the published set
        // no longer holds.
        let next = Generation::new(by_id);
        self.pending_delete.send_if_modified(|pending| {
            let stale = pending.as_deref().is_some_and(|id| !next.contains(id));
            if stale {
                tracing::debug!(device_id = ?pending, "pending deletion target left the device set");
                *pending = None;
            }
            self.devices.publish(next);
            stale
        });

        self.last_snapshot.send_replace(Some(Utc::now()));
        tracing::debug!(devices = self.device_count(), "snapshot applied");

        if let Some(sink) = self.render_sink() {
            sink.render(&self.devices_snapshot());
        }
    }
}
