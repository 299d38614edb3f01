// ── Central reactive device store ──
//
// Device set plus UI sub-state. Every field lives in a `watch` channel
// so each mutation is a single atomic assignment and readers never block
// the connection task.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::EntityCollection;
use super::selection::FormState;
use crate::model::Device;
use crate::render::RenderSink;
use crate::stream::EntityStream;

/// Reactive store for one engine session.
///
/// Devices are only ever written by [`apply_snapshot`](Self::apply_snapshot);
/// the client never mutates a device locally.
pub struct DeviceStore {
    pub(crate) devices: EntityCollection<Device>,
    pub(crate) pending_delete: watch::Sender<Option<String>>,
    pub(crate) form: watch::Sender<FormState>,
    pub(crate) last_snapshot: watch::Sender<Option<DateTime<Utc>>>,
    pub(crate) render_sink: OnceLock<Arc<dyn RenderSink>>,
}

impl DeviceStore {
    pub fn new() -> Self {
        let (pending_delete, _) = watch::channel(None);
        let (form, _) = watch::channel(FormState::default());
        let (last_snapshot, _) = watch::channel(None);

        Self {
            devices: EntityCollection::new(),
            pending_delete,
            form,
            last_snapshot,
            render_sink: OnceLock::new(),
        }
    }

    /// Attach the presenter notified on every snapshot.
    ///
    /// Only the first sink sticks; returns `false` if one was already set.
    pub fn attach_render_sink(&self, sink: Arc<dyn RenderSink>) -> bool {
        self.render_sink.set(sink).is_ok()
    }

    pub(crate) fn render_sink(&self) -> Option<&Arc<dyn RenderSink>> {
        self.render_sink.get()
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// Devices in the order of the last snapshot.
    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.snapshot()
    }

    pub fn device_by_id(&self, id: &str) -> Option<Arc<Device>> {
        self.devices.get(id)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_devices(&self) -> EntityStream<Device> {
        EntityStream::new(self.devices.subscribe())
    }

    pub fn subscribe_form(&self) -> watch::Receiver<FormState> {
        self.form.subscribe()
    }

    /// Watch the number of applied snapshots.
    pub fn subscribe_snapshot_count(&self) -> watch::Receiver<u64> {
        self.devices.subscribe_version()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    /// Number of snapshots applied so far.
    pub fn snapshot_count(&self) -> u64 {
        self.devices.version()
    }

    pub fn last_snapshot_at(&self) -> Option<DateTime<Utc>> {
        *self.last_snapshot.borrow()
    }

    /// How long ago the last snapshot arrived, or `None` if none has.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_snapshot_at().map(|t| Utc::now() - t)
    }
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}
