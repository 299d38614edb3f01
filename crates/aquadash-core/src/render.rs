// ── Render seam ──
//
// The engine never draws anything itself. Whatever presents devices
// (terminal table, GUI, test recorder) implements `RenderSink` and is
// handed the `Dispatcher` when the engine is built.

use std::sync::Arc;

use aquadash_api::ConnectionState;

use crate::model::Device;

/// Receives the full device set after every snapshot.
///
/// Called on the connection task, once per applied snapshot, with no
/// diffing: identical snapshots render twice. Must not block.
pub trait RenderSink: Send + Sync {
    fn render(&self, devices: &[Arc<Device>]);

    /// Connection lifecycle changes. Ignored by default.
    fn connection_changed(&self, _state: ConnectionState) {}
}

/// A sink that draws nothing. Used when no presenter is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn render(&self, _devices: &[Arc<Device>]) {}
}
