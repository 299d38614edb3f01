// ── Reactive entity streams ──
//
// Subscription types for consuming snapshot changes from the DeviceStore.

mod filter;

use std::sync::Arc;

use tokio::sync::watch;

pub use filter::DeviceFilter;

use crate::model::Device;
use crate::store::Generation;

/// A subscription to the device set.
///
/// `current()` is the snapshot seen at creation (or at the last
/// `changed()`); `latest()` always reads through to the store.
pub struct EntityStream<T: Send + Sync + 'static> {
    current: Arc<Vec<Arc<T>>>,
    receiver: watch::Receiver<Generation<T>>,
}

impl<T: Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Generation<T>>) -> Self {
        let current = Arc::clone(receiver.borrow().ordered());
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time.
    pub fn current(&self) -> &Arc<Vec<Arc<T>>> {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<Vec<Arc<T>>> {
        Arc::clone(self.receiver.borrow().ordered())
    }

    /// Wait for the next snapshot, even if identical to the last one.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<T>>>> {
        self.receiver.changed().await.ok()?;
        let snap = Arc::clone(self.receiver.borrow_and_update().ordered());
        self.current = Arc::clone(&snap);
        Some(snap)
    }
}

impl EntityStream<Device> {
    /// Devices in the latest snapshot that pass `filter`, in snapshot order.
    pub fn latest_matching(&self, filter: &DeviceFilter) -> Vec<Arc<Device>> {
        self.latest()
            .iter()
            .filter(|device| filter.matches(device))
            .cloned()
            .collect()
    }
}
