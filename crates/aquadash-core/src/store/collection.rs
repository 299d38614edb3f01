// ── Generic reactive entity collection ──
//
// The whole set lives in one `watch` channel. A replacement builds the next
// generation off to the side and publishes it with a single store, so keyed
// lookups and the ordered view always come from the same generation.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::watch;

/// One published generation: entities in arrival order plus a key index.
pub(crate) struct Generation<T> {
    ordered: Arc<Vec<Arc<T>>>,
    index: HashMap<String, usize>,
}

impl<T> Generation<T> {
    /// Build a generation from `items`. Duplicate keys are already resolved.
    pub(crate) fn new(items: IndexMap<String, T>) -> Self {
        let mut index = HashMap::with_capacity(items.len());
        let mut ordered = Vec::with_capacity(items.len());
        for (position, (key, entity)) in items.into_iter().enumerate() {
            index.insert(key, position);
            ordered.push(Arc::new(entity));
        }
        Self {
            ordered: Arc::new(ordered),
            index,
        }
    }

    fn empty() -> Self {
        Self {
            ordered: Arc::new(Vec::new()),
            index: HashMap::new(),
        }
    }

    pub(crate) fn ordered(&self) -> &Arc<Vec<Arc<T>>> {
        &self.ordered
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Arc<T>> {
        self.index.get(key).map(|&i| &self.ordered[i])
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }
}

/// A reactive collection for a single entity type.
///
/// Every replacement bumps a version counter, even when the contents are
/// identical.
pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    current: watch::Sender<Generation<T>>,

    /// Version counter, bumped after every publish.
    version: watch::Sender<u64>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (current, _) = watch::channel(Generation::empty());
        let (version, _) = watch::channel(0u64);

        Self { current, version }
    }

    /// Replace every entity with `items`, keeping their order.
    #[cfg(test)]
    pub(crate) fn replace_all(&self, items: IndexMap<String, T>) {
        self.publish(Generation::new(items));
    }

    /// Swap in a prepared generation.
    pub(crate) fn publish(&self, next: Generation<T>) {
        // `send_replace` updates unconditionally, even with zero receivers.
        self.current.send_replace(next);
        self.version.send_modify(|v| *v += 1);
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.current.borrow().get(key).cloned()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.current.borrow().contains(key)
    }

    /// Get the current ordered snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        Arc::clone(self.current.borrow().ordered())
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Generation<T>> {
        self.current.subscribe()
    }

    pub(crate) fn subscribe_version(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.current.borrow().ordered().len()
    }
}
