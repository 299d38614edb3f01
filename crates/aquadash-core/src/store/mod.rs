// ── Reactive device store ──
//
// Single source of truth for the device set and the two pieces of UI
// state that hang off it (pending deletion and the add-device form).

mod collection;
mod data_store;
mod selection;
mod snapshot;

pub(crate) use collection::Generation;
pub use data_store::DeviceStore;
pub use selection::FormState;
