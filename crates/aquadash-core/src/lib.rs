//! State synchronization and command dispatch between `aquadash-api` and
//! presenters (CLI today, anything implementing [`RenderSink`] tomorrow).
//!
//! - **[`Engine`]**: per-session facade. [`start()`](Engine::start) spawns
//!   the auto-reconnecting connection loop; inbound frames are decoded and
//!   routed on that task, so snapshots apply strictly in arrival order.
//!
//! - **[`DeviceStore`]**: the device set plus pending-deletion and
//!   add-form state, each held in a `tokio::sync::watch` channel. Only
//!   `all_devices` snapshots ever change the device set.
//!
//! - **[`Dispatcher`]**: turns user intents into outbound messages.
//!   Handed to the render sink at construction so presenters never need
//!   global state.
//!
//! - **[`MessageRouter`]**: decode → store for snapshots, decode → handler
//!   table for everything else.

pub mod command;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod model;
pub mod render;
pub mod router;
pub mod store;
pub mod stream;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::DeviceCommand;
pub use config::{EngineConfig, ReconnectPolicy};
pub use dispatch::{Delivery, Dispatcher};
pub use engine::Engine;
pub use error::CoreError;
pub use model::{Device, DeviceDraft, DeviceMode};
pub use render::{NullSink, RenderSink};
pub use router::{MessageHandler, MessageRouter, Routed};
pub use store::{DeviceStore, FormState};
pub use stream::{DeviceFilter, EntityStream};
pub use validate::{FieldError, FieldErrors, validate};

pub use aquadash_api::ConnectionState;
