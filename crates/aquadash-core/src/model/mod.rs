// ── Domain model ──
//
// Canonical representation of a tank controller as the rest of the
// workspace sees it. Wire shapes live in `aquadash_api::protocol`;
// `convert` maps between the two.

pub mod device;
pub mod draft;

pub use device::{Device, DeviceMode};
pub use draft::DeviceDraft;
