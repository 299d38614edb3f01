// ── Add-device form draft ──

use serde::{Deserialize, Serialize};

use aquadash_api::NewDevice;

/// Fields typed into the add-device form before submission.
///
/// Transient: never part of the device set until the server echoes the
/// new device back in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDraft {
    pub id: String,
    pub name: String,
    pub location: String,
}

impl DeviceDraft {
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: location.into(),
        }
    }

    /// Trimmed wire payload for `add_device`. Does not validate.
    pub fn to_new_device(&self) -> NewDevice {
        NewDevice {
            id: self.id.trim().to_owned(),
            name: self.name.trim().to_owned(),
            location: self.location.trim().to_owned(),
        }
    }
}
