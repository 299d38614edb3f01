// ── UI sub-state: pending deletion and the add-device form ──
//
// Two independent machines, `Idle ↔ ConfirmingDelete` and
// `Idle ↔ Drafting`. Neither touches the device set.

use serde::Serialize;

use aquadash_api::OutboundMessage;

use super::DeviceStore;
use crate::model::DeviceDraft;
use crate::validate::FieldErrors;

/// Add-device form as the presenter sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub visible: bool,
    pub draft: DeviceDraft,
    #[serde(skip)]
    pub errors: FieldErrors,
}

impl DeviceStore {
    // ── Pending deletion ─────────────────────────────────────────────

    /// Mark a device for deletion, pending confirmation.
    ///
    /// An empty or absent id is ignored. A second request replaces the first.
    pub fn request_delete<'a>(&self, device_id: impl Into<Option<&'a str>>) {
        let Some(id) = device_id.into().filter(|id| !id.is_empty()) else {
            return;
        };
        tracing::debug!(device_id = id, "deletion requested");
        self.pending_delete.send_replace(Some(id.to_owned()));
    }

    pub fn cancel_delete(&self) {
        self.pending_delete.send_if_modified(|pending| pending.take().is_some());
    }

    /// Take the pending target as a `remove_device` command.
    ///
    /// Returns `None` (and does nothing) when no deletion is pending.
    pub fn confirm_delete(&self) -> Option<OutboundMessage> {
        let mut taken = None;
        self.pending_delete.send_if_modified(|pending| {
            taken = pending.take();
            taken.is_some()
        });
        taken.map(|device_id| OutboundMessage::RemoveDevice { device_id })
    }

    pub fn pending_delete(&self) -> Option<String> {
        self.pending_delete.borrow().clone()
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.pending_delete.borrow().is_some()
    }

    // ── Add-device form ──────────────────────────────────────────────

    /// Show the form with an empty draft.
    pub fn open_form(&self) {
        self.form.send_replace(FormState {
            visible: true,
            ..FormState::default()
        });
    }

    /// Replace the draft. Clears stale field errors; opens the form if hidden.
    pub fn update_draft(&self, draft: DeviceDraft) {
        self.form.send_modify(|form| {
            form.visible = true;
            form.draft = draft;
            form.errors = FieldErrors::default();
        });
    }

    pub fn set_field_errors(&self, errors: FieldErrors) {
        self.form.send_modify(|form| form.errors = errors);
    }

    /// Hide the form and discard the draft.
    pub fn close_form(&self) {
        self.form.send_replace(FormState::default());
    }

    pub fn form(&self) -> FormState {
        self.form.borrow().clone()
    }

    pub fn is_drafting(&self) -> bool {
        self.form.borrow().visible
    }
}
