// ── Command dispatcher ──
//
// Translates user intents into outbound protocol messages. Nothing here
// mutates the device set: results are observed through the next
// snapshot. Sends are best effort; a send while disconnected is dropped
// and reported as `Delivery::Dropped`.

use std::sync::Arc;

use serde_json::Value;

use aquadash_api::{OutboundMessage, Outbox};

use crate::command::DeviceCommand;
use crate::error::CoreError;
use crate::model::{DeviceDraft, DeviceMode};
use crate::store::DeviceStore;
use crate::validate::{FieldErrors, validate};

/// Outcome of handing a message to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Delivery {
    /// Queued on the open connection.
    Sent,
    /// The connection was not open; the message was discarded.
    Dropped,
}

impl Delivery {
    pub fn is_sent(self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Command handler interface handed to render sinks.
///
/// Cheaply cloneable; every clone shares the same store and transport.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<DeviceStore>,
    outbox: Arc<dyn Outbox>,
}

impl Dispatcher {
    pub fn new(store: Arc<DeviceStore>, outbox: Arc<dyn Outbox>) -> Self {
        Self { store, outbox }
    }

    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.store
    }

    // ── Add / remove ─────────────────────────────────────────────────

    /// Validate and submit a new device.
    ///
    /// On validation failure the errors are recorded on the form and
    /// nothing is sent. On success `add_device` is sent with trimmed
    /// fields and the form is cleared whether or not the send went out.
    pub fn submit_add(&self, draft: &DeviceDraft) -> Result<Delivery, FieldErrors> {
        if let Err(errors) = validate(draft) {
            tracing::debug!(%errors, "add-device draft rejected");
            self.store.set_field_errors(errors.clone());
            return Err(errors);
        }

        let delivery = self.send(&OutboundMessage::AddDevice {
            device: draft.to_new_device(),
        });
        self.store.close_form();
        Ok(delivery)
    }

    /// Submit whatever draft the form currently holds.
    pub fn submit_form(&self) -> Result<Delivery, FieldErrors> {
        let draft = self.store.form().draft;
        self.submit_add(&draft)
    }

    /// Confirm the pending deletion, if any, and send it.
    pub fn submit_remove(&self) -> Option<Delivery> {
        let message = self.store.confirm_delete()?;
        Some(self.send(&message))
    }

    // ── Device commands ──────────────────────────────────────────────

    /// Send an arbitrary command. No local validation.
    pub fn send_command(&self, device_id: &str, command: &str, params: Value) -> Delivery {
        self.send(&OutboundMessage::Command {
            device_id: device_id.to_owned(),
            command: command.to_owned(),
            params,
        })
    }

    pub fn dispatch(&self, device_id: &str, command: DeviceCommand) -> Delivery {
        let (name, params) = command.into_parts();
        self.send_command(device_id, &name, params)
    }

    pub fn set_mode(&self, device_id: &str, mode: DeviceMode) -> Delivery {
        self.dispatch(device_id, DeviceCommand::SetMode(mode))
    }

    /// Request the opposite of the device's current mode.
    pub fn toggle_mode(&self, device_id: &str) -> Result<Delivery, CoreError> {
        let device = self
            .store
            .device_by_id(device_id)
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: device_id.to_owned(),
            })?;
        Ok(self.set_mode(device_id, device.mode.toggled()))
    }

    /// Switch the pump. The server rejects this outside manual mode.
    pub fn set_pump(&self, device_id: &str, on: bool) -> Delivery {
        self.dispatch(device_id, DeviceCommand::SetPumpStatus(on))
    }

    fn send(&self, message: &OutboundMessage) -> Delivery {
        match self.outbox.send(message) {
            Ok(()) => {
                tracing::debug!(kind = message.kind(), "message sent");
                Delivery::Sent
            }
            Err(e) => {
                tracing::warn!(kind = message.kind(), error = %e, "message dropped");
                Delivery::Dropped
            }
        }
    }
}
