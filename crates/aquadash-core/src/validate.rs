// ── Command validator ──
//
// Pure checks on an add-device draft. No network or state access; the
// caller decides how to surface the errors.

use std::fmt;

use thiserror::Error;

use crate::model::DeviceDraft;

/// Per-field validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum FieldError {
    Required,
}

/// Field-level errors for an add-device draft. `location` is never checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct FieldErrors {
    pub id: Option<FieldError>,
    pub name: Option<FieldError>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [("id", self.id), ("name", self.name)]
            .into_iter()
            .filter_map(|(field, err)| err.map(|e| format!("{field}: {e}")))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Validate a draft: `id` and `name` must be non-empty after trimming.
pub fn validate(draft: &DeviceDraft) -> Result<(), FieldErrors> {
    let errors = FieldErrors {
        id: required(&draft.id),
        name: required(&draft.name),
    };

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn required(value: &str) -> Option<FieldError> {
    value.trim().is_empty().then_some(FieldError::Required)
}
