//! Request validation
//!
//! Validation failures are reported as a mapping from field name to a
//! list of messages, and every failing field is collected before a
//! request is rejected.

use std::collections::BTreeMap;

use serde::Serialize;

/// Message for a field absent from the request body
pub const REQUIRED: &str = "This field is required.";
/// Message for a present but blank field
pub const BLANK: &str = "This field may not be blank.";

/// Accumulated field validation errors.
///
/// Serializes as `{"field": ["message", ...], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against a field
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field, if any
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }
}

/// Validate a required text field, recording missing and blank values.
///
/// Whitespace is trimmed before the blank check, and the trimmed value is
/// what gets stored.
pub fn require_text(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    match value {
        None => {
            errors.push(field, REQUIRED);
            None
        }
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                errors.push(field, BLANK);
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

/// Validate an optional text field: absent is fine, blank is not.
pub fn optional_text(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            errors.push(field, BLANK);
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
