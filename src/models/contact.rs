//! Contact model representing one row of a dispatch list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A recipient as handed over by the caller.
///
/// `normalized_phone` is `None` on input. The normalizer produces one copy per
/// dispatchable number with the field set, or keeps it `None` when nothing in
/// `raw_phone` could be dispatched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Contact {
    /// Phone field exactly as it appeared in the source, possibly several
    /// numbers separated by commas
    #[serde(alias = "phone", alias = "mobile")]
    pub raw_phone: String,

    /// Digits-only identifier with the country code applied
    pub normalized_phone: Option<String>,

    /// Name used for the reserved `{name}` placeholder
    #[serde(alias = "name")]
    pub display_name: String,

    /// Column values available to the template renderer (case-sensitive keys)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_map: BTreeMap<String, String>,

    /// Message that overrides every job-level content source
    #[serde(
        alias = "custom_message",
        skip_serializing_if = "Option::is_none"
    )]
    pub per_contact_message: Option<String>,
}

impl Contact {
    /// Create a contact with only a phone field and a display name.
    pub fn new(raw_phone: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            raw_phone: raw_phone.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    /// Add a field available to template placeholders.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_map.insert(key.into(), value.into());
        self
    }

    /// Set a per-contact message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.per_contact_message = Some(message.into());
        self
    }

    /// Copy of this contact bound to one normalized identifier.
    pub fn with_normalized(&self, identifier: impl Into<String>) -> Self {
        Self {
            normalized_phone: Some(identifier.into()),
            ..self.clone()
        }
    }

    /// Per-contact message if it carries any text.
    ///
    /// Spreadsheet exports write `nan` for empty cells; that counts as absent.
    pub fn custom_message(&self) -> Option<&str> {
        self.per_contact_message
            .as_deref()
            .filter(|m| !is_blank_cell(m))
    }
}

/// Whether a spreadsheet cell should be treated as empty.
pub fn is_blank_cell(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}
