//! Template rendering.
//!
//! Expands `{field}` placeholders from a contact's field map. Keys are
//! case-sensitive. Placeholders without a matching key pass through unchanged
//! so a caller can spot a column mismatch in the rendered text.

use crate::models::Contact;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

/// Reserved placeholder that falls back to the display name.
pub const NAME_KEY: &str = "name";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("placeholder pattern is valid"));

/// Render `template` against a field map and display name.
///
/// Substitution is a single pass: values that themselves look like
/// placeholders are not expanded again.
pub fn render(template: &str, fields: &BTreeMap<String, String>, display_name: &str) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            match fields.get(key) {
                Some(value) => value.clone(),
                None if key == NAME_KEY => display_name.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Render `template` for a contact.
pub fn render_for(template: &str, contact: &Contact) -> String {
    render(template, &contact.field_map, &contact.display_name)
}

/// Placeholder keys in `template` that the contact cannot resolve.
pub fn unresolved_keys(template: &str, contact: &Contact) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .filter(|key| key != NAME_KEY && !contact.field_map.contains_key(key))
        .collect()
}
