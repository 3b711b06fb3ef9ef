//! Configuration wizard — a paginated editor over the stack environment.
//!
//! One field is focused at a time; Left/Right move between fields. Values
//! live in the field inputs themselves — save reads them from there, so a
//! failed validation never leaves a stale copy behind.

use std::collections::BTreeMap;

use crate::config::validate::{validate, ValidateError};

/// Key-name fragments that mark a field as sensitive (masked input).
const SENSITIVE_FRAGMENTS: &[&str] = &["password", "secret", "token", "key"];

/// Whether a configuration key should get a masked input.
pub fn is_sensitive(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_FRAGMENTS.iter().any(|f| lower.contains(f))
}

/// A one-line text input with a cursor. Insertion happens at the cursor;
/// the cursor is only drawn while focused.
#[derive(Debug, Clone, Default)]
pub struct FieldInput {
    pub value: String,
    pub cursor: usize,
    pub focused: bool,
}

impl FieldInput {
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
            focused: false,
        }
    }

    pub fn focus(&mut self) {
        self.focused = true;
        self.cursor = self.value.chars().count();
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn insert(&mut self, c: char) {
        let byte = byte_offset(&self.value, self.cursor);
        self.value.insert(byte, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte = byte_offset(&self.value, self.cursor);
        self.value.remove(byte);
    }
}

fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// One editable configuration field.
#[derive(Debug, Clone)]
pub struct WizardField {
    pub key: String,
    pub input: FieldInput,
    pub masked: bool,
    /// Wizard-local unmask toggle for this field.
    pub revealed: bool,
}

/// A live wizard over the loaded configuration pairs.
#[derive(Debug, Clone, Default)]
pub struct WizardSession {
    pub fields: Vec<WizardField>,
    pub index: usize,
    pub error: Option<String>,
}

impl WizardSession {
    /// Build a session from loaded pairs. BTreeMap iteration gives the
    /// deterministic alphabetical field order.
    pub fn new(pairs: &BTreeMap<String, String>) -> Self {
        let mut fields: Vec<WizardField> = pairs
            .iter()
            .map(|(key, value)| WizardField {
                key: key.clone(),
                input: FieldInput::with_value(value),
                masked: is_sensitive(key),
                revealed: false,
            })
            .collect();
        if let Some(first) = fields.first_mut() {
            first.input.focus();
        }
        Self {
            fields,
            index: 0,
            error: None,
        }
    }

    pub fn field(&self) -> Option<&WizardField> {
        self.fields.get(self.index)
    }

    pub fn field_mut(&mut self) -> Option<&mut WizardField> {
        self.fields.get_mut(self.index)
    }

    /// Move focus by `delta` fields, clamped. Blurs the old input,
    /// focuses the new one, clears any pending error.
    pub fn navigate(&mut self, delta: isize) {
        if self.fields.is_empty() {
            return;
        }
        let max = self.fields.len() - 1;
        let next = self
            .index
            .saturating_add_signed(delta)
            .min(max);
        if next != self.index {
            self.fields[self.index].input.blur();
            self.index = next;
            self.fields[self.index].input.focus();
        }
        self.error = None;
    }

    pub fn next(&mut self) {
        self.navigate(1);
    }

    pub fn prev(&mut self) {
        self.navigate(-1);
    }

    /// Validate every field in order against the live input values.
    /// Returns the full sanitized pair set, or the first offending field
    /// and its error. Empty values are always allowed.
    pub fn validate_all(&self) -> Result<Vec<(String, String)>, (String, ValidateError)> {
        let mut pairs = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let raw = field.input.value.as_str();
            if raw.trim().is_empty() {
                pairs.push((field.key.clone(), String::new()));
                continue;
            }
            match validate(&field.key, raw) {
                Ok(sanitized) => pairs.push((field.key.clone(), sanitized)),
                Err(e) => return Err((field.key.clone(), e)),
            }
        }
        Ok(pairs)
    }
}
