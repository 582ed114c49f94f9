//! Form records, wizard sequencing and the concrete wizards (booking, shipment,
//! user accounts, warehouse receiving) plus the OTP digit group.
//!
//! Everything in here is synchronous and side-effect free; fetchers live in
//! `crate::api` and are invoked by the caller once a wizard hands out its
//! payload.

pub mod booking;
pub mod otp;
pub mod packages;
pub mod record;
pub mod shipment;
pub mod staff;
pub mod warehouse;
pub mod wizard;

use indexmap::IndexMap;

pub use record::{FieldPath, FieldValue, FormRecord, ListField, PathSegment};
pub use wizard::{FieldKind, FieldSpec, StepDefinition, StepOutcome, SubmitError, Wizard, WizardSchema};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("field '{path}' expects a {expected} value")]
    TypeMismatch { path: String, expected: &'static str },
    #[error("'{0}' is not a list field")]
    NotAList(String),
    #[error("index {index} is out of range for list '{field}'")]
    IndexOutOfRange { field: String, index: usize },
    #[error("step '{step}' references unknown field '{field}'")]
    UnknownStepField { step: &'static str, field: String },
    #[error("cannot build payload: {0}")]
    Payload(String),
}

/// Field path → message, in the order the validator reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMap {
    entries: IndexMap<String, String>,
}

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `path` unless that path already carries one.
    pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.entries.entry(path.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn first(&self) -> Option<(&str, &str)> {
        self.iter().next()
    }

    pub fn extend(&mut self, other: ErrorMap) {
        for (path, message) in other.entries {
            self.insert(path, message);
        }
    }

    /// Drops the entry for `path` and every entry nested below it.
    pub fn clear_path(&mut self, path: &FieldPath) {
        let key = path.to_string();
        let nested = format!("{}.", key);
        self.entries
            .retain(|existing, _| existing != &key && !existing.starts_with(&nested));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_map_keeps_first_message_per_path() {
        let mut errors = ErrorMap::new();
        errors.insert("email", "Email is required");
        errors.insert("email", "Enter a valid email address");
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn clear_path_removes_nested_entries_only() {
        let mut errors = ErrorMap::new();
        errors.insert("packages.0.weight", "Weight must be greater than zero");
        errors.insert("packages.0.packageType", "Package type is required");
        errors.insert("packages.1.weight", "Weight must be greater than zero");
        errors.insert("packages.10.weight", "Weight must be greater than zero");

        errors.clear_path(&FieldPath::parse("packages.1"));
        assert!(errors.contains("packages.0.weight"));
        assert!(errors.contains("packages.10.weight"));
        assert!(!errors.contains("packages.1.weight"));

        errors.clear_path(&FieldPath::parse("packages"));
        assert!(errors.is_empty());
    }
}
