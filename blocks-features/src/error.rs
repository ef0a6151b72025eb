//! Error types for the feature catalogue

use crate::models::Scope;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Result type for catalogue operations
pub type FeatureResult<T> = Result<T, FeatureError>;

/// Catalogue error type
#[derive(Debug, Error)]
pub enum FeatureError {
    /// One or more fields failed validation
    #[error("Feature validation failed: {0}")]
    Validation(FieldErrors),

    /// `(scope, title)` pair is already used by another feature
    #[error("A feature with scope '{scope}' and title '{title}' already exists")]
    Duplicate { scope: Scope, title: String },

    /// No feature with this id
    #[error("Feature not found: {0}")]
    NotFound(Uuid),

    /// Catalogue file access error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalogue file encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validation messages grouped by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for one field (empty when the field is valid)
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// `Ok(())` when empty, else a validation error carrying every message
    pub fn into_result(self) -> FeatureResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(FeatureError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}
