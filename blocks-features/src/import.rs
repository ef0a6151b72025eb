//! Bulk feature import from a JSON dump
//!
//! The dump is the document produced by [`export_catalogue`](crate::export_catalogue):
//!
//! ```json
//! {"version": "1.3.0", "date": "2024-07-05T15:04:21", "items": [
//!     {"title": "DANGER", "value": "bg-danger", "scope": "color", "plugins": ["CardMain"]}
//! ]}
//! ```
//!
//! Import happens in two steps:
//! 1. [`FeatureImport::parse`] validates the whole dump and collects every item
//!    problem at once. Nothing is imported if anything is wrong.
//! 2. [`FeatureImport::save`] classifies each item against the catalogue
//!    (created, duplicate, ignored) and, when committing, inserts the created
//!    ones. Importing never updates an existing feature.

use crate::error::FeatureError;
use crate::models::{Feature, Scope};
use crate::store::FeatureStore;
use blocks_common::validators::validate_feature_value;
use blocks_common::BlocksSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// A feature as it appears in a dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureItem {
    pub title: String,
    pub value: String,
    pub scope: Scope,
    pub plugins: Vec<String>,
}

impl FeatureItem {
    /// Build a new catalogue record from this item
    pub fn to_feature(&self) -> Feature {
        Feature::new(&self.title, &self.value, self.scope, self.plugins.iter().cloned())
    }
}

impl From<&Feature> for FeatureItem {
    fn from(feature: &Feature) -> Self {
        Self {
            title: feature.title.clone(),
            value: feature.value.clone(),
            scope: feature.scope,
            plugins: feature.plugins.to_vec(),
        }
    }
}

/// Why a dump item was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemErrorKind {
    MissingFields,
    UnknownScope,
    UnknownPlugin,
    DuplicateTitle,
    InvalidClassname,
}

/// A rejected dump item, `index` is 1-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    pub index: usize,
    pub kind: ItemErrorKind,
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.kind {
            ItemErrorKind::MissingFields => "is missing one or more required fields",
            ItemErrorKind::UnknownScope => "defines a scope choice that is not enabled",
            ItemErrorKind::UnknownPlugin => "defines a plugin name that is not enabled",
            ItemErrorKind::DuplicateTitle => "defines a title that already exists",
            ItemErrorKind::InvalidClassname => "has invalid CSS classname(s)",
        };
        write!(f, "#{} {}", self.index, message)
    }
}

/// Import failures
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("JSON should be a dictionary not a: {0}")]
    NotAnObject(&'static str),

    #[error("JSON is missing 'items' item for the feature data")]
    MissingItems,

    #[error("Item 'items' must be a list")]
    ItemsNotAList,

    #[error("Some dump items are invalid: {}", join_item_errors(.0))]
    InvalidItems(Vec<ItemError>),

    #[error(transparent)]
    Store(#[from] FeatureError),
}

fn join_item_errors(errors: &[ItemError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ImportError {
    /// Messages suitable to display one per line
    ///
    /// Item errors come after a header line, in dump order.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ImportError::InvalidItems(errors) => {
                let mut messages = vec!["Some dump items are invalid:".to_string()];
                messages.extend(errors.iter().map(ToString::to_string));
                messages
            }
            other => vec![other.to_string()],
        }
    }
}

/// Import behavior chosen by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Scopes whose items are never created
    pub ignore_scopes: Vec<Scope>,
}

/// Outcome of an import, per item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub disallowed_scopes: Vec<Scope>,
    pub created: Vec<FeatureItem>,
    pub duplicates: Vec<FeatureItem>,
    pub ignored: Vec<FeatureItem>,
}

/// A validated dump, ready to be saved
#[derive(Debug, Clone)]
pub struct FeatureImport {
    items: Vec<FeatureItem>,
    options: ImportOptions,
}

impl FeatureImport {
    /// Parse and validate a dump
    ///
    /// **Algorithm:**
    /// 1. Structural checks (valid JSON, object root, `items` present and a
    ///    list); the first failure aborts with a single error.
    /// 2. Every item is checked in order, the first failing rule is recorded
    ///    for the item: required fields, scope, plugins, title already used in
    ///    this dump for the same scope, value classname(s).
    /// 3. Any recorded item error rejects the whole dump.
    pub fn parse(
        data: &[u8],
        settings: &BlocksSettings,
        options: ImportOptions,
    ) -> Result<Self, ImportError> {
        let root: Value =
            serde_json::from_slice(data).map_err(|e| ImportError::InvalidJson(e.to_string()))?;

        let object = match &root {
            Value::Object(object) => object,
            other => return Err(ImportError::NotAnObject(json_kind(other))),
        };

        let raw_items = match object.get("items") {
            None => return Err(ImportError::MissingItems),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(ImportError::ItemsNotAList),
        };

        let mut items = Vec::with_capacity(raw_items.len());
        let mut errors = Vec::new();
        let mut seen: HashSet<(Scope, String)> = HashSet::new();

        for (position, raw) in raw_items.iter().enumerate() {
            let index = position + 1;

            match check_item(raw, settings, &seen) {
                Ok(item) => {
                    seen.insert((item.scope, item.title.clone()));
                    items.push(item);
                }
                Err(kind) => {
                    debug!(index, ?kind, "Rejected dump item");
                    errors.push(ItemError { index, kind });
                }
            }
        }

        if !errors.is_empty() {
            return Err(ImportError::InvalidItems(errors));
        }

        debug!("Dump validated with {} items", items.len());

        Ok(Self { items, options })
    }

    pub fn items(&self) -> &[FeatureItem] {
        &self.items
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Classify every item against the catalogue without touching it
    ///
    /// Existing titles are read once before classifying, so the result is the
    /// same as the one [`save`](Self::save) would return with `commit = true`.
    pub fn preview<S>(&self, store: &S) -> Result<ImportReport, ImportError>
    where
        S: FeatureStore + ?Sized,
    {
        let mut existing: BTreeMap<Scope, BTreeSet<String>> = BTreeMap::new();
        for scope in Scope::ALL {
            existing.insert(scope, store.titles_for_scope(scope)?);
        }

        let mut report = ImportReport {
            disallowed_scopes: self.options.ignore_scopes.clone(),
            ..Default::default()
        };

        for item in &self.items {
            let known = existing
                .get(&item.scope)
                .map(|titles| titles.contains(&item.title))
                .unwrap_or(false);

            if known {
                report.duplicates.push(item.clone());
            } else if self.options.ignore_scopes.contains(&item.scope) {
                report.ignored.push(item.clone());
            } else {
                report.created.push(item.clone());
            }
        }

        Ok(report)
    }

    /// Classify items and, when `commit` is true, insert the created ones
    ///
    /// Created items are inserted as a single batch so either all of them are
    /// saved or none.
    pub fn save<S>(&self, store: &mut S, commit: bool) -> Result<ImportReport, ImportError>
    where
        S: FeatureStore + ?Sized,
    {
        let report = self.preview(store)?;

        if commit && !report.created.is_empty() {
            let features: Vec<Feature> = report.created.iter().map(FeatureItem::to_feature).collect();
            store.insert_all(features)?;
        }

        info!(
            commit,
            created = report.created.len(),
            duplicates = report.duplicates.len(),
            ignored = report.ignored.len(),
            "Feature import processed"
        );

        Ok(report)
    }
}

fn check_item(
    raw: &Value,
    settings: &BlocksSettings,
    seen: &HashSet<(Scope, String)>,
) -> Result<FeatureItem, ItemErrorKind> {
    let title = required_str(raw, "title");
    let value = required_str(raw, "value");
    let scope = required_str(raw, "scope");
    let plugins = match raw.get("plugins") {
        Some(Value::Array(plugins)) if !plugins.is_empty() => Some(plugins),
        _ => None,
    };

    let (title, value, scope, plugins) = match (title, value, scope, plugins) {
        (Some(title), Some(value), Some(scope), Some(plugins)) => (title, value, scope, plugins),
        _ => return Err(ItemErrorKind::MissingFields),
    };

    let scope: Scope = scope.parse().map_err(|_| ItemErrorKind::UnknownScope)?;

    let mut plugin_names = Vec::with_capacity(plugins.len());
    for plugin in plugins {
        match plugin.as_str() {
            Some(name) if settings.is_known_plugin(name) => plugin_names.push(name.to_string()),
            _ => return Err(ItemErrorKind::UnknownPlugin),
        }
    }

    if seen.contains(&(scope, title.to_string())) {
        return Err(ItemErrorKind::DuplicateTitle);
    }

    validate_feature_value(value, settings.feature_allow_multiple_classes)
        .map_err(|_| ItemErrorKind::InvalidClassname)?;

    Ok(FeatureItem {
        title: title.to_string(),
        value: value.to_string(),
        scope,
        plugins: plugin_names,
    })
}

fn required_str<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dictionary",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_error_display() {
        let error = ItemError {
            index: 3,
            kind: ItemErrorKind::UnknownPlugin,
        };
        assert_eq!(error.to_string(), "#3 defines a plugin name that is not enabled");
    }

    #[test]
    fn test_messages_layout() {
        let error = ImportError::InvalidItems(vec![
            ItemError {
                index: 1,
                kind: ItemErrorKind::MissingFields,
            },
            ItemError {
                index: 4,
                kind: ItemErrorKind::InvalidClassname,
            },
        ]);

        assert_eq!(
            error.messages(),
            vec![
                "Some dump items are invalid:",
                "#1 is missing one or more required fields",
                "#4 has invalid CSS classname(s)",
            ]
        );

        assert_eq!(
            ImportError::MissingItems.messages(),
            vec!["JSON is missing 'items' item for the feature data"]
        );
    }

    #[test]
    fn test_json_kind_names() {
        assert_eq!(json_kind(&serde_json::json!([])), "list");
        assert_eq!(json_kind(&serde_json::json!("x")), "string");
        assert_eq!(json_kind(&serde_json::json!(null)), "null");
    }
}
