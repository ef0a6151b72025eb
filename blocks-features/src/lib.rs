//! Feature catalogue for content blocks
//!
//! Features are reusable style tags (CSS classnames) scoped by `size`, `color`
//! or `extra` and restricted to a set of plugin types. This crate provides:
//! - The [`Feature`] record and its validation
//! - A catalogue store abstraction with in-memory and JSON file backends
//! - Scoped queries for any consumer that attaches features
//! - Bulk JSON import and export of the catalogue

pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod query;
pub mod store;

pub use error::{FeatureError, FeatureResult};
pub use export::{export_catalogue, ExportDocument};
pub use import::{FeatureImport, FeatureItem, ImportError, ImportOptions, ImportReport};
pub use models::{Feature, PluginList, Scope};
pub use query::{AttachedFeatures, FeatureConsumer, FeatureQuery};
pub use store::{FeatureStore, JsonFileStore, MemoryFeatureStore};
