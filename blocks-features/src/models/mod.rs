//! Catalogue data models

pub mod feature;

pub use feature::{save_feature, Feature, PluginList, Scope};
