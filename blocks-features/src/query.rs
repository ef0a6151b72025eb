//! Scoped feature queries for consumers
//!
//! A consumer is any plugin instance that attaches features (a card, a hero,
//! an album item...). It stores feature ids per scope; the queries here resolve
//! them against the catalogue.
//!
//! Stored attachments are not trusted: a feature may have been moved to another
//! scope, or its plugin list edited, after it was attached. Every read filters
//! again on the scope and on the consumer type being allowed by the feature.

use crate::error::FeatureResult;
use crate::models::{Feature, Scope};
use crate::store::FeatureStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use uuid::Uuid;

/// Feature ids attached to a consumer, per scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFeatures {
    #[serde(default)]
    pub size: Vec<Uuid>,
    #[serde(default)]
    pub color: Vec<Uuid>,
    #[serde(default)]
    pub extra: Vec<Uuid>,
}

impl AttachedFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_scope(&self, scope: Scope) -> &[Uuid] {
        match scope {
            Scope::Size => &self.size,
            Scope::Color => &self.color,
            Scope::Extra => &self.extra,
        }
    }

    fn for_scope_mut(&mut self, scope: Scope) -> &mut Vec<Uuid> {
        match scope {
            Scope::Size => &mut self.size,
            Scope::Color => &mut self.color,
            Scope::Extra => &mut self.extra,
        }
    }

    /// Attach a feature id under a scope (no-op when already attached)
    pub fn attach(&mut self, scope: Scope, id: Uuid) {
        let ids = self.for_scope_mut(scope);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    pub fn detach(&mut self, scope: Scope, id: Uuid) {
        self.for_scope_mut(scope).retain(|attached| *attached != id);
    }

    /// Replace every attachment with the ones of `other`
    ///
    /// Used when a plugin instance is copied to another placeholder.
    pub fn copy_from(&mut self, other: &AttachedFeatures) {
        self.clone_from(other);
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty() && self.color.is_empty() && self.extra.is_empty()
    }
}

/// An entity that can have features attached
pub trait FeatureConsumer {
    /// Plugin type name matched against [`Feature::plugins`]
    fn consumer_type(&self) -> &str;

    fn attached_features(&self) -> &AttachedFeatures;
}

/// Read-side queries, available on every [`FeatureConsumer`]
pub trait FeatureQuery: FeatureConsumer {
    /// Attached features for `scope`, re-filtered on scope and plugin type
    ///
    /// Ids that no longer exist in the catalogue are ignored.
    fn query_scope<S>(&self, store: &S, scope: Scope) -> FeatureResult<Vec<Feature>>
    where
        S: FeatureStore + ?Sized,
    {
        let ids: HashSet<&Uuid> = self.attached_features().for_scope(scope).iter().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let consumer_type = self.consumer_type();

        Ok(store
            .all()?
            .into_iter()
            .filter(|f| ids.contains(&f.id))
            .filter(|f| f.scope == scope && f.plugins.contains(consumer_type))
            .collect())
    }

    /// Sorted values per scope, every scope present even when empty
    ///
    /// Two distinct features sharing a value both contribute it.
    fn scoped_features<S>(&self, store: &S) -> FeatureResult<BTreeMap<Scope, Vec<String>>>
    where
        S: FeatureStore + ?Sized,
    {
        let mut scoped = BTreeMap::new();

        for scope in Scope::ALL {
            let mut values: Vec<String> = self
                .query_scope(store, scope)?
                .into_iter()
                .map(|f| f.value)
                .collect();
            values.sort();
            scoped.insert(scope, values);
        }

        Ok(scoped)
    }

    /// Every attached value across scopes, deduplicated, sorted, space joined
    ///
    /// Suitable as the content of an HTML `class` attribute.
    fn flat_features<S>(&self, store: &S) -> FeatureResult<String>
    where
        S: FeatureStore + ?Sized,
    {
        let values: BTreeSet<String> = self
            .scoped_features(store)?
            .into_values()
            .flatten()
            .collect();

        Ok(values.into_iter().collect::<Vec<_>>().join(" "))
    }
}

impl<T: FeatureConsumer + ?Sized> FeatureQuery for T {}
