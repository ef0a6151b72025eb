//! Feature catalogue storage
//!
//! The catalogue is injected wherever it is needed through the [`FeatureStore`]
//! trait. Every implementation enforces `(scope, title)` uniqueness at write
//! time, independently from [`Feature::full_clean`](crate::Feature::full_clean).

use crate::error::{FeatureError, FeatureResult};
use crate::models::{Feature, Scope};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Catalogue storage backend
pub trait FeatureStore {
    /// Every feature, in insertion order
    fn all(&self) -> FeatureResult<Vec<Feature>>;

    fn get(&self, id: Uuid) -> FeatureResult<Option<Feature>>;

    /// Insert a new feature, failing on a `(scope, title)` collision
    fn insert(&mut self, feature: Feature) -> FeatureResult<()>;

    /// Insert a batch of features, either all of them or none
    fn insert_all(&mut self, features: Vec<Feature>) -> FeatureResult<()>;

    /// Replace an existing feature (matched by id)
    fn update(&mut self, feature: Feature) -> FeatureResult<()>;

    /// Delete a feature, returns whether it existed
    fn delete(&mut self, id: Uuid) -> FeatureResult<bool>;

    fn find(&self, scope: Scope, title: &str) -> FeatureResult<Option<Feature>> {
        Ok(self
            .all()?
            .into_iter()
            .find(|f| f.scope == scope && f.title == title))
    }

    /// Titles already used in a scope
    fn titles_for_scope(&self, scope: Scope) -> FeatureResult<BTreeSet<String>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|f| f.scope == scope)
            .map(|f| f.title)
            .collect())
    }

    fn count(&self) -> FeatureResult<usize> {
        Ok(self.all()?.len())
    }
}

/// In-memory catalogue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryFeatureStore {
    features: Vec<Feature>,
}

impl MemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(&self, candidate: &Feature) -> FeatureResult<()> {
        let collision = self.features.iter().any(|f| {
            f.id != candidate.id && f.scope == candidate.scope && f.title == candidate.title
        });

        if collision {
            return Err(FeatureError::Duplicate {
                scope: candidate.scope,
                title: candidate.title.clone(),
            });
        }

        Ok(())
    }
}

impl FeatureStore for MemoryFeatureStore {
    fn all(&self) -> FeatureResult<Vec<Feature>> {
        Ok(self.features.clone())
    }

    fn get(&self, id: Uuid) -> FeatureResult<Option<Feature>> {
        Ok(self.features.iter().find(|f| f.id == id).cloned())
    }

    fn insert(&mut self, feature: Feature) -> FeatureResult<()> {
        self.check_unique(&feature)?;
        self.features.push(feature);
        Ok(())
    }

    fn insert_all(&mut self, features: Vec<Feature>) -> FeatureResult<()> {
        let mut batch_keys = HashSet::new();

        for feature in &features {
            self.check_unique(feature)?;
            if !batch_keys.insert((feature.scope, feature.title.as_str())) {
                return Err(FeatureError::Duplicate {
                    scope: feature.scope,
                    title: feature.title.clone(),
                });
            }
        }

        self.features.extend(features);
        Ok(())
    }

    fn update(&mut self, feature: Feature) -> FeatureResult<()> {
        self.check_unique(&feature)?;

        let slot = self
            .features
            .iter_mut()
            .find(|f| f.id == feature.id)
            .ok_or(FeatureError::NotFound(feature.id))?;
        *slot = feature;

        Ok(())
    }

    fn delete(&mut self, id: Uuid) -> FeatureResult<bool> {
        let before = self.features.len();
        self.features.retain(|f| f.id != id);
        Ok(self.features.len() != before)
    }

    fn count(&self) -> FeatureResult<usize> {
        Ok(self.features.len())
    }
}

/// Catalogue persisted as a JSON file
///
/// Each mutation is applied to a copy of the catalogue, written to disk
/// (temp file + rename), and only then becomes visible. A failed write leaves
/// both the file and the in-memory catalogue untouched.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryFeatureStore,
}

impl JsonFileStore {
    /// Open a catalogue file, starting empty when it does not exist yet
    pub fn open(path: impl AsRef<Path>) -> FeatureResult<Self> {
        let path = path.as_ref().to_path_buf();

        let inner = if path.exists() {
            let content = std::fs::read(&path)?;
            let store: MemoryFeatureStore = serde_json::from_slice(&content)?;
            info!(
                "Loaded {} features from {}",
                store.features.len(),
                path.display()
            );
            store
        } else {
            debug!("Catalogue file {} not found, starting empty", path.display());
            MemoryFeatureStore::new()
        };

        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit<F>(&mut self, mutate: F) -> FeatureResult<()>
    where
        F: FnOnce(&mut MemoryFeatureStore) -> FeatureResult<()>,
    {
        let mut next = self.inner.clone();
        mutate(&mut next)?;
        write_catalogue(&next, &self.path)?;
        self.inner = next;
        Ok(())
    }
}

fn write_catalogue(store: &MemoryFeatureStore, path: &Path) -> FeatureResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_vec_pretty(store)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

impl FeatureStore for JsonFileStore {
    fn all(&self) -> FeatureResult<Vec<Feature>> {
        self.inner.all()
    }

    fn get(&self, id: Uuid) -> FeatureResult<Option<Feature>> {
        self.inner.get(id)
    }

    fn insert(&mut self, feature: Feature) -> FeatureResult<()> {
        self.commit(|store| store.insert(feature))
    }

    fn insert_all(&mut self, features: Vec<Feature>) -> FeatureResult<()> {
        self.commit(|store| store.insert_all(features))
    }

    fn update(&mut self, feature: Feature) -> FeatureResult<()> {
        self.commit(|store| store.update(feature))
    }

    fn delete(&mut self, id: Uuid) -> FeatureResult<bool> {
        let mut existed = false;
        self.commit(|store| {
            existed = store.delete(id)?;
            Ok(())
        })?;
        Ok(existed)
    }

    fn count(&self) -> FeatureResult<usize> {
        self.inner.count()
    }
}
