//! Integration tests for scoped feature queries

use blocks_features::{
    AttachedFeatures, Feature, FeatureConsumer, FeatureQuery, FeatureStore, MemoryFeatureStore,
    Scope,
};
use uuid::Uuid;

/// Minimal consumer standing for a card plugin instance
struct Card {
    features: AttachedFeatures,
}

impl FeatureConsumer for Card {
    fn consumer_type(&self) -> &str {
        "CardMain"
    }

    fn attached_features(&self) -> &AttachedFeatures {
        &self.features
    }
}

fn add(store: &mut MemoryFeatureStore, title: &str, value: &str, scope: Scope, plugins: &[&str]) -> Uuid {
    let feature = Feature::new(title, value, scope, plugins.iter().copied());
    let id = feature.id;
    store.insert(feature).unwrap();
    id
}

#[test]
fn test_no_attachment_gives_empty_results() {
    let store = MemoryFeatureStore::new();
    let card = Card {
        features: AttachedFeatures::new(),
    };

    let scoped = card.scoped_features(&store).unwrap();
    assert_eq!(scoped.len(), 3);
    assert!(scoped.values().all(Vec::is_empty));
    assert_eq!(card.flat_features(&store).unwrap(), "");
}

#[test]
fn test_scoped_and_flat_features() {
    let mut store = MemoryFeatureStore::new();
    let large = add(&mut store, "Large", "size-lg", Scope::Size, &["CardMain"]);
    let full = add(&mut store, "Full", "w-100", Scope::Size, &["CardMain", "HeroMain"]);
    let danger = add(&mut store, "Danger", "bg-danger", Scope::Color, &["CardMain"]);
    let shadow = add(&mut store, "Shadow", "shadow", Scope::Extra, &["CardMain"]);

    let mut features = AttachedFeatures::new();
    features.attach(Scope::Size, full);
    features.attach(Scope::Size, large);
    features.attach(Scope::Color, danger);
    features.attach(Scope::Extra, shadow);
    let card = Card { features };

    let scoped = card.scoped_features(&store).unwrap();
    assert_eq!(scoped[&Scope::Size], vec!["size-lg", "w-100"]);
    assert_eq!(scoped[&Scope::Color], vec!["bg-danger"]);
    assert_eq!(scoped[&Scope::Extra], vec!["shadow"]);

    assert_eq!(
        card.flat_features(&store).unwrap(),
        "bg-danger shadow size-lg w-100"
    );
}

#[test]
fn test_drifted_attachments_are_filtered() {
    let mut store = MemoryFeatureStore::new();
    let hero_only = add(&mut store, "Hero", "hero-only", Scope::Size, &["HeroMain"]);
    let color = add(&mut store, "Red", "red", Scope::Color, &["CardMain"]);
    let ok = add(&mut store, "Small", "small", Scope::Size, &["CardMain"]);

    let mut features = AttachedFeatures::new();
    // Not allowed for cards anymore
    features.attach(Scope::Size, hero_only);
    // Attached under the wrong scope
    features.attach(Scope::Size, color);
    // Deleted from the catalogue
    features.attach(Scope::Size, Uuid::new_v4());
    features.attach(Scope::Size, ok);
    let card = Card { features };

    let size: Vec<String> = card
        .query_scope(&store, Scope::Size)
        .unwrap()
        .into_iter()
        .map(|f| f.value)
        .collect();
    assert_eq!(size, vec!["small"]);

    let scoped = card.scoped_features(&store).unwrap();
    assert_eq!(scoped[&Scope::Size], vec!["small"]);
    assert!(scoped[&Scope::Color].is_empty());
    assert_eq!(card.flat_features(&store).unwrap(), "small");
}

#[test]
fn test_shared_values_kept_per_scope_but_flattened_once() {
    let mut store = MemoryFeatureStore::new();
    let a = add(&mut store, "Padded", "p-3", Scope::Size, &["CardMain"]);
    let b = add(&mut store, "Padded again", "p-3", Scope::Size, &["CardMain"]);
    let c = add(&mut store, "Padded extra", "p-3", Scope::Extra, &["CardMain"]);

    let mut features = AttachedFeatures::new();
    features.attach(Scope::Size, a);
    features.attach(Scope::Size, b);
    features.attach(Scope::Extra, c);
    let card = Card { features };

    let scoped = card.scoped_features(&store).unwrap();
    assert_eq!(scoped[&Scope::Size], vec!["p-3", "p-3"]);
    assert_eq!(card.flat_features(&store).unwrap(), "p-3");
}

#[test]
fn test_flat_features_ignore_attachment_order() {
    let mut store = MemoryFeatureStore::new();
    let ids: Vec<Uuid> = ["zeta", "alpha", "mid"]
        .iter()
        .map(|value| add(&mut store, value, value, Scope::Extra, &["CardMain"]))
        .collect();

    let mut forward = AttachedFeatures::new();
    let mut backward = AttachedFeatures::new();
    for id in &ids {
        forward.attach(Scope::Extra, *id);
    }
    for id in ids.iter().rev() {
        backward.attach(Scope::Extra, *id);
    }

    let first = Card { features: forward }.flat_features(&store).unwrap();
    let second = Card { features: backward }.flat_features(&store).unwrap();
    assert_eq!(first, "alpha mid zeta");
    assert_eq!(first, second);
}
