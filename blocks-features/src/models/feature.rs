//! Feature record
//!
//! A feature is a named CSS classname usable by plugin instances to tweak their
//! layout. Features are partitioned by [`Scope`] and each one lists the plugin
//! types allowed to use it.

use crate::error::{FeatureError, FeatureResult, FieldErrors};
use crate::store::FeatureStore;
use blocks_common::validators::validate_feature_value;
use blocks_common::BlocksSettings;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

/// Feature scope
///
/// Variants are declared in token order so the derived ordering sorts scopes
/// the same way their serialized names would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Color,
    Extra,
    Size,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Size, Scope::Color, Scope::Extra];

    /// Serialized token
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Size => "size",
            Scope::Color => "color",
            Scope::Extra => "extra",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Scope::Size => "Size",
            Scope::Color => "Color",
            Scope::Extra => "Extra",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "size" => Ok(Scope::Size),
            "color" => Ok(Scope::Color),
            "extra" => Ok(Scope::Extra),
            other => Err(format!("Unknown scope: {}", other)),
        }
    }
}

/// Ordered list of plugin names a feature is allowed for
///
/// Persisted as a single comma separated string (`"AlbumMain,CardMain"`), so a
/// plugin name can not contain a comma. Membership is checked on whole tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginList(Vec<String>);

impl PluginList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Decode the stored comma separated form; an empty string is an empty list
    pub fn parse(stored: &str) -> Self {
        if stored.is_empty() {
            return Self::default();
        }

        Self(stored.split(',').map(str::to_string).collect())
    }

    /// Encode to the stored comma separated form
    pub fn to_stored(&self) -> String {
        self.0.join(",")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|plugin| plugin == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl Serialize for PluginList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_stored())
    }
}

impl<'de> Deserialize<'de> for PluginList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = String::deserialize(deserializer)?;
        Ok(Self::parse(&stored))
    }
}

/// A layout feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub title: String,
    /// One CSS classname (or several when multiple classes are enabled)
    pub value: String,
    pub scope: Scope,
    #[serde(default)]
    pub plugins: PluginList,
}

impl Feature {
    /// Build a new unsaved feature; no validation happens here
    pub fn new<I, S>(title: &str, value: &str, scope: Scope, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            value: value.to_string(),
            scope,
            plugins: PluginList::new(plugins),
        }
    }

    /// Validate field values, collecting every field error
    pub fn clean_fields(&self, settings: &BlocksSettings) -> FeatureResult<()> {
        let mut errors = FieldErrors::new();

        if self.title.trim().is_empty() {
            errors.add("title", "This field cannot be blank.");
        }

        if self.value.trim().is_empty() {
            errors.add("value", "This field cannot be blank.");
        } else if validate_feature_value(&self.value, settings.feature_allow_multiple_classes)
            .is_err()
        {
            errors.add("value", "Enter a valid CSS classname.");
        }

        errors.into_result()
    }

    /// Validate plugin names against the known plugin registry
    ///
    /// The record layer accepts any name; this is the check an edit form
    /// applies before saving.
    pub fn clean_plugins(&self, settings: &BlocksSettings) -> FeatureResult<()> {
        let mut errors = FieldErrors::new();

        for plugin in self.plugins.iter() {
            if !settings.is_known_plugin(plugin) {
                errors.add(
                    "plugins",
                    format!("Select a valid choice. {} is not one of the available choices.", plugin),
                );
            }
        }

        errors.into_result()
    }

    /// Full validation: field values then `(scope, title)` uniqueness
    ///
    /// The record's own id is ignored by the uniqueness check so an existing
    /// feature can be validated again before an update.
    pub fn full_clean<S>(&self, settings: &BlocksSettings, store: &S) -> FeatureResult<()>
    where
        S: FeatureStore + ?Sized,
    {
        self.clean_fields(settings)?;

        match store.find(self.scope, &self.title)? {
            Some(existing) if existing.id != self.id => Err(FeatureError::Duplicate {
                scope: self.scope,
                title: self.title.clone(),
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope.label(), self.title)
    }
}

/// Validate then insert or update a feature
pub fn save_feature<S>(
    store: &mut S,
    feature: Feature,
    settings: &BlocksSettings,
) -> FeatureResult<Feature>
where
    S: FeatureStore + ?Sized,
{
    feature.full_clean(settings, store)?;

    if store.get(feature.id)?.is_some() {
        debug!(feature = %feature, "Updating feature");
        store.update(feature.clone())?;
    } else {
        debug!(feature = %feature, "Creating feature");
        store.insert(feature.clone())?;
    }

    Ok(feature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryFeatureStore;

    #[test]
    fn test_plugin_list_stored_form() {
        let plugins = PluginList::parse("AlbumMain,CardMain");
        assert_eq!(plugins.len(), 2);
        assert!(plugins.contains("CardMain"));
        assert!(!plugins.contains("Card"));
        assert_eq!(plugins.to_stored(), "AlbumMain,CardMain");

        assert!(PluginList::parse("").is_empty());
        assert_eq!(PluginList::default().to_stored(), "");
    }

    #[test]
    fn test_scope_tokens() {
        for scope in Scope::ALL {
            assert_eq!(scope.as_str().parse::<Scope>(), Ok(scope));
        }
        assert!("colour".parse::<Scope>().is_err());
        assert!(Scope::Color < Scope::Extra && Scope::Extra < Scope::Size);
    }

    #[test]
    fn test_display() {
        let feature = Feature::new("Foo", "foo", Scope::Size, ["CardMain"]);
        assert_eq!(feature.to_string(), "Size:Foo");
    }

    #[test]
    fn test_required_fields() {
        let settings = BlocksSettings::default();
        let feature = Feature::new("", "", Scope::Size, Vec::<String>::new());

        match feature.clean_fields(&settings) {
            Err(FeatureError::Validation(errors)) => {
                assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["title", "value"]);
                assert_eq!(errors.field("title"), ["This field cannot be blank."]);
                assert_eq!(errors.field("value"), ["This field cannot be blank."]);
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_value_whitespaces_follow_setting() {
        let mut settings = BlocksSettings::default();
        let feature = Feature::new("Foo", "Dummy Yummy", Scope::Size, ["CardMain"]);

        settings.feature_allow_multiple_classes = false;
        assert!(matches!(
            feature.clean_fields(&settings),
            Err(FeatureError::Validation(_))
        ));

        settings.feature_allow_multiple_classes = true;
        assert!(feature.clean_fields(&settings).is_ok());
    }

    #[test]
    fn test_clean_plugins() {
        let settings = BlocksSettings::default();

        let feature = Feature::new("Foo", "foo", Scope::Size, ["CardMain", "Nope"]);
        match feature.clean_plugins(&settings) {
            Err(FeatureError::Validation(errors)) => assert_eq!(errors.field("plugins").len(), 1),
            other => panic!("Expected Validation error, got {:?}", other),
        }

        let empty = Feature::new("Foo", "foo", Scope::Size, Vec::<String>::new());
        assert!(empty.clean_plugins(&settings).is_ok());
    }

    #[test]
    fn test_save_rejects_duplicate_scope_title() {
        let settings = BlocksSettings::default();
        let mut store = MemoryFeatureStore::new();

        save_feature(&mut store, Feature::new("Foo", "foo", Scope::Size, ["CardMain"]), &settings)
            .unwrap();

        // Same title in another scope is fine
        save_feature(&mut store, Feature::new("Foo", "foo", Scope::Color, ["CardMain"]), &settings)
            .unwrap();

        let result = save_feature(
            &mut store,
            Feature::new("Foo", "bar", Scope::Size, ["HeroMain"]),
            &settings,
        );
        assert!(matches!(result, Err(FeatureError::Duplicate { .. })));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_save_updates_existing() {
        let settings = BlocksSettings::default();
        let mut store = MemoryFeatureStore::new();

        let mut feature = save_feature(
            &mut store,
            Feature::new("Foo", "foo", Scope::Size, ["CardMain"]),
            &settings,
        )
        .unwrap();

        feature.value = "foo-lg".to_string();
        save_feature(&mut store, feature.clone(), &settings).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(feature.id).unwrap().unwrap().value, "foo-lg");
    }
}
