//! Settings loading and data folder resolution
//!
//! Settings come from a single TOML file. Every field has a built-in default so a
//! missing or partial file never prevents startup.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`BLOCKS_CONFIG`)
//! 3. User config file (`<config dir>/cmsblocks/config.toml`)
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the settings file
pub const CONFIG_ENV_VAR: &str = "BLOCKS_CONFIG";

/// Environment variable naming the data folder (catalogue storage)
pub const ROOT_ENV_VAR: &str = "BLOCKS_ROOT";

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlocksSettings {
    /// Plugin names allowed on features, as `(key, label)` pairs
    ///
    /// Keys are matched as whole tokens, still they should not be a prefix of
    /// another key to keep the stored comma string readable.
    #[serde(default = "default_feature_plugins")]
    pub feature_plugins: Vec<PluginChoice>,

    /// Accept whitespace separated classes in feature values
    #[serde(default)]
    pub feature_allow_multiple_classes: bool,

    /// Image extensions accepted by uploads and mass upload
    #[serde(default = "default_allowed_image_extensions")]
    pub allowed_image_extensions: Vec<String>,

    /// Maximum size in bytes for a mass upload archive
    #[serde(default = "default_massupload_filesize_limit")]
    pub massupload_filesize_limit: u64,

    /// Root folder for catalogue storage (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A plugin allowed on features
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginChoice {
    pub key: String,
    pub label: String,
}

impl PluginChoice {
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path, written in addition to stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_feature_plugins() -> Vec<PluginChoice> {
    vec![
        PluginChoice::new("AlbumMain", "Album"),
        PluginChoice::new("AlbumItem", "Album item"),
        PluginChoice::new("CardMain", "Card"),
        PluginChoice::new("HeroMain", "Hero"),
        PluginChoice::new("ContainerMain", "Container"),
        PluginChoice::new("SliderMain", "Slider"),
        PluginChoice::new("SliderItem", "Slider item"),
    ]
}

fn default_allowed_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "svg", "gif", "png"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_massupload_filesize_limit() -> u64 {
    42_991_616 // ~41 MiB
}

impl Default for BlocksSettings {
    fn default() -> Self {
        Self {
            feature_plugins: default_feature_plugins(),
            feature_allow_multiple_classes: false,
            allowed_image_extensions: default_allowed_image_extensions(),
            massupload_filesize_limit: default_massupload_filesize_limit(),
            root_folder: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl BlocksSettings {
    /// Whether `name` is a known feature plugin key
    pub fn is_known_plugin(&self, name: &str) -> bool {
        self.feature_plugins.iter().any(|choice| choice.key == name)
    }

    /// Parse settings from TOML content
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Resolve the settings file and load it, falling back to defaults
    ///
    /// A missing file is not an error: a warning is logged and built-in
    /// defaults are used. A file that exists but does not parse is an error.
    pub fn resolve(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            Some(path) if path.exists() => {
                info!("Loading settings from {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    "Settings file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("No settings file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Resolve the data folder
    ///
    /// Priority: command-line argument, `BLOCKS_ROOT`, `root_folder` setting,
    /// then the OS data directory.
    pub fn resolve_root_folder(&self, cli_arg: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }

        if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.root_folder {
            return path.clone();
        }

        default_root_folder()
    }
}

/// Find the settings file path following the priority order
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("cmsblocks").join("config.toml"))
}

/// OS-dependent default data folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cmsblocks"))
        .unwrap_or_else(|| PathBuf::from("./cmsblocks_data"))
}

/// Write settings to a TOML file atomically (temp file + rename)
pub fn write_toml_config(settings: &BlocksSettings, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}
