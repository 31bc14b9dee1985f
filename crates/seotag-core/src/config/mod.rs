//! Configuration management for SeoTag.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for SeoTag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Embedding model settings
    pub embedding: EmbeddingConfig,

    /// Tagging settings
    pub tagging: TaggingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Upload store settings
    pub store: StoreConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.seotag.seotag/config.toml
    /// - Linux: ~/.config/seotag/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\seotag\config\config.toml
    ///
    /// Falls back to ~/.seotag/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "seotag", "seotag")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".seotag").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        expand(&self.general.model_dir)
    }

    /// Directory holding the files of the configured model variant.
    pub fn model_variant_dir(&self) -> PathBuf {
        self.model_dir().join(&self.embedding.model)
    }

    /// Get the resolved cache directory path (with ~ expansion).
    pub fn cache_dir(&self) -> PathBuf {
        expand(&self.general.cache_dir)
    }

    /// Get the resolved upload directory path (with ~ expansion).
    pub fn upload_dir(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.store.upload_dir);
        PathBuf::from(expanded.into_owned())
    }

    /// Get the resolved custom vocabulary path, if one is configured.
    pub fn vocabulary_path(&self) -> Option<PathBuf> {
        self.tagging
            .vocabulary
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}
