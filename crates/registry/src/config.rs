use std::fs;
use std::path::{Path, PathBuf};

use datacube_util::{config_file_path, expand_tilde};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::catalog::FlowCatalog;
use crate::source::{FileCatalogSource, StaticCatalogSource};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "DATACUBE_CONFIG_PATH";

/// Default config file name under the config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted SDK settings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// JSON file of flow records; the built-in list is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
}

impl SdkConfig {
    /// Loads the config from its default location.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is
    /// logged and also yields the defaults.
    pub fn load() -> Self {
        let path = default_config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Builds an unloaded catalog from the configured source.
    pub fn catalog(&self) -> FlowCatalog {
        match self.catalog_path.as_deref().map(str::trim).filter(|path| !path.is_empty()) {
            Some(path) => FlowCatalog::new(FileCatalogSource::new(expand_tilde(path))),
            None => FlowCatalog::new(StaticCatalogSource::builtin()),
        }
    }
}

/// Get the default path for the SDK configuration file.
pub fn default_config_path() -> PathBuf {
    config_file_path(CONFIG_PATH_ENV, CONFIG_FILE_NAME)
}
