//! Board configuration.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "laneboard.yml";

/// Board configuration stored in `laneboard.yml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardConfig {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseSettings,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSettings,
}

fn default_version() -> u32 {
    1
}

/// Where the SQLite database lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Path to the database file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("laneboard.db")
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Listen address of the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            version: 1,
            database: DatabaseSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl BoardConfig {
    /// Read a config file.
    ///
    /// # Errors
    /// Returns error if the file is missing or is not valid YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load an explicit config file, or `laneboard.yml` if it exists, or defaults.
    ///
    /// # Errors
    /// Returns error if an explicit path is missing or any file is invalid.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Serialize this config to YAML.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
