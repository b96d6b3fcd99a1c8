//! Configuration parsing and management.

use crate::store::{CatalogError, PhotoStore};
use album_types::Photo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable selecting the runtime mode.
pub const MODE_ENV_VAR: &str = "ALBUM_ENV";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid runtime mode: {0}. Must be one of: development, production, test")]
    InvalidMode(String),

    #[error("Failed to load photo catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Runtime mode. Controls whether internal error details reach clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
    Test,
}

impl RuntimeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeMode::Development => "development",
            RuntimeMode::Production => "production",
            RuntimeMode::Test => "test",
        }
    }

    pub fn exposes_error_details(self) -> bool {
        self == RuntimeMode::Development
    }

    /// Read the mode from `ALBUM_ENV`, defaulting to development when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(MODE_ENV_VAR) {
            Ok(value) => value.parse(),
            Err(_) => Ok(RuntimeMode::default()),
        }
    }
}

impl FromStr for RuntimeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "development" => Ok(RuntimeMode::Development),
            "production" => Ok(RuntimeMode::Production),
            "test" => Ok(RuntimeMode::Test),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main configuration struct matching the album.yml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    /// Inline catalog; takes precedence over `paths.catalog`
    #[serde(default)]
    pub photos: Option<Vec<Photo>>,

    /// Raw mode string, validated by [`Config::runtime_mode`]
    #[serde(default)]
    pub mode: Option<String>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    String::from("127.0.0.1:3000")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// JSON catalog of `{id, url}` records; the bundled catalog when absent
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    /// Static assets, including the SPA entry point `index.html`
    #[serde(default = "default_public_dir")]
    pub public: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            public: default_public_dir(),
        }
    }
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validated runtime mode from the file, defaulting to development.
    pub fn runtime_mode(&self) -> Result<RuntimeMode, ConfigError> {
        match &self.mode {
            Some(raw) => raw.parse(),
            None => Ok(RuntimeMode::default()),
        }
    }

    /// Get the catalog path, resolved relative to config file
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.paths.catalog.as_ref().map(|p| self.resolve_path(p))
    }

    /// Get the public directory, resolved relative to config file
    pub fn public_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.public)
    }

    /// Build the photo store: inline photos, then the catalog file, then the
    /// bundled catalog.
    pub fn load_store(&self) -> Result<PhotoStore, ConfigError> {
        let store = if let Some(photos) = &self.photos {
            PhotoStore::new(photos.clone())?
        } else if let Some(path) = self.catalog_path() {
            tracing::debug!(path = %path.display(), "loading photo catalog");
            PhotoStore::from_file(&path)?
        } else {
            PhotoStore::builtin()?
        };
        Ok(store)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_ref().and_then(|p| p.parent()) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}
