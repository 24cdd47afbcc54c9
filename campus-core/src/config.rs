//! Portal configuration
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (CAMPUS_*)
//! 3. Config file (~/.config/campus/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::certificate::DEFAULT_MAX_CERTIFICATE_BYTES;
use crate::{Error, Result};

/// Database configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file; the platform data directory is used when unset
    pub path: Option<PathBuf>,
}

/// Certificate storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Object store root; defaults to `storage/` beside the database
    pub root: Option<PathBuf>,

    /// Largest accepted certificate upload
    pub max_certificate_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_certificate_bytes: DEFAULT_MAX_CERTIFICATE_BYTES,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/campus/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("campus").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - CAMPUS_DB_PATH: SQLite database file
    /// - CAMPUS_STORAGE_ROOT: certificate storage directory
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("CAMPUS_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(root) = std::env::var("CAMPUS_STORAGE_ROOT") {
            self.storage.root = Some(PathBuf::from(root));
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, db_path: Option<PathBuf>) -> Self {
        if let Some(path) = db_path {
            self.database.path = Some(path);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(db_path: Option<PathBuf>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(db_path))
    }

    /// Resolved database path
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.path.clone().or_else(|| {
            dirs::data_dir().map(|dir| dir.join("campus").join("campus.db"))
        })
    }

    /// Resolved certificate storage root
    pub fn storage_root(&self) -> Option<PathBuf> {
        if let Some(root) = &self.storage.root {
            return Some(root.clone());
        }
        self.database_path()
            .and_then(|db| db.parent().map(|dir| dir.join("storage")))
    }

    fn validate(&self) -> Result<()> {
        if self.storage.max_certificate_bytes == 0 {
            return Err(Error::Config(
                "storage.max_certificate_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
