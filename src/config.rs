//! Application configuration management.
//!
//! The only setting is where the cache database lives. It is resolved in
//! this order:
//!
//! 1. `--database` / `HASHCACHE_DATABASE`
//! 2. `database` in the platform config file (`config.json`)
//! 3. `~/.hashcache`

use anyhow::Result;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the default cache database in the home directory.
pub const DEFAULT_DATABASE_NAME: &str = ".hashcache";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Cache database location.
    #[serde(default)]
    pub database: Option<PathBuf>,
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    ///
    /// A missing, unreadable or malformed file yields the defaults.
    pub fn load() -> Self {
        match Self::config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load the configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Pick the database path, preferring an explicit CLI/env value.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is configured and no home directory can
    /// be determined.
    pub fn resolve_database(&self, cli_value: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = cli_value {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = &self.database {
            return Ok(path.clone());
        }
        default_database_path()
    }

    /// Get the default platform-specific configuration path.
    fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "hashcache")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}

/// `~/.hashcache`, or the platform equivalent of the home directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_database_path() -> Result<PathBuf> {
    let base_dirs =
        BaseDirs::new().ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))?;
    Ok(base_dirs.home_dir().join(DEFAULT_DATABASE_NAME))
}
