//! Where `config.toml` lives and how it is read and written
//!
//! A missing file is not an error: every section falls back to its
//! defaults, so a fresh machine runs without `config init`.

pub mod schema;

pub use schema::{CacheConfig, Config, GeneralConfig, LockConfig, StorageConfig};

use crate::error::{CacheError, CacheResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads and writes the TOML file behind a [`Config`]
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the per-user file at [`default_config_path`](Self::default_config_path)
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    /// Manager for the file at `path`, e.g. from `--config`
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// `<user config dir>/expiring-cache/config.toml`, or a relative path
    /// when the platform has no config dir
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("expiring-cache")
            .join("config.toml")
    }

    /// Current settings; defaults when the file does not exist
    pub fn load(&self) -> CacheResult<Config> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }
        self.load_from_file(&self.config_path)
    }

    /// Parse `path`; a malformed file is reported as [`CacheError::ConfigInvalid`]
    pub fn load_from_file(&self, path: &Path) -> CacheResult<Config> {
        let content = fs::read_to_string(path)
            .map_err(|e| CacheError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| CacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write `config`, creating the parent directory first
    pub fn save(&self, config: &Config) -> CacheResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::ConfigDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).map_err(|e| {
            CacheError::io(format!("writing config to {}", self.config_path.display()), e)
        })?;

        info!(path = %self.config_path.display(), "Wrote configuration");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
