//! Configuration schema for expiring-cache
//!
//! Configuration is stored at `~/.config/expiring-cache/config.toml`

use crate::lock::{LockOptions, DEFAULT_HOLD_MS, DEFAULT_WAIT_MS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Storage directory used when none is configured, relative to the
/// working directory
pub const DEFAULT_STORAGE_DIR: &str = ".expiring-cache";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Lock timing and placement
    pub lock: LockConfig,

    /// Persistent map storage
    pub storage: StorageConfig,

    /// Cache defaults
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Lock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Maximum time a lock is held before auto-release, in milliseconds
    pub hold_ms: u64,

    /// Maximum time to wait for a lock, in milliseconds
    pub wait_ms: u64,

    /// Lock file directory (default: platform temp directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            hold_ms: DEFAULT_HOLD_MS,
            wait_ms: DEFAULT_WAIT_MS,
            dir: None,
        }
    }
}

impl LockConfig {
    /// Resolve into lock options
    pub fn options(&self) -> LockOptions {
        LockOptions::new(
            Duration::from_millis(self.hold_ms),
            Duration::from_millis(self.wait_ms),
            self.dir.clone().unwrap_or_else(std::env::temp_dir),
        )
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `<name>.json` map files
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied by `set` when none is given (absent = never expires)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ttl_ms: Option<u64>,
}
