//! Error types for expiring-cache
//!
//! All modules use `CacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur in expiring-cache
#[derive(Error, Debug)]
pub enum CacheError {
    // Lock errors
    #[error("Timed out after {wait_ms}ms waiting for lock {name}")]
    LockTimeout { name: String, wait_ms: u128 },

    #[error("Advisory file locks are not supported on {0}")]
    LockUnsupported(String),

    // Storage errors
    #[error("Persistent cache requires a storage name")]
    MissingStorageName,

    #[error("Invalid storage name: {0:?}")]
    InvalidStorageName(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a lock timeout error
    pub fn lock_timeout(name: impl Into<String>, wait: std::time::Duration) -> Self {
        Self::LockTimeout {
            name: name.into(),
            wait_ms: wait.as_millis(),
        }
    }

    /// Check if the caller may reasonably retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::LockTimeout { .. } => {
                Some("Another process holds the lock; retry or raise --wait-ms")
            }
            Self::MissingStorageName => Some("Pass --name or set EXPIRING_CACHE_NAME"),
            Self::ConfigInvalid { .. } => Some("Run: expiring-cache config init --force"),
            _ => None,
        }
    }
}
