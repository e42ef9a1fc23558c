//! Error types for the autodiscover cache
//!
//! All modules use `CacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur in the cache
#[derive(Error, Debug)]
pub enum CacheError {
    // Lookup errors
    #[error("Domain not cached: {0}")]
    NotFound(String),

    // Storage errors
    #[error("Cache storage unavailable at {path}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Cache storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    // Connection errors
    #[error("Failed to build connection for {endpoint}: {reason}")]
    ConnectionFactory { endpoint: String, reason: String },

    #[error("Failed to close connection to {endpoint}: {reason}")]
    ConnectionClose { endpoint: String, reason: String },

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

    // General errors
    #[error("{0}")]
    User(String),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a connection close error
    pub fn close_failed(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::ConnectionClose {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if the error means "not cached"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound(_) => Some("Run: adcache list"),
            Self::StorageUnavailable { .. } => {
                Some("Another process may hold the cache; retry, or run: adcache clear")
            }
            Self::ConfigInvalid { .. } => Some("Run: adcache config init --force"),
            _ => None,
        }
    }
}
