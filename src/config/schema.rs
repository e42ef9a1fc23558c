//! Configuration schema for the autodiscover cache
//!
//! Configuration is stored at `~/.config/autodiscover-cache/config.toml`

use crate::store::identity::FALLBACK_USER;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Persistent cache settings
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

/// Persistent cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the cache file (default: system temp directory)
    pub directory: Option<PathBuf>,

    /// User name substituted when the invoking user cannot be determined
    pub fallback_user: String,

    /// How long to wait on a store locked by another process
    pub busy_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            fallback_user: FALLBACK_USER.to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

impl CacheConfig {
    /// Directory the cache file lives in
    pub fn directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(std::env::temp_dir)
    }
}
