//! CLI configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! file, then `STOREFRONT_`-prefixed environment variables
//! (`STOREFRONT_API__BASE_URL`, `STOREFRONT_STORAGE__FILE`, ...).
//! `STOREFRONT_API_URL` is accepted as a shorthand for the base URL.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storefront_http::client::config::DEFAULT_BASE_URL;
use storefront_session::StorageKeys;
use storefront_session::config::{DEFAULT_ACCESS_TOKEN_KEY, DEFAULT_REFRESH_TOKEN_KEY};

/// Environment variable overriding the backend base URL
pub const API_URL_ENV: &str = "STOREFRONT_API_URL";

/// Main CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Backend configuration
    pub api: ApiConfig,

    /// Session storage configuration
    pub storage: StorageConfig,
}

/// Backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the auth backend
    pub base_url: String,

    /// Request timeout in seconds (0 = transport default)
    pub timeout_secs: u64,
}

/// Session storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Session file; defaults to `session.json` in the data directory
    pub file: Option<PathBuf>,

    pub access_key: String,

    pub refresh_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file: None,
            access_key: DEFAULT_ACCESS_TOKEN_KEY.to_string(),
            refresh_key: DEFAULT_REFRESH_TOKEN_KEY.to_string(),
        }
    }
}

impl StorageConfig {
    pub fn keys(&self) -> StorageKeys {
        StorageKeys {
            access: self.access_key.clone(),
            refresh: self.refresh_key.clone(),
        }
    }

    /// Session file, resolved against the data directory
    pub fn file_path(&self, data_dir: &Path) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| data_dir.join("session.json"))
    }
}

impl StorefrontConfig {
    /// Load configuration with defaults, an optional file and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value cannot be parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("storage.access_key", defaults.storage.access_key)?
            .set_default("storage.refresh_key", defaults.storage.refresh_key)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("STOREFRONT")
                .prefix_separator("_")
                .separator("__"),
        );

        if let Ok(base_url) = std::env::var(API_URL_ENV) {
            builder = builder.set_override("api.base_url", base_url)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}
