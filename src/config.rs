//! Configuration surface for [`Settings`](crate::Settings).
//!
//! A configuration is usually deserialized from JSON:
//!
//! ```json
//! {
//!     "cache_id": "settingsCache",
//!     "cache_timeout": 600,
//!     "storage": {
//!         "kind": "database",
//!         "url": "sqlite://settings.db?mode=rwc",
//!         "table_name": "app_settings",
//!         "create_table": true
//!     }
//! }
//! ```
//!
//! Environment variables take precedence when
//! [`SettingsConfig::apply_env_overrides`] is called:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SETTINGS_CACHE_ID` | `cache_id` |
//! | `SETTINGS_CACHE_TIMEOUT` | `cache_timeout` |
//! | `SETTINGS_DATABASE_URL` | `storage.url` (database storage only) |

use crate::error::{Error, Result};
use crate::identifier::is_valid_label;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default prefix of cache keys.
pub const DEFAULT_CACHE_ID: &str = "settings";

/// Default lifetime of cached categories, in seconds.
pub const DEFAULT_CACHE_TIMEOUT: i64 = 3600;

#[cfg(feature = "database")]
const DEFAULT_MAX_CONNECTIONS: u32 = crate::storage::database::DEFAULT_MAX_CONNECTIONS;

fn default_cache_id() -> String {
    DEFAULT_CACHE_ID.to_string()
}

fn default_cache_timeout() -> i64 {
    DEFAULT_CACHE_TIMEOUT
}

#[cfg(feature = "database")]
fn default_table_name() -> String {
    crate::storage::database::DEFAULT_TABLE_NAME.to_string()
}

#[cfg(feature = "database")]
fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

/// Settings instance configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsConfig {
    /// Prefix of cache keys; must be a single label.
    #[serde(default = "default_cache_id")]
    pub cache_id: String,

    /// Lifetime of cached categories in seconds. Non-positive values
    /// disable cache writes.
    #[serde(default = "default_cache_timeout")]
    pub cache_timeout: i64,

    pub storage: StorageConfig,
}

/// Storage selection.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Read-only JSON files under `root`.
    File { root: PathBuf },

    /// Read-write SQL table.
    #[cfg(feature = "database")]
    Database {
        url: String,
        #[serde(default = "default_table_name")]
        table_name: String,
        #[serde(default)]
        create_table: bool,
        /// Pool size. Ignored for in-memory SQLite URLs, which always use a
        /// single connection.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

impl StorageConfig {
    pub fn file(root: impl Into<PathBuf>) -> Self {
        StorageConfig::File { root: root.into() }
    }

    /// Database storage with default table options.
    #[cfg(feature = "database")]
    pub fn database(url: impl Into<String>) -> Self {
        StorageConfig::Database {
            url: url.into(),
            table_name: default_table_name(),
            create_table: false,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl SettingsConfig {
    /// Configuration with default cache settings.
    pub fn new(storage: StorageConfig) -> Self {
        SettingsConfig {
            cache_id: default_cache_id(),
            cache_timeout: default_cache_timeout(),
            storage,
        }
    }

    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("invalid settings configuration: {}", e)))
    }

    /// Read and parse a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Override fields from `SETTINGS_*` environment variables.
    ///
    /// Unparsable values are logged and ignored.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(cache_id) = std::env::var("SETTINGS_CACHE_ID") {
            self.cache_id = cache_id;
        }

        if let Ok(timeout) = std::env::var("SETTINGS_CACHE_TIMEOUT") {
            match timeout.parse() {
                Ok(timeout) => self.cache_timeout = timeout,
                Err(_) => warn!("Ignoring invalid SETTINGS_CACHE_TIMEOUT {:?}", timeout),
            }
        }

        #[cfg(feature = "database")]
        if let Ok(database_url) = std::env::var("SETTINGS_DATABASE_URL") {
            if let StorageConfig::Database { url, .. } = &mut self.storage {
                *url = database_url;
            }
        }

        self
    }

    /// Check the values that can be checked without I/O.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidCacheId`: `cache_id` is not a single label
    /// - `Error::ConfigError`: empty database url or invalid table name
    pub fn validate(&self) -> Result<()> {
        if !is_valid_label(&self.cache_id) {
            return Err(Error::InvalidCacheId(self.cache_id.clone()));
        }

        match &self.storage {
            StorageConfig::File { .. } => Ok(()),
            #[cfg(feature = "database")]
            StorageConfig::Database { url, .. } if url.trim().is_empty() => Err(
                Error::ConfigError("database storage requires a url".to_string()),
            ),
            #[cfg(feature = "database")]
            StorageConfig::Database { .. } => Ok(()),
        }
    }
}
