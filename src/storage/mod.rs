//! Persistence strategies for settings categories.
//!
//! A [`Storage`] is the source of truth behind the cache: it loads whole
//! categories and, when writable, persists individual settings.
//!
//! - [`FileStorage`]: one JSON file per category, read-only.
//! - [`DatabaseStorage`]: one row per setting in a SQL table, read-write
//!   (`database` feature).
//!
//! [`StorageBackend`] is the closed set of both, selected from
//! [`StorageConfig`] at construction time.
//!
//! # Error Handling
//!
//! Implementations return `Ok(None)` / `Ok(false)` for absence and reserve
//! `Err` for malformed sources, refused mutations and executor failures.

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::identifier::SettingIdentifier;
use crate::store::Category;
use serde_json::Value;

#[cfg(feature = "database")]
pub mod database;
pub mod file;

#[cfg(feature = "database")]
pub use database::{DatabaseOptions, DatabaseStorage};
pub use file::FileStorage;

/// Trait for settings persistence strategies.
///
/// Methods take `&self`; the settings facade serialises calls on one
/// instance, and connection handles are shared through interior mutability.
#[allow(async_fn_in_trait)]
pub trait Storage: Send + Sync {
    /// Short name used in log lines.
    fn kind(&self) -> &'static str;

    /// Whether `persist` and `remove` always refuse.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Load every setting of `category`.
    ///
    /// # Returns
    /// - `Ok(Some(category))` - Category found (possibly empty)
    /// - `Ok(None)` - Category not found (not an error)
    ///
    /// # Errors
    /// Returns `Err` if the source is malformed or cannot be queried
    async fn load(&self, category: &str) -> Result<Option<Category>>;

    /// Write one setting. `exists` tells whether the setting is already
    /// stored, as observed in the freshly loaded category.
    ///
    /// Returns whether the write changed anything.
    ///
    /// # Errors
    /// Returns `Err` if the storage is read-only or the write fails
    async fn persist(&self, id: &SettingIdentifier, value: &Value, exists: bool) -> Result<bool>;

    /// Delete one setting. Returns whether a setting was removed.
    ///
    /// # Errors
    /// Returns `Err` if the storage is read-only or the delete fails
    async fn remove(&self, id: &SettingIdentifier) -> Result<bool>;
}

/// Storage selected by configuration.
pub enum StorageBackend {
    File(FileStorage),
    #[cfg(feature = "database")]
    Database(DatabaseStorage),
}

impl StorageBackend {
    /// Build the storage described by `config`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDbComponent`: the database cannot be reached
    /// - `Error::InvalidDbTable`: requested table creation failed
    /// - `Error::ConfigError`: invalid table name
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        match config {
            StorageConfig::File { root } => Ok(StorageBackend::File(FileStorage::new(root))),
            #[cfg(feature = "database")]
            StorageConfig::Database {
                url,
                table_name,
                create_table,
                max_connections,
            } => {
                let options = DatabaseOptions::new()
                    .with_table_name(table_name.clone())
                    .with_create_table(*create_table);
                let storage = DatabaseStorage::connect_with(url, *max_connections, options).await?;
                Ok(StorageBackend::Database(storage))
            }
        }
    }
}

impl Storage for StorageBackend {
    fn kind(&self) -> &'static str {
        match self {
            StorageBackend::File(storage) => storage.kind(),
            #[cfg(feature = "database")]
            StorageBackend::Database(storage) => storage.kind(),
        }
    }

    fn is_read_only(&self) -> bool {
        match self {
            StorageBackend::File(storage) => storage.is_read_only(),
            #[cfg(feature = "database")]
            StorageBackend::Database(storage) => storage.is_read_only(),
        }
    }

    async fn load(&self, category: &str) -> Result<Option<Category>> {
        match self {
            StorageBackend::File(storage) => storage.load(category).await,
            #[cfg(feature = "database")]
            StorageBackend::Database(storage) => storage.load(category).await,
        }
    }

    async fn persist(&self, id: &SettingIdentifier, value: &Value, exists: bool) -> Result<bool> {
        match self {
            StorageBackend::File(storage) => storage.persist(id, value, exists).await,
            #[cfg(feature = "database")]
            StorageBackend::Database(storage) => storage.persist(id, value, exists).await,
        }
    }

    async fn remove(&self, id: &SettingIdentifier) -> Result<bool> {
        match self {
            StorageBackend::File(storage) => storage.remove(id).await,
            #[cfg(feature = "database")]
            StorageBackend::Database(storage) => storage.remove(id).await,
        }
    }
}

pub(crate) fn read_only(id: &SettingIdentifier) -> Error {
    Error::ReadOnly(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_storage_backend_from_file_config() {
        let config = StorageConfig::File {
            root: PathBuf::from("/nonexistent/settings"),
        };
        let storage = StorageBackend::from_config(&config)
            .await
            .expect("file storage needs no I/O");

        assert_eq!(storage.kind(), "file");
        assert!(storage.is_read_only());
        assert!(storage.load("app").await.expect("load").is_none());
    }

    #[cfg(feature = "database")]
    #[tokio::test]
    async fn test_storage_backend_from_database_config() {
        let config = StorageConfig::Database {
            url: "sqlite::memory:".to_string(),
            table_name: "settings".to_string(),
            create_table: true,
            max_connections: 1,
        };
        let storage = StorageBackend::from_config(&config)
            .await
            .expect("in-memory database");

        assert_eq!(storage.kind(), "database");
        assert!(!storage.is_read_only());

        let id = SettingIdentifier::parse("ui.theme").expect("valid identifier");
        assert!(storage
            .persist(&id, &Value::from("dark"), false)
            .await
            .expect("insert"));
        let ui = storage.load("ui").await.expect("load").expect("category");
        assert_eq!(ui.get("theme"), Some(&Value::from("dark")));
    }
}
