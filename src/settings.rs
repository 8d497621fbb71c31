//! Settings facade - `get`, `set` and `delete` over categorised settings.
//!
//! A [`Settings`] instance owns one storage, an optional cache bridge and
//! the in-memory store of the categories it has loaded. Categories are
//! loaded lazily, as a whole, on first access:
//!
//! ```text
//! resident in memory? ──yes──> done
//!        │ no
//!        v
//! in the cache? ──yes──> insert into memory ──> done
//!        │ no
//!        v
//! storage.load ──found──> insert into memory ──> write to cache ──> done
//!        │ not found
//!        v
//! category does not exist
//! ```
//!
//! Mutations go to storage first; the in-memory store and the cache are
//! refreshed only when storage reports a change.

use crate::bridge::CacheBridge;
use crate::cache::{CacheBackend, InMemoryBackend};
use crate::config::{SettingsConfig, DEFAULT_CACHE_ID, DEFAULT_CACHE_TIMEOUT};
use crate::error::{Error, Result};
use crate::identifier::{is_valid_label, validate_category, SettingIdentifier};
use crate::observability::{CacheMetrics, TtlPolicy};
use crate::storage::{Storage, StorageBackend};
use crate::store::{Category, SettingsStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Key/value settings over a storage and an optional cache.
///
/// Operations take `&mut self`: one instance serves one caller at a time.
/// Share state between instances through the cache.
///
/// # Example
///
/// ```ignore
/// use settings_kit::{Settings, cache::InMemoryBackend, storage::FileStorage};
///
/// let mut settings = Settings::builder(FileStorage::new("/etc/app"))
///     .cache(InMemoryBackend::new())
///     .cache_timeout(600)
///     .build()
///     .await?;
///
/// let title = settings.get_or("app.title", "Untitled").await?;
/// ```
pub struct Settings<S: Storage, C: CacheBackend = InMemoryBackend> {
    storage: S,
    cache: Option<CacheBridge<C>>,
    store: SettingsStore,
}

impl<S: Storage> Settings<S> {
    /// Settings without a cache.
    pub fn new(storage: S) -> Self {
        Settings {
            storage,
            cache: None,
            store: SettingsStore::new(),
        }
    }

    /// Start building an instance over `storage`.
    pub fn builder(storage: S) -> SettingsBuilder<S> {
        SettingsBuilder::new(storage)
    }
}

impl<C: CacheBackend> Settings<StorageBackend, C> {
    /// Build an instance from configuration.
    ///
    /// # Arguments
    ///
    /// - `config`: storage selection and cache options
    /// - `cache`: cache service; `None` disables caching
    ///
    /// # Errors
    ///
    /// - `Error::InvalidCacheId`: `cache_id` is not a single label
    /// - `Error::InvalidCacheComponent`: the cache service is unhealthy
    /// - `Error::InvalidDbComponent`: the database cannot be reached
    /// - `Error::InvalidDbTable`: requested table creation failed
    /// - `Error::ConfigError`: other invalid configuration values
    pub async fn from_config(config: &SettingsConfig, cache: Option<C>) -> Result<Self> {
        config.validate()?;
        let storage = StorageBackend::from_config(&config.storage).await?;

        SettingsBuilder {
            storage,
            cache,
            cache_id: config.cache_id.clone(),
            ttl_policy: TtlPolicy::from_timeout(config.cache_timeout),
            metrics: None,
        }
        .build()
        .await
    }
}

impl<S: Storage, C: CacheBackend> Settings<S, C> {
    /// Make `category` resident.
    ///
    /// Returns `false` when the category exists nowhere. A resident
    /// category returns immediately without touching cache or storage.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidName`: `category` does not satisfy the label grammar
    /// - `Error::NonExistentCategory`: the category source is malformed
    /// - `Error::DatabaseError`: storage query failed
    pub async fn load(&mut self, category: &str) -> Result<bool> {
        validate_category(category)?;

        if self.store.contains(category) || self.fetch_cached(category).await {
            return Ok(true);
        }

        match self.storage.load(category).await? {
            Some(settings) => {
                debug!(
                    "✓ Category {} loaded from {} storage",
                    category,
                    self.storage.kind()
                );
                self.store.insert(category, settings);
                self.cache_category(category).await;
                Ok(true)
            }
            None => {
                debug!("Category {} not found in {} storage", category, self.storage.kind());
                Ok(false)
            }
        }
    }

    /// Value of setting `name`, or `None` when the category or the setting
    /// does not exist.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidName`: malformed identifier (no storage or cache access)
    /// - Storage errors from [`Settings::load`]
    pub async fn get(&mut self, name: &str) -> Result<Option<Value>> {
        let id = SettingIdentifier::parse(name)?;

        if !self.load(&id.category).await? {
            return Ok(None);
        }
        Ok(self.store.value(&id.category, &id.name).cloned())
    }

    /// Value of setting `name`, or `default` when it does not exist.
    pub async fn get_or(&mut self, name: &str, default: impl Into<Value>) -> Result<Value> {
        match self.get(name).await? {
            Some(value) => Ok(value),
            None => Ok(default.into()),
        }
    }

    /// Value of setting `name` deserialized into `T`.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeserializationError` if the stored value does not fit `T`.
    pub async fn get_as<T: DeserializeOwned>(&mut self, name: &str) -> Result<Option<T>> {
        match self.get(name).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::DeserializationError(format!("{}: {}", name, e))),
            None => Ok(None),
        }
    }

    /// All settings of `category`, or `None` when it does not exist.
    pub async fn category(&mut self, category: &str) -> Result<Option<&Category>> {
        if !self.load(category).await? {
            return Ok(None);
        }
        Ok(self.store.category(category))
    }

    /// Store `value` under setting `name`.
    ///
    /// The existing row is updated when the setting is already known,
    /// otherwise a new one is inserted. Returns whether storage reported a
    /// change; memory and cache are refreshed only then.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidName`: malformed identifier
    /// - `Error::ReadOnly`: the storage does not accept writes
    /// - `Error::SerializationError`: `value` cannot be represented as JSON
    /// - `Error::DatabaseError`: storage write failed
    pub async fn set<V: Serialize>(&mut self, name: &str, value: V) -> Result<bool> {
        let id = SettingIdentifier::parse(name)?;
        if self.storage.is_read_only() {
            return Err(Error::ReadOnly(name.to_string()));
        }

        let value = serde_json::to_value(value)
            .map_err(|e| Error::SerializationError(format!("{}: {}", name, e)))?;

        self.load(&id.category).await?;
        let exists = self.store.value(&id.category, &id.name).is_some();

        if !self.storage.persist(&id, &value, exists).await? {
            debug!("Setting {} unchanged in {} storage", id, self.storage.kind());
            return Ok(false);
        }

        self.store.put_value(&id.category, &id.name, value);
        self.cache_category(&id.category).await;
        Ok(true)
    }

    /// Remove setting `name`.
    ///
    /// Returns whether a stored setting was removed.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidName`: malformed identifier
    /// - `Error::ReadOnly`: the storage does not accept writes
    /// - `Error::DatabaseError`: storage delete failed
    pub async fn delete(&mut self, name: &str) -> Result<bool> {
        let id = SettingIdentifier::parse(name)?;
        if self.storage.is_read_only() {
            return Err(Error::ReadOnly(name.to_string()));
        }

        self.load(&id.category).await?;

        if !self.storage.remove(&id).await? {
            debug!("Setting {} not present in {} storage", id, self.storage.kind());
            return Ok(false);
        }

        self.store.remove_value(&id.category, &id.name);
        self.cache_category(&id.category).await;
        Ok(true)
    }

    /// Drop the resident copy of `category`.
    ///
    /// The next access consults the cache and storage again, which picks up
    /// changes made through other instances.
    pub fn forget(&mut self, category: &str) -> bool {
        self.store.forget(category).is_some()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn cache(&self) -> Option<&CacheBridge<C>> {
        self.cache.as_ref()
    }

    /// Categories currently resident in memory.
    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    async fn fetch_cached(&mut self, category: &str) -> bool {
        match &self.cache {
            Some(bridge) => bridge.fetch(&mut self.store, category).await,
            None => false,
        }
    }

    async fn cache_category(&self, category: &str) -> bool {
        match &self.cache {
            Some(bridge) => bridge.put(&self.store, category).await,
            None => false,
        }
    }
}

/// Builder for [`Settings`].
///
/// The cache id is validated and the cache service health-checked in
/// [`SettingsBuilder::build`].
pub struct SettingsBuilder<S: Storage, C: CacheBackend = InMemoryBackend> {
    storage: S,
    cache: Option<C>,
    cache_id: String,
    ttl_policy: TtlPolicy,
    metrics: Option<Box<dyn CacheMetrics>>,
}

impl<S: Storage> SettingsBuilder<S> {
    pub fn new(storage: S) -> Self {
        SettingsBuilder {
            storage,
            cache: None,
            cache_id: DEFAULT_CACHE_ID.to_string(),
            ttl_policy: TtlPolicy::from_timeout(DEFAULT_CACHE_TIMEOUT),
            metrics: None,
        }
    }
}

impl<S: Storage, C: CacheBackend> SettingsBuilder<S, C> {
    /// Cache categories in `backend`.
    pub fn cache<B: CacheBackend>(self, backend: B) -> SettingsBuilder<S, B> {
        SettingsBuilder {
            storage: self.storage,
            cache: Some(backend),
            cache_id: self.cache_id,
            ttl_policy: self.ttl_policy,
            metrics: self.metrics,
        }
    }

    /// Prefix of cache keys (default `"settings"`).
    pub fn cache_id(mut self, cache_id: impl Into<String>) -> Self {
        self.cache_id = cache_id.into();
        self
    }

    /// Lifetime of cached categories in seconds. Non-positive values
    /// disable cache writes.
    pub fn cache_timeout(mut self, seconds: i64) -> Self {
        self.ttl_policy = TtlPolicy::from_timeout(seconds);
        self
    }

    pub fn ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    pub fn metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// # Errors
    ///
    /// - `Error::InvalidCacheId`: the cache id is not a single label
    /// - `Error::InvalidCacheComponent`: the cache service is unhealthy
    pub async fn build(self) -> Result<Settings<S, C>> {
        if !is_valid_label(&self.cache_id) {
            return Err(Error::InvalidCacheId(self.cache_id));
        }

        let cache = match self.cache {
            Some(backend) => {
                let mut bridge = CacheBridge::new(backend)
                    .with_cache_id(self.cache_id)?
                    .with_ttl_policy(self.ttl_policy);
                if let Some(metrics) = self.metrics {
                    bridge = bridge.with_metrics(metrics);
                }
                bridge.verify().await?;
                info!(
                    "✓ Settings over {} storage, cached under {}",
                    self.storage.kind(),
                    bridge.cache_id()
                );
                Some(bridge)
            }
            None => {
                info!("✓ Settings over {} storage, uncached", self.storage.kind());
                None
            }
        };

        Ok(Settings {
            storage: self.storage,
            cache,
            store: SettingsStore::new(),
        })
    }
}
