//! Cache bridge - moves whole categories between the in-memory store and an
//! external cache service.
//!
//! The bridge never fails a settings operation. An unreachable cache, or an
//! entry that does not decode to a category, is logged, reported to the
//! metrics sink and treated as a miss. Undecodable entries are evicted so
//! the next write replaces them.

use crate::cache::CacheBackend;
use crate::config::DEFAULT_CACHE_ID;
use crate::error::{Error, Result};
use crate::identifier::is_valid_label;
use crate::key::CacheKeyBuilder;
use crate::observability::{CacheMetrics, NoOpMetrics, TtlPolicy};
use crate::serialization::{decode_category, encode_category};
use crate::store::SettingsStore;
use std::time::Instant;

/// Reads and writes categories under `"{cache_id}.{category}"` keys.
///
/// # Example
///
/// ```ignore
/// use settings_kit::bridge::CacheBridge;
/// use settings_kit::cache::InMemoryBackend;
/// use settings_kit::observability::TtlPolicy;
///
/// let bridge = CacheBridge::new(InMemoryBackend::new())
///     .with_cache_id("settingsCache")?
///     .with_ttl_policy(TtlPolicy::from_timeout(600));
/// ```
pub struct CacheBridge<C: CacheBackend> {
    backend: C,
    cache_id: String,
    ttl_policy: TtlPolicy,
    metrics: Box<dyn CacheMetrics>,
}

impl<C: CacheBackend> CacheBridge<C> {
    /// Create a bridge with the default cache id and TTL policy.
    pub fn new(backend: C) -> Self {
        CacheBridge {
            backend,
            cache_id: DEFAULT_CACHE_ID.to_string(),
            ttl_policy: TtlPolicy::default(),
            metrics: Box::new(NoOpMetrics),
        }
    }

    /// Set the key prefix.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCacheId` unless `cache_id` is a single label.
    pub fn with_cache_id(mut self, cache_id: impl Into<String>) -> Result<Self> {
        let cache_id = cache_id.into();
        if !is_valid_label(&cache_id) {
            return Err(Error::InvalidCacheId(cache_id));
        }
        self.cache_id = cache_id;
        Ok(self)
    }

    /// Set custom TTL policy.
    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn cache_id(&self) -> &str {
        &self.cache_id
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl_policy
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Cache key of `category`.
    pub fn key(&self, category: &str) -> String {
        CacheKeyBuilder::build(&self.cache_id, category)
    }

    /// Verify the cache service answers.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCacheComponent` if the health check fails.
    pub async fn verify(&self) -> Result<()> {
        match self.backend.health_check().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::InvalidCacheComponent(
                "cache service reported unhealthy".to_string(),
            )),
            Err(e) => Err(Error::InvalidCacheComponent(e.to_string())),
        }
    }

    /// Write the resident state of `category` to the cache.
    ///
    /// Returns `false` when the category is not resident, when the TTL policy
    /// disables caching, or when the write failed. With caching disabled any
    /// entry already under the key is deleted, since it may predate the
    /// resident state.
    pub async fn put(&self, store: &SettingsStore, category: &str) -> bool {
        let Some(settings) = store.category(category) else {
            return false;
        };

        let key = self.key(category);
        if !self.ttl_policy.allows_caching() {
            debug!("Settings cache disabled, dropping {}", key);
            if let Err(e) = self.backend.delete(&key).await {
                warn!("Failed to drop settings cache entry {}: {}", key, e);
                self.metrics.record_error(&key, &e.to_string());
            }
            return false;
        }

        let timer = Instant::now();
        let bytes = match encode_category(settings) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.metrics.record_error(&key, &e.to_string());
                return false;
            }
        };

        match self.backend.set(&key, bytes, self.ttl_policy.ttl()).await {
            Ok(()) => {
                self.metrics.record_set(&key, timer.elapsed());
                true
            }
            Err(e) => {
                warn!("Failed to cache settings category {}: {}", key, e);
                self.metrics.record_error(&key, &e.to_string());
                false
            }
        }
    }

    /// Make `category` resident from the cache.
    ///
    /// Returns `true` without contacting the cache when the category is
    /// already resident. On a cache hit the store is populated before
    /// returning.
    pub async fn fetch(&self, store: &mut SettingsStore, category: &str) -> bool {
        if store.contains(category) {
            return true;
        }

        let key = self.key(category);
        let timer = Instant::now();

        let bytes = match self.backend.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.metrics.record_miss(&key, timer.elapsed());
                return false;
            }
            Err(e) => {
                warn!("Settings cache unavailable for {}: {}", key, e);
                self.metrics.record_error(&key, &e.to_string());
                return false;
            }
        };

        match decode_category(&bytes) {
            Ok(settings) => {
                store.insert(category, settings);
                self.metrics.record_hit(&key, timer.elapsed());
                true
            }
            Err(e) => {
                warn!("Evicting unreadable settings cache entry {}: {}", key, e);
                self.metrics.record_error(&key, &e.to_string());
                if let Err(e) = self.backend.delete(&key).await {
                    warn!("Failed to evict settings cache entry {}: {}", key, e);
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryBackend;
    use crate::store::Category;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct CountingMetrics {
        hits: Arc<AtomicUsize>,
        misses: Arc<AtomicUsize>,
        errors: Arc<AtomicUsize>,
    }

    impl CacheMetrics for CountingMetrics {
        fn record_hit(&self, _key: &str, _duration: Duration) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        fn record_miss(&self, _key: &str, _duration: Duration) {
            self.misses.fetch_add(1, Ordering::SeqCst);
        }
        fn record_error(&self, _key: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn store_with_app() -> SettingsStore {
        let mut store = SettingsStore::new();
        let mut app = Category::new();
        app.insert("title".to_string(), json!("Demo"));
        store.insert("app", app);
        store
    }

    #[tokio::test]
    async fn test_put_then_fetch_in_fresh_store() {
        let backend = InMemoryBackend::new();
        let bridge = CacheBridge::new(backend.clone());

        assert!(bridge.put(&store_with_app(), "app").await);
        assert!(backend
            .exists("settings.app")
            .await
            .expect("Failed to check exists"));

        let mut fresh = SettingsStore::new();
        assert!(bridge.fetch(&mut fresh, "app").await);
        assert_eq!(fresh.value("app", "title"), Some(&json!("Demo")));
    }

    #[tokio::test]
    async fn test_put_requires_resident_category() {
        let backend = InMemoryBackend::new();
        let bridge = CacheBridge::new(backend.clone());

        assert!(!bridge.put(&SettingsStore::new(), "app").await);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_skipped_when_caching_disabled() {
        let backend = InMemoryBackend::new();
        let bridge =
            CacheBridge::new(backend.clone()).with_ttl_policy(TtlPolicy::from_timeout(0));

        assert!(!bridge.put(&store_with_app(), "app").await);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_drops_entry_when_caching_disabled() {
        let backend = InMemoryBackend::new();
        let writer = CacheBridge::new(backend.clone());
        assert!(writer.put(&store_with_app(), "app").await);

        let disabled =
            CacheBridge::new(backend.clone()).with_ttl_policy(TtlPolicy::Disabled);
        assert!(!disabled.put(&store_with_app(), "app").await);
        assert!(!backend
            .exists("settings.app")
            .await
            .expect("Failed to check exists"));
    }

    #[tokio::test]
    async fn test_fetch_short_circuits_resident_category() {
        let metrics = CountingMetrics::default();
        let bridge =
            CacheBridge::new(InMemoryBackend::new()).with_metrics(Box::new(metrics.clone()));

        let mut store = store_with_app();
        assert!(bridge.fetch(&mut store, "app").await);
        assert_eq!(metrics.hits.load(Ordering::SeqCst), 0);
        assert_eq!(metrics.misses.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_miss() {
        let metrics = CountingMetrics::default();
        let bridge =
            CacheBridge::new(InMemoryBackend::new()).with_metrics(Box::new(metrics.clone()));

        let mut store = SettingsStore::new();
        assert!(!bridge.fetch(&mut store, "app").await);
        assert!(store.is_empty());
        assert_eq!(metrics.misses.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_evicts_unreadable_entry() {
        let backend = InMemoryBackend::new();
        let metrics = CountingMetrics::default();
        let bridge = CacheBridge::new(backend.clone()).with_metrics(Box::new(metrics.clone()));

        backend
            .set("settings.app", b"not an envelope".to_vec(), None)
            .await
            .expect("Failed to set");

        let mut store = SettingsStore::new();
        assert!(!bridge.fetch(&mut store, "app").await);
        assert!(!store.contains("app"));
        assert_eq!(metrics.errors.load(Ordering::SeqCst), 1);
        assert!(!backend
            .exists("settings.app")
            .await
            .expect("Failed to check exists"));
    }

    #[tokio::test]
    async fn test_custom_cache_id() {
        let backend = InMemoryBackend::new();
        let bridge = CacheBridge::new(backend.clone())
            .with_cache_id("settingsCache")
            .expect("valid cache id");

        assert_eq!(bridge.key("mail.smtp"), "settingsCache.mail.smtp");
        assert!(bridge.put(&store_with_app(), "app").await);
        assert!(backend
            .exists("settingsCache.app")
            .await
            .expect("Failed to check exists"));
    }

    #[test]
    fn test_invalid_cache_id_rejected() {
        for bad in ["", "settings.cache", "1cache", "settings cache"] {
            match CacheBridge::new(InMemoryBackend::new()).with_cache_id(bad) {
                Err(Error::InvalidCacheId(id)) => assert_eq!(id, bad),
                Err(e) => panic!("Expected InvalidCacheId, got {:?}", e),
                Ok(_) => panic!("{:?} should be rejected", bad),
            }
        }
    }

    #[tokio::test]
    async fn test_verify_healthy_backend() {
        let bridge = CacheBridge::new(InMemoryBackend::new());
        assert!(bridge.verify().await.is_ok());
    }
}
