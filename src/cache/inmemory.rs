//! Process-local cache service.
//!
//! Holds encoded categories in a DashMap keyed by `"{cache_id}.{category}"`.
//! Clones share the map, so every settings instance built on a clone sees
//! the categories the others cached. Entries past their TTL are dropped the
//! next time they are read.

use super::CacheBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Slot {
    bytes: Vec<u8>,
    deadline: Option<Instant>,
}

impl Slot {
    fn live(&self, now: Instant) -> bool {
        self.deadline.map_or(true, |deadline| now <= deadline)
    }
}

/// Cache service shared by settings instances in one process.
///
/// # Example
///
/// ```no_run
/// use settings_kit::cache::InMemoryBackend;
/// use settings_kit::storage::FileStorage;
/// use settings_kit::Settings;
///
/// #[tokio::main]
/// async fn main() -> settings_kit::Result<()> {
///     let cache = InMemoryBackend::new();
///     let mut first = Settings::builder(FileStorage::new("config"))
///         .cache(cache.clone())
///         .build()
///         .await?;
///     first.get("app.title").await?;
///
///     // Served from `cache` without reading config/app.json again.
///     let mut second = Settings::builder(FileStorage::new("config"))
///         .cache(cache)
///         .build()
///         .await?;
///     second.get("app.title").await?;
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    slots: Arc<DashMap<String, Slot>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached categories, expired ones not yet dropped included.
    pub async fn len(&self) -> usize {
        self.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Snapshot of what the cache currently holds.
    pub async fn stats(&self) -> CacheStats {
        let now = Instant::now();
        self.slots
            .iter()
            .fold(CacheStats::default(), |mut stats, slot| {
                if slot.live(now) {
                    stats.categories += 1;
                    stats.bytes += slot.bytes.len();
                } else {
                    stats.expired += 1;
                }
                stats
            })
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let hit = self
            .slots
            .get(key)
            .filter(|slot| slot.live(now))
            .map(|slot| slot.bytes.clone());

        match hit {
            Some(bytes) => {
                trace!("cache hit {}", key);
                Ok(Some(bytes))
            }
            None => {
                self.slots.remove_if(key, |_, slot| !slot.live(now));
                trace!("cache miss {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let slot = Slot {
            bytes: value,
            deadline: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.slots.insert(key.to_string(), slot);
        trace!("cached {} (ttl {:?})", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.slots.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        Ok(self.slots.get(key).is_some_and(|slot| slot.live(now)))
    }

    async fn clear_all(&self) -> Result<()> {
        let dropped = self.slots.len();
        self.slots.clear();
        warn!("Dropped {} cached settings categories", dropped);
        Ok(())
    }
}

/// Counts reported by [`InMemoryBackend::stats`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Live categories.
    pub categories: usize,
    /// Entries past their TTL that no read has dropped yet.
    pub expired: usize,
    /// Encoded size of the live categories.
    pub bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{decode_category, encode_category};
    use crate::store::Category;
    use serde_json::json;

    fn app() -> Category {
        let mut app = Category::new();
        app.insert("title".to_string(), json!("Demo"));
        app.insert("debug".to_string(), json!(true));
        app
    }

    #[tokio::test]
    async fn test_cached_category_reads_back() {
        let cache = InMemoryBackend::new();
        let bytes = encode_category(&app()).expect("Failed to encode");

        cache
            .set("settings.app", bytes, None)
            .await
            .expect("Failed to set");

        let cached = cache
            .get("settings.app")
            .await
            .expect("Failed to get")
            .expect("Category not cached");
        assert_eq!(decode_category(&cached).expect("Failed to decode"), app());
        assert_eq!(cache.get("settings.mail").await.expect("Failed to get"), None);
    }

    #[tokio::test]
    async fn test_delete_drops_category() {
        let cache = InMemoryBackend::new();
        cache
            .set("settings.app", b"app".to_vec(), None)
            .await
            .expect("Failed to set");

        cache.delete("settings.app").await.expect("Failed to delete");
        assert!(!cache
            .exists("settings.app")
            .await
            .expect("Failed to check exists"));
        // Deleting twice is not an error.
        cache.delete("settings.app").await.expect("Failed to delete");
    }

    #[tokio::test]
    async fn test_expired_category_dropped_on_read() {
        let cache = InMemoryBackend::new();
        cache
            .set("settings.app", b"app".to_vec(), Some(Duration::from_millis(50)))
            .await
            .expect("Failed to set");
        assert!(cache
            .exists("settings.app")
            .await
            .expect("Failed to check exists"));

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(
            cache.stats().await,
            CacheStats {
                categories: 0,
                expired: 1,
                bytes: 0
            }
        );
        assert!(cache.get("settings.app").await.expect("Failed to get").is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_stats_count_live_categories() {
        let cache = InMemoryBackend::new();
        cache
            .set("settings.app", b"0123456789".to_vec(), None)
            .await
            .expect("Failed to set");
        cache
            .set("settingsCache.mail.smtp", b"01234".to_vec(), None)
            .await
            .expect("Failed to set");

        assert_eq!(
            cache.stats().await,
            CacheStats {
                categories: 2,
                expired: 0,
                bytes: 15
            }
        );
    }

    #[tokio::test]
    async fn test_clones_share_categories() {
        let cache = InMemoryBackend::new();
        let other = cache.clone();
        other
            .set("settings.app", b"app".to_vec(), None)
            .await
            .expect("Failed to set");

        assert_eq!(cache.len().await, 1);
        cache.clear_all().await.expect("Failed to clear");
        assert!(other.is_empty().await);
    }
}
