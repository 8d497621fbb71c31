//! Observability and TTL policy for the settings cache.
//!
//! # Metrics
//!
//! Implement [`CacheMetrics`] to feed cache behaviour into your monitoring
//! system. Every method receives the namespaced category key.
//!
//! ```ignore
//! use settings_kit::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("settings_cache_hits").inc();
//!     }
//! }
//!
//! // Settings::builder(storage).cache(backend).metrics(Box::new(PrometheusMetrics))
//! ```
//!
//! The default, [`NoOpMetrics`], records nothing.
//!
//! # TTL policies
//!
//! | Policy | `cache_timeout` | Effect |
//! |--------|-----------------|--------|
//! | `Fixed` | `> 0` | Entries expire after the timeout |
//! | `Infinite` | (explicit only) | Entries never expire |
//! | `Disabled` | `<= 0` | Categories are not written to the cache |

use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a category served from the cache.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Settings cache HIT: {} took {:?}", key, duration);
    }

    /// Record a category not found in the cache.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Settings cache MISS: {} took {:?}", key, duration);
    }

    /// Record a category written to the cache.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Settings cache SET: {} took {:?}", key, duration);
    }

    /// Record a cache failure (unreachable service, corrupt entry).
    fn record_error(&self, key: &str, error: &str) {
        warn!("Settings cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// TTL (Time-to-Live) policy for cached categories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TtlPolicy {
    /// Fixed duration for all categories
    Fixed(Duration),

    /// No TTL (entries live until overwritten or evicted)
    Infinite,

    /// Categories are never written to the cache
    Disabled,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        TtlPolicy::from_timeout(crate::config::DEFAULT_CACHE_TIMEOUT)
    }
}

impl TtlPolicy {
    /// Build the policy for a configured timeout in seconds.
    ///
    /// Non-positive timeouts are coerced to [`TtlPolicy::Disabled`].
    pub fn from_timeout(seconds: i64) -> Self {
        match u64::try_from(seconds) {
            Ok(secs) if secs > 0 => TtlPolicy::Fixed(Duration::from_secs(secs)),
            _ => TtlPolicy::Disabled,
        }
    }

    /// Whether categories may be written to the cache at all.
    pub fn allows_caching(&self) -> bool {
        !matches!(self, TtlPolicy::Disabled)
    }

    /// TTL to hand to the cache service.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            TtlPolicy::Fixed(d) => Some(*d),
            TtlPolicy::Infinite | TtlPolicy::Disabled => None,
        }
    }
}
