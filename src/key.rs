//! Cache key management.

use crate::identifier::SEPARATOR;

/// Builder for namespaced category cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Build the cache key of a category: `"{prefix}.{category}"`.
    pub fn build(prefix: &str, category: &str) -> String {
        format!("{}{}{}", prefix, SEPARATOR, category)
    }
}
