//! Encoding of categories for the cache and of values for storage.
//!
//! # Cache entries
//!
//! Every cached category is wrapped in a versioned envelope:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (varint) │ POSTCARD PAYLOAD (N bytes)   │
//! └─────────────────┴─────────────────┴──────────────────────────────┘
//!   "STNG"              u32               BTreeMap<name, JSON text>
//! ```
//!
//! Postcard is not self-describing, so values (arbitrary JSON) are carried
//! as JSON text inside the payload, the same text the database storage
//! keeps in its `value` column.
//!
//! # Stored values
//!
//! [`encode_value`] / [`decode_value`] convert between a [`Value`] and its
//! JSON text. Anything written by `encode_value` round-trips through
//! `decode_value`.
//!
//! ```rust
//! use settings_kit::serialization::{decode_category, encode_category};
//! use settings_kit::Category;
//! use serde_json::json;
//!
//! # fn main() -> settings_kit::Result<()> {
//! let mut category = Category::new();
//! category.insert("title".to_string(), json!("Demo"));
//!
//! let bytes = encode_category(&category)?;
//! assert_eq!(&bytes[0..4], b"STNG");
//! assert_eq!(decode_category(&bytes)?, category);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::store::Category;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Magic header for cached categories: b"STNG"
pub const CACHE_MAGIC: [u8; 4] = *b"STNG";

/// Current envelope version.
///
/// Increment when the payload layout changes. Entries with another version
/// are evicted and reloaded from storage.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope for cache entries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    /// Magic header: must be b"STNG"
    pub magic: [u8; 4],
    /// Envelope version: must match CURRENT_SCHEMA_VERSION
    pub version: u32,
    /// The cached category
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    /// Create a new envelope with current magic and version.
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Serialize a setting value to the JSON text kept in storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if the value cannot be rendered.
pub fn encode_value(value: &Value) -> Result<String> {
    serde_json::to_string(value).map_err(|e| {
        log::error!("Setting value serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Parse the JSON text of a stored setting value.
///
/// # Errors
///
/// Returns `Error::DeserializationError` if the text is not valid JSON.
pub fn decode_value(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| {
        log::error!("Setting value deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })
}

/// Serialize a whole category with envelope for cache storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if a value or the envelope cannot be
/// encoded.
pub fn encode_category(category: &Category) -> Result<Vec<u8>> {
    let payload = category
        .iter()
        .map(|(name, value)| Ok((name.as_str(), encode_value(value)?)))
        .collect::<Result<BTreeMap<&str, String>>>()?;

    postcard::to_allocvec(&CacheEnvelope::new(payload)).map_err(|e| {
        log::error!("Category serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Deserialize a cached category with validation.
///
/// # Errors
///
/// - `Error::InvalidCacheEntry`: Invalid magic header
/// - `Error::VersionMismatch`: Envelope version mismatch
/// - `Error::DeserializationError`: Corrupted payload or value text
pub fn decode_category(bytes: &[u8]) -> Result<Category> {
    let envelope: CacheEnvelope<BTreeMap<String, String>> =
        postcard::from_bytes(bytes).map_err(|e| {
            log::error!("Category deserialization failed: {}", e);
            Error::DeserializationError(e.to_string())
        })?;

    if envelope.magic != CACHE_MAGIC {
        log::warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            CACHE_MAGIC,
            envelope.magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        log::warn!(
            "Cache version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION,
            envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    envelope
        .payload
        .into_iter()
        .map(|(name, text)| Ok((name, decode_value(&text)?)))
        .collect()
}
