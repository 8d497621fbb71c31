//! Error types for the settings store.

use std::fmt;

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the settings store.
///
/// Absence is never an error: a missing category or setting is reported as
/// `Ok(None)` / `Ok(false)` or resolved to the caller's default value. The
/// variants below are reserved for programmer errors, configuration problems
/// and collaborator failures.
#[derive(Debug, Clone)]
pub enum Error {
    /// The cache backend handed to the builder is not usable.
    ///
    /// Raised at build time when the backend's health check fails or errors.
    InvalidCacheComponent(String),

    /// The cache identifier prefix does not satisfy the label grammar.
    InvalidCacheId(String),

    /// A setting identifier or category name does not satisfy the label grammar.
    ///
    /// Always raised before any storage or cache access.
    InvalidName(String),

    /// A category source exists but does not hold a mapping of settings.
    ///
    /// Common causes:
    /// - Category file contains a JSON array, string or number
    /// - Category file is not valid JSON
    NonExistentCategory(String),

    /// Mutation attempted on a read-only storage.
    ReadOnly(String),

    /// The database handle could not be opened or failed its liveness check.
    InvalidDbComponent(String),

    /// Automatic table creation failed.
    ///
    /// Only raised when table creation was requested in the configuration.
    InvalidDbTable(String),

    /// Serialization failed when converting a value or category to bytes/text.
    SerializationError(String),

    /// Deserialization failed when reading a stored value or cache entry.
    DeserializationError(String),

    /// Cache entry does not carry the settings envelope magic.
    ///
    /// **Recovery:** the entry is evicted and the category reloaded from storage.
    InvalidCacheEntry(String),

    /// Cache entry was written with a different envelope version.
    ///
    /// **Recovery:** the entry is evicted and the category reloaded from storage.
    VersionMismatch {
        /// Expected envelope version (from compiled code)
        expected: u32,
        /// Found envelope version (from cached entry)
        found: u32,
    },

    /// Cache service error (Redis connection lost, timeout, ...).
    BackendError(String),

    /// SQL executor error (syntax, constraint, connectivity).
    DatabaseError(String),

    /// Invalid configuration value.
    ConfigError(String),

    /// Feature not implemented by a cache backend.
    NotImplemented(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// Stable numeric code for the error kinds shared with other settings
    /// implementations. Ambient errors report `0`.
    pub fn code(&self) -> u16 {
        match self {
            Error::InvalidCacheComponent(_) => 1,
            Error::InvalidCacheId(_) => 2,
            Error::InvalidName(_) => 3,
            Error::NonExistentCategory(_) => 6,
            Error::ReadOnly(_) => 7,
            Error::InvalidDbComponent(_) => 8,
            Error::InvalidDbTable(_) => 9,
            _ => 0,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCacheComponent(msg) => write!(f, "Invalid cache component: {}", msg),
            Error::InvalidCacheId(id) => write!(
                f,
                "Invalid cache identifier \"{}\": must be a single label",
                id
            ),
            Error::InvalidName(name) => write!(
                f,
                "Invalid setting name \"{}\": category and name must be labels joined by '.'",
                name
            ),
            Error::NonExistentCategory(category) => {
                write!(f, "The category \"{}\" does not exist", category)
            }
            Error::ReadOnly(name) => write!(
                f,
                "Unable to modify setting \"{}\": storage is read-only",
                name
            ),
            Error::InvalidDbComponent(msg) => write!(f, "Invalid database component: {}", msg),
            Error::InvalidDbTable(msg) => write!(f, "Invalid settings table: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::DatabaseError(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
