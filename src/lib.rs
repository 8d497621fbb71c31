//! # settings-kit
//!
//! Category-cached key/value application settings for Rust.
//!
//! ## Features
//!
//! - **Categorised:** `"mail.smtp.host"` is setting `host` in category `mail.smtp`
//! - **Lazy:** a category is loaded as a whole on first access and kept in memory
//! - **Cached:** loaded categories are shared between instances through an
//!   external cache (in-memory or Redis) with a TTL
//! - **Pluggable storage:** read-only JSON files, or a read-write SQL table
//! - **Typed values:** any `serde` type in, `serde_json::Value` or `T` out
//!
//! ## Quick Start
//!
//! ### File storage
//!
//! ```ignore
//! use settings_kit::{Settings, cache::InMemoryBackend, storage::FileStorage};
//!
//! // /etc/app/app.json = {"title": "Demo"}
//! let mut settings = Settings::builder(FileStorage::new("/etc/app"))
//!     .cache(InMemoryBackend::new())
//!     .build()
//!     .await?;
//!
//! assert_eq!(settings.get_or("app.title", "Untitled").await?, "Demo");
//! ```
//!
//! ### Database storage
//!
//! ```ignore
//! use settings_kit::{Settings, storage::{DatabaseOptions, DatabaseStorage}};
//!
//! let storage = DatabaseStorage::connect(
//!     "sqlite://settings.db?mode=rwc",
//!     DatabaseOptions::new().with_create_table(true),
//! )
//! .await?;
//!
//! let mut settings = Settings::new(storage);
//! settings.set("ui.theme", "dark").await?;
//! settings.delete("ui.theme").await?;
//! ```
//!
//! ### From configuration
//!
//! ```ignore
//! use settings_kit::{Settings, SettingsConfig, cache::InMemoryBackend};
//!
//! let config = SettingsConfig::from_file("settings.json")?.apply_env_overrides();
//! let mut settings = Settings::from_config(&config, Some(InMemoryBackend::new())).await?;
//! ```

#[macro_use]
extern crate log;

pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod identifier;
pub mod key;
pub mod observability;
pub mod serialization;
pub mod settings;
pub mod storage;
pub mod store;

// Re-exports for convenience
pub use cache::CacheBackend;
pub use config::{SettingsConfig, StorageConfig};
pub use error::{Error, Result};
pub use identifier::SettingIdentifier;
pub use settings::{Settings, SettingsBuilder};
pub use storage::{Storage, StorageBackend};
pub use store::Category;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
