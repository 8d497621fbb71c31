//! Redis Backend Integration Tests
//!
//! These tests require a running Redis instance and skip themselves when
//! none is reachable.
//!
//! ```bash
//! docker run --rm -p 6379:6379 redis:7
//! cargo test --features redis --test redis_integration_test
//! ```
//!
//! ## Environment Variables
//!
//! - `TEST_REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")

#![cfg(feature = "redis")]

mod common;

use common::init_logger;
use serde_json::json;
use settings_kit::cache::{RedisBackend, RedisConfig};
use settings_kit::storage::FileStorage;
use settings_kit::{CacheBackend, Error, Settings};
use std::env;
use std::time::Duration;

/// Helper: Get Redis connection URL from environment or use default
fn get_redis_url() -> String {
    env::var("TEST_REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

/// Helper: Create a test Redis backend
async fn create_test_backend() -> Option<RedisBackend> {
    let backend = RedisBackend::from_connection_string(&get_redis_url())
        .await
        .ok()?;
    match backend.health_check().await {
        Ok(true) => Some(backend),
        _ => {
            println!("⚠️  Redis not available, skipping test");
            None
        }
    }
}

fn category_dir(contents: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("app.json"), contents).expect("Failed to write category file");
    dir
}

#[tokio::test]
async fn test_redis_settings_shared_between_instances() {
    init_logger();
    let Some(backend) = create_test_backend().await else {
        return;
    };

    let dir = category_dir(r#"{"title": "Demo"}"#);
    let cache_id = "settingsRedisShared";
    backend
        .delete(&format!("{}.app", cache_id))
        .await
        .expect("DELETE should succeed");

    let mut first = Settings::builder(FileStorage::new(dir.path()))
        .cache(backend.clone())
        .cache_id(cache_id)
        .build()
        .await
        .expect("Failed to build settings");
    assert_eq!(
        first.get("app.title").await.expect("Failed to get"),
        Some(json!("Demo"))
    );
    println!("✓ Category loaded from files and cached in Redis");

    // The file is gone; a fresh instance must be served by Redis.
    std::fs::remove_file(dir.path().join("app.json")).expect("Failed to remove file");
    let mut second = Settings::builder(FileStorage::new(dir.path()))
        .cache(backend.clone())
        .cache_id(cache_id)
        .build()
        .await
        .expect("Failed to build settings");
    assert_eq!(
        second.get("app.title").await.expect("Failed to get"),
        Some(json!("Demo"))
    );
    println!("✓ Fresh instance served from Redis");

    backend
        .delete(&format!("{}.app", cache_id))
        .await
        .expect("DELETE should succeed");
}

#[tokio::test]
async fn test_redis_category_ttl() {
    init_logger();
    let Some(backend) = create_test_backend().await else {
        return;
    };

    let dir = category_dir(r#"{"title": "Demo"}"#);
    let cache_id = "settingsRedisTtl";

    let mut settings = Settings::builder(FileStorage::new(dir.path()))
        .cache(backend.clone())
        .cache_id(cache_id)
        .cache_timeout(1)
        .build()
        .await
        .expect("Failed to build settings");
    settings.get("app.title").await.expect("Failed to get");

    let key = format!("{}.app", cache_id);
    assert!(backend.exists(&key).await.expect("EXISTS should succeed"));

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert!(!backend.exists(&key).await.expect("EXISTS should succeed"));
    println!("✓ Cached category expired after its TTL");
}

#[tokio::test]
async fn test_redis_unreachable_is_invalid_component() {
    init_logger();
    let config = RedisConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        connection_timeout: Duration::from_millis(200),
        ..Default::default()
    };

    let backend = match RedisBackend::new(config).await {
        Ok(backend) => backend,
        // Pool creation already refused the address.
        Err(_) => return,
    };

    let result = Settings::builder(FileStorage::new("."))
        .cache(backend)
        .build()
        .await;
    assert!(matches!(result, Err(Error::InvalidCacheComponent(_))));
}
