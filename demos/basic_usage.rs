//! Basic usage example of the settings store.
//!
//! Run with: cargo run --example basic_usage

use serde::{Deserialize, Serialize};
use settings_kit::cache::InMemoryBackend;
use settings_kit::storage::{DatabaseOptions, DatabaseStorage, FileStorage};
use settings_kit::{Result, Settings};

#[derive(Debug, Serialize, Deserialize)]
struct Smtp {
    host: String,
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== Settings Kit - Basic Example ===\n");

    // 1. File storage: one JSON document per category
    println!("1. Reading settings from files...");
    let dir = std::env::temp_dir().join("settings-kit-demo");
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join("app.json"), r#"{"title": "Demo", "debug": true}"#)?;

    let cache = InMemoryBackend::new();
    let mut files = Settings::builder(FileStorage::new(&dir))
        .cache(cache.clone())
        .build()
        .await?;

    println!("   ✓ app.title = {}", files.get_or("app.title", "Untitled").await?);
    println!("   ✓ app.missing = {}", files.get_or("app.missing", "fallback").await?);

    match files.set("app.title", "Other").await {
        Err(e) => println!("   ✓ Write refused: {}\n", e),
        Ok(_) => println!("   ✗ Write unexpectedly accepted\n"),
    }

    // 2. A second instance is served from the shared cache
    println!("2. Fresh instance sharing the cache:");
    std::fs::remove_file(dir.join("app.json"))?;
    let mut cached = Settings::builder(FileStorage::new(&dir))
        .cache(cache.clone())
        .build()
        .await?;
    println!(
        "   ✓ app.title = {} (file already removed)\n",
        cached.get_or("app.title", "Untitled").await?
    );

    // 3. Database storage: read-write
    println!("3. Read-write settings in SQLite:");
    // Each SQLite memory connection is its own database: keep a single one.
    let storage = DatabaseStorage::connect_with(
        "sqlite::memory:",
        1,
        DatabaseOptions::new().with_create_table(true),
    )
    .await?;
    let cache_stats = cache.clone();
    let mut db = Settings::builder(storage)
        .cache(cache)
        .cache_id("demoSettings")
        .build()
        .await?;

    db.set(
        "mail.smtp",
        Smtp {
            host: "localhost".to_string(),
            port: 25,
        },
    )
    .await?;
    db.set("ui.theme", "dark").await?;

    let smtp: Option<Smtp> = db.get_as("mail.smtp").await?;
    println!("   ✓ mail.smtp = {:?}", smtp);
    println!("   ✓ ui.theme = {}", db.get_or("ui.theme", "light").await?);

    db.delete("ui.theme").await?;
    println!("   ✓ ui.theme after delete = {}\n", db.get_or("ui.theme", "light").await?);

    let stats = cache_stats.stats().await;
    println!(
        "4. Shared cache holds {} categories ({} bytes)\n",
        stats.categories, stats.bytes
    );

    Ok(())
}
