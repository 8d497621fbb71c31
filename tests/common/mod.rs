//! Shared helpers for integration tests: call-counting wrappers around a
//! cache backend and a storage.

#![allow(dead_code)]

use serde_json::Value;
use settings_kit::cache::InMemoryBackend;
use settings_kit::{CacheBackend, Category, Result, SettingIdentifier, Storage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Clone, Default)]
pub struct Calls {
    counters: Arc<[AtomicUsize; 4]>,
}

impl Calls {
    fn bump(&self, slot: usize) {
        self.counters[slot].fetch_add(1, Ordering::SeqCst);
    }

    fn read(&self, slot: usize) -> usize {
        self.counters[slot].load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        (0..4).map(|slot| self.read(slot)).sum()
    }
}

/// In-memory cache that counts reads and writes.
#[derive(Clone, Default)]
pub struct CountingCache {
    pub inner: InMemoryBackend,
    pub calls: Calls,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.calls.read(0)
    }

    pub fn sets(&self) -> usize {
        self.calls.read(1)
    }
}

impl CacheBackend for CountingCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.calls.bump(0);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.calls.bump(1);
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.calls.bump(2);
        self.inner.delete(key).await
    }
}

/// Storage wrapper that counts every call.
pub struct CountingStorage<S> {
    inner: S,
    pub calls: Calls,
}

impl<S: Storage> CountingStorage<S> {
    pub fn new(inner: S) -> (Self, Calls) {
        let calls = Calls::default();
        (
            CountingStorage {
                inner,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl Calls {
    pub fn loads(&self) -> usize {
        self.read(0)
    }

    pub fn persists(&self) -> usize {
        self.read(1)
    }

    pub fn removes(&self) -> usize {
        self.read(2)
    }
}

impl<S: Storage> Storage for CountingStorage<S> {
    fn kind(&self) -> &'static str {
        self.inner.kind()
    }

    fn is_read_only(&self) -> bool {
        self.inner.is_read_only()
    }

    async fn load(&self, category: &str) -> Result<Option<Category>> {
        self.calls.bump(0);
        self.inner.load(category).await
    }

    async fn persist(&self, id: &SettingIdentifier, value: &Value, exists: bool) -> Result<bool> {
        self.calls.bump(1);
        self.inner.persist(id, value, exists).await
    }

    async fn remove(&self, id: &SettingIdentifier) -> Result<bool> {
        self.calls.bump(2);
        self.inner.remove(id).await
    }
}
