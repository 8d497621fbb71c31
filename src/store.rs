//! Per-instance working set of loaded categories.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// A category: setting name → value.
pub type Category = BTreeMap<String, Value>;

/// Categories resident in one settings instance.
///
/// A category is either absent (never loaded, or found nowhere) or present
/// as a complete mapping, possibly empty. Partial categories never exist.
#[derive(Debug, Default)]
pub struct SettingsStore {
    categories: HashMap<String, Category>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub fn category(&self, category: &str) -> Option<&Category> {
        self.categories.get(category)
    }

    /// Look up a single setting in a resident category.
    pub fn value(&self, category: &str, name: &str) -> Option<&Value> {
        self.categories.get(category)?.get(name)
    }

    /// Make `settings` the resident state of `category`, replacing any
    /// previous mapping.
    pub fn insert(&mut self, category: impl Into<String>, settings: Category) {
        self.categories.insert(category.into(), settings);
    }

    /// Set one value, creating the category if it is not resident yet.
    pub fn put_value(&mut self, category: &str, name: &str, value: Value) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }

    /// Remove one value. The category itself stays resident, even when empty.
    pub fn remove_value(&mut self, category: &str, name: &str) -> Option<Value> {
        self.categories.get_mut(category)?.remove(name)
    }

    /// Drop a category so the next access reloads it.
    pub fn forget(&mut self, category: &str) -> Option<Category> {
        self.categories.remove(category)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_lookup() {
        let mut store = SettingsStore::new();
        let mut app = Category::new();
        app.insert("title".to_string(), json!("Demo"));
        store.insert("app", app);

        assert!(store.contains("app"));
        assert_eq!(store.value("app", "title"), Some(&json!("Demo")));
        assert_eq!(store.value("app", "missing"), None);
        assert_eq!(store.value("ui", "title"), None);
    }

    #[test]
    fn test_put_value_creates_category() {
        let mut store = SettingsStore::new();
        store.put_value("ui", "theme", json!("dark"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.value("ui", "theme"), Some(&json!("dark")));
    }

    #[test]
    fn test_remove_value_keeps_empty_category() {
        let mut store = SettingsStore::new();
        store.put_value("ui", "theme", json!("dark"));

        assert_eq!(store.remove_value("ui", "theme"), Some(json!("dark")));
        assert!(store.contains("ui"));
        assert!(store.category("ui").is_some_and(|c| c.is_empty()));
        assert_eq!(store.remove_value("missing", "theme"), None);
    }

    #[test]
    fn test_forget() {
        let mut store = SettingsStore::new();
        store.put_value("ui", "theme", json!("dark"));

        assert!(store.forget("ui").is_some());
        assert!(store.is_empty());
    }
}
