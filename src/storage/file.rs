//! Read-only storage backed by one JSON file per category.
//!
//! Category `mail.smtp` under root `/etc/app` resolves to
//! `/etc/app/mail/smtp.json`. The file must hold a JSON object mapping
//! setting names to values.

use super::{read_only, Storage};
use crate::error::{Error, Result};
use crate::identifier::{validate_category, SettingIdentifier, SEPARATOR};
use crate::store::Category;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Extension of category files.
pub const CATEGORY_FILE_EXTENSION: &str = "json";

/// File-sourced settings, immutable at runtime.
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStorage { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `category`.
    pub fn category_path(&self, category: &str) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(category.split(SEPARATOR));
        path.set_extension(CATEGORY_FILE_EXTENSION);
        path
    }
}

impl Storage for FileStorage {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn is_read_only(&self) -> bool {
        true
    }

    async fn load(&self, category: &str) -> Result<Option<Category>> {
        validate_category(category)?;

        let path = self.category_path(category);
        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) => {
                debug!("Category file {} not readable: {}", path.display(), e);
                return Ok(None);
            }
        };

        match serde_json::from_slice::<Value>(&contents) {
            Ok(Value::Object(settings)) => {
                debug!(
                    "✓ Loaded {} settings for category {} from {}",
                    settings.len(),
                    category,
                    path.display()
                );
                Ok(Some(settings.into_iter().collect()))
            }
            Ok(_) => {
                warn!("Category file {} does not hold an object", path.display());
                Err(Error::NonExistentCategory(category.to_string()))
            }
            Err(e) => {
                warn!("Category file {} is not valid JSON: {}", path.display(), e);
                Err(Error::NonExistentCategory(category.to_string()))
            }
        }
    }

    async fn persist(&self, id: &SettingIdentifier, _value: &Value, _exists: bool) -> Result<bool> {
        Err(read_only(id))
    }

    async fn remove(&self, id: &SettingIdentifier) -> Result<bool> {
        Err(read_only(id))
    }
}
