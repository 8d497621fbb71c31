//! Read-write storage backed by a SQL table (SQLite via sqlx).
//!
//! Each setting is one row:
//!
//! | Column | Type | |
//! |--------|------|-|
//! | `id` | `INTEGER` | auto-increment primary key |
//! | `name` | `VARCHAR(64)` | setting name |
//! | `category` | `VARCHAR(255)` | category path |
//! | `value` | `TEXT` | JSON text, `NULL` or non-JSON reads as JSON `null` |
//!
//! `(name, category)` is unique. The table name is interpolated into the
//! statements, so it must satisfy the label grammar.

use super::Storage;
use crate::error::{Error, Result};
use crate::identifier::{is_valid_label, validate_category, SettingIdentifier};
use crate::serialization::{decode_value, encode_value};
use crate::store::Category;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tokio::sync::OnceCell;

/// Default settings table.
pub const DEFAULT_TABLE_NAME: &str = "settings";

/// Default pool size for [`DatabaseStorage::connect`].
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Table options for [`DatabaseStorage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub table_name: String,
    /// Create the table at construction when it does not exist.
    pub create_table: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        DatabaseOptions {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            create_table: false,
        }
    }
}

impl DatabaseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_create_table(mut self, create_table: bool) -> Self {
        self.create_table = create_table;
        self
    }
}

/// Statements for one table, rendered once.
#[derive(Debug)]
struct Queries {
    create: String,
    select: String,
    insert: String,
    update: String,
    delete: String,
}

impl Queries {
    fn new(table: &str) -> Self {
        Queries {
            create: format!(
                r#"CREATE TABLE IF NOT EXISTS "{table}" (
                    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
                    "name" VARCHAR(64) NOT NULL,
                    "category" VARCHAR(255) NOT NULL,
                    "value" TEXT,
                    UNIQUE ("name", "category")
                )"#
            ),
            select: format!(r#"SELECT "name", "value" FROM "{table}" WHERE "category" = ?"#),
            insert: format!(
                r#"INSERT INTO "{table}" ("category", "name", "value") VALUES (?, ?, ?)"#
            ),
            update: format!(
                r#"UPDATE "{table}" SET "value" = ? WHERE "category" = ? AND "name" = ?"#
            ),
            delete: format!(
                r#"DELETE FROM "{table}" WHERE "id" IN (
                    SELECT "id" FROM "{table}" WHERE "name" = ? AND "category" = ? LIMIT 1
                )"#
            ),
        }
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Database-sourced settings.
pub struct DatabaseStorage {
    pool: SqlitePool,
    options: DatabaseOptions,
    queries: Queries,
    table_created: OnceCell<bool>,
}

impl DatabaseStorage {
    /// Open a pool on `url` and build the storage over it.
    ///
    /// # Errors
    ///
    /// See [`DatabaseStorage::new`]; connection failures are reported as
    /// `Error::InvalidDbComponent`.
    pub async fn connect(url: &str, options: DatabaseOptions) -> Result<Self> {
        Self::connect_with(url, DEFAULT_MAX_CONNECTIONS, options).await
    }

    /// Like [`DatabaseStorage::connect`] with an explicit pool size.
    ///
    /// Every SQLite in-memory connection is a separate database, so memory
    /// URLs always get one connection that is never recycled.
    pub async fn connect_with(
        url: &str,
        max_connections: u32,
        options: DatabaseOptions,
    ) -> Result<Self> {
        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
        if is_memory_url(url) {
            if max_connections > 1 {
                debug!("In-memory database {}, using a single connection", url);
            }
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect(url)
            .await
            .map_err(|e| Error::InvalidDbComponent(format!("{}: {}", url, e)))?;

        Self::new(pool, options).await
    }

    /// Build the storage over an existing pool.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDbComponent`: the pool does not answer `SELECT 1`
    /// - `Error::InvalidDbTable`: `create_table` is set and creation failed
    /// - `Error::ConfigError`: the table name is not a label
    pub async fn new(pool: SqlitePool, options: DatabaseOptions) -> Result<Self> {
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| Error::InvalidDbComponent(e.to_string()))?;

        let storage = DatabaseStorage {
            queries: Queries::new(&options.table_name),
            pool,
            options,
            table_created: OnceCell::new(),
        };

        if storage.options.create_table {
            if !storage.create_table().await {
                return Err(Error::InvalidDbTable(format!(
                    "unable to create table \"{}\"",
                    storage.options.table_name
                )));
            }
        } else if !is_valid_label(&storage.options.table_name) {
            return Err(Error::ConfigError(format!(
                "invalid settings table name \"{}\"",
                storage.options.table_name
            )));
        }

        info!(
            "✓ Database settings storage ready (table: {})",
            storage.options.table_name
        );
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn table_name(&self) -> &str {
        &self.options.table_name
    }

    /// Create the settings table if it does not exist.
    ///
    /// The outcome of the first attempt is remembered; later calls return
    /// it without touching the database.
    pub async fn create_table(&self) -> bool {
        *self
            .table_created
            .get_or_init(|| async {
                if !is_valid_label(&self.options.table_name) {
                    warn!(
                        "Refusing to create settings table with invalid name {:?}",
                        self.options.table_name
                    );
                    return false;
                }

                match sqlx::query(&self.queries.create).execute(&self.pool).await {
                    Ok(_) => {
                        debug!("✓ Settings table {} ready", self.options.table_name);
                        true
                    }
                    Err(e) => {
                        error!(
                            "Failed to create settings table {}: {}",
                            self.options.table_name, e
                        );
                        false
                    }
                }
            })
            .await
    }
}

impl Storage for DatabaseStorage {
    fn kind(&self) -> &'static str {
        "database"
    }

    async fn load(&self, category: &str) -> Result<Option<Category>> {
        validate_category(category)?;

        let rows = sqlx::query(&self.queries.select)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        if rows.is_empty() {
            debug!("No settings rows for category {}", category);
            return Ok(None);
        }

        let mut settings = Category::new();
        for row in rows {
            let name: String = row.try_get("name")?;
            let value = match row.try_get::<Option<String>, _>("value")? {
                Some(text) => decode_value(&text).unwrap_or_else(|e| {
                    warn!(
                        "Unreadable value for setting {}.{}, loading null: {}",
                        category, name, e
                    );
                    Value::Null
                }),
                None => Value::Null,
            };
            settings.insert(name, value);
        }

        debug!(
            "✓ Loaded {} settings for category {} from table {}",
            settings.len(),
            category,
            self.options.table_name
        );
        Ok(Some(settings))
    }

    async fn persist(&self, id: &SettingIdentifier, value: &Value, exists: bool) -> Result<bool> {
        let text = encode_value(value)?;

        let result = if exists {
            sqlx::query(&self.queries.update)
                .bind(text)
                .bind(&id.category)
                .bind(&id.name)
                .execute(&self.pool)
                .await?
        } else {
            sqlx::query(&self.queries.insert)
                .bind(&id.category)
                .bind(&id.name)
                .bind(text)
                .execute(&self.pool)
                .await?
        };

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, id: &SettingIdentifier) -> Result<bool> {
        let result = sqlx::query(&self.queries.delete)
            .bind(&id.name)
            .bind(&id.category)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
