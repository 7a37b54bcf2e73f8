use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::HashSet;
use std::str::FromStr;
use tokio::sync::Mutex;

use crate::storage::errors::StorageError;
use crate::storage::filter::Filter;
use crate::storage::schema_validation::validate_sqlite_table_schema;

use super::types::{
    Document, DocumentStore, Update, document_id, validate_collection_name,
};

/// Document store backed by SQLite.
///
/// Each collection is a table of `(id, doc)` rows where `doc` holds the JSON
/// text. Filters are evaluated in Rust after a `json_tree` prefilter that keeps
/// only rows containing at least one of the probed values.
pub struct SqliteDataStore {
    pool: Pool<Sqlite>,
    table_prefix: String,
    prepared: Mutex<HashSet<String>>,
}

impl SqliteDataStore {
    pub fn new(pool: Pool<Sqlite>, table_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            table_prefix: table_prefix.into(),
            prepared: Mutex::new(HashSet::new()),
        }
    }

    /// Open a pool for `url`. In-memory databases are pinned to a single
    /// connection, since every SQLite connection gets its own memory database.
    pub async fn connect(url: &str, table_prefix: &str) -> Result<Self, StorageError> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect_with(opts)
            .await?;

        tracing::info!("Connected to SQLite document store: url={}", url);
        Ok(Self::new(pool, table_prefix))
    }

    fn table_name(&self, collection: &str) -> Result<String, StorageError> {
        validate_collection_name(collection)?;
        let table = format!("{}{}", self.table_prefix, collection);
        if table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            Ok(table)
        } else {
            Err(StorageError::InvalidCollection(table))
        }
    }

    /// Resolve the table for a collection, creating and validating it on first use
    async fn table(&self, collection: &str) -> Result<String, StorageError> {
        let table = self.table_name(collection)?;

        let mut prepared = self.prepared.lock().await;
        if prepared.contains(&table) {
            return Ok(table);
        }

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY NOT NULL,
                doc TEXT NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        validate_sqlite_table_schema(
            &self.pool,
            &table,
            &[("id", "TEXT"), ("doc", "TEXT")],
            StorageError::Storage,
        )
        .await?;

        prepared.insert(table.clone());
        Ok(table)
    }

    async fn load_candidates(
        &self,
        table: &str,
        filter: &Filter,
    ) -> Result<Vec<String>, StorageError> {
        let rows = match filter.probe_values() {
            Some(values) if values.is_empty() => Vec::new(),
            Some(values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                let sql = format!(
                    r#"
                    SELECT doc FROM {table}
                    WHERE EXISTS (
                        SELECT 1 FROM json_tree({table}.doc)
                        WHERE json_tree.atom IN ({placeholders})
                    )
                    ORDER BY id
                    "#
                );

                let mut query = sqlx::query_scalar::<_, String>(&sql);
                for value in values {
                    query = match value {
                        Value::String(s) => query.bind(s),
                        Value::Number(n) => query.bind(n.as_i64()),
                        _ => query.bind(None::<i64>),
                    };
                }
                query.fetch_all(&self.pool).await?
            }
            None => {
                sqlx::query_scalar::<_, String>(&format!("SELECT doc FROM {table} ORDER BY id"))
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }
}

#[async_trait]
impl DocumentStore for SqliteDataStore {
    async fn init(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError> {
        let table = self.table(collection).await?;

        let row = sqlx::query_scalar::<_, String>(&format!("SELECT doc FROM {table} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|doc| serde_json::from_str(&doc).map_err(StorageError::from))
            .transpose()
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StorageError> {
        let table = self.table(collection).await?;

        let mut documents = Vec::new();
        for row in self.load_candidates(&table, filter).await? {
            let document: Document = serde_json::from_str(&row)?;
            if filter.matches(&document) {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StorageError> {
        if *filter != Filter::All {
            return Ok(self.find(collection, filter).await?.len() as u64);
        }

        let table = self.table(collection).await?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, StorageError> {
        let mut changed = 0;
        for mut document in self.find(collection, filter).await? {
            if update.apply(&mut document)? {
                self.save(collection, document).await?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn save(&self, collection: &str, document: Document) -> Result<(), StorageError> {
        let table = self.table(collection).await?;
        let id = document_id(&document)?;

        sqlx::query(&format!(
            r#"
            INSERT INTO {table} (id, doc)
            VALUES (?, ?)
            ON CONFLICT (id) DO UPDATE SET
                doc = excluded.doc
            "#
        ))
        .bind(id)
        .bind(serde_json::to_string(&document)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        let table = self.table(collection).await?;

        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
