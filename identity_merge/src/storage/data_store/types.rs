use async_trait::async_trait;
use serde_json::Value;

use crate::storage::errors::StorageError;
use crate::storage::filter::{Filter, resolve_path, set_at_path};

/// A stored JSON document. Always an object carrying a string `id`.
pub type Document = Value;

/// Single-document update applied by [`DocumentStore::update_many`]
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Set an object-only path to a value
    Set(String, Value),
}

impl Update {
    pub(crate) fn apply(&self, document: &mut Document) -> Result<bool, StorageError> {
        match self {
            Self::Set(path, value) => {
                if resolve_path(document, path).first() == Some(&value) {
                    return Ok(false);
                }
                set_at_path(document, path, value.clone())
                    .map_err(StorageError::InvalidDocument)?;
                Ok(true)
            }
        }
    }
}

/// Generic document store with per-document atomic writes.
///
/// No operation spans more than one document atomically; `update_many` is a
/// sequence of single-document writes.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Prepare the backing storage. Called once at startup.
    async fn init(&self) -> Result<(), StorageError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError>;

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StorageError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StorageError> {
        Ok(self.find(collection, filter).await?.into_iter().next())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StorageError> {
        Ok(self.find(collection, filter).await?.len() as u64)
    }

    /// Apply `update` to every document matching `filter`.
    /// Returns the number of documents actually changed.
    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, StorageError>;

    /// Insert or replace a document by its `id`
    async fn save(&self, collection: &str, document: Document) -> Result<(), StorageError>;

    /// Remove a document. Removing an absent document is not an error.
    async fn remove(&self, collection: &str, id: &str) -> Result<bool, StorageError>;
}

pub(crate) fn document_id(document: &Document) -> Result<&str, StorageError> {
    document
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StorageError::InvalidDocument("Document has no string id".to_string()))
}

/// Collection names become table names, so only a conservative charset is allowed
pub(crate) fn validate_collection_name(collection: &str) -> Result<(), StorageError> {
    let valid = !collection.is_empty()
        && collection.len() <= 64
        && collection
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidCollection(collection.to_string()))
    }
}
