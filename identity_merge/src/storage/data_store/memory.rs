use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::storage::errors::StorageError;
use crate::storage::filter::Filter;

use super::types::{
    Document, DocumentStore, Update, document_id, validate_collection_name,
};

/// Process-local document store. Documents are kept per collection in id order.
pub struct InMemoryDataStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory document store");
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDataStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(()) // Nothing to initialize for in-memory store
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError> {
        validate_collection_name(collection)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StorageError> {
        validate_collection_name(collection)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .values()
                    .filter(|document| filter.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, StorageError> {
        validate_collection_name(collection)?;
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let mut changed = 0;
        for document in documents.values_mut() {
            if filter.matches(document) && update.apply(document)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn save(&self, collection: &str, document: Document) -> Result<(), StorageError> {
        validate_collection_name(collection)?;
        let id = document_id(&document)?.to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, document);
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        validate_collection_name(collection)?;
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .and_then(|documents| documents.remove(id))
            .is_some())
    }
}
