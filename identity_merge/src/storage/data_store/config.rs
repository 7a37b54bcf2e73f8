//! Document store selection

use std::{env, sync::Arc, sync::LazyLock};

use crate::storage::config::DB_TABLE_PREFIX;
use crate::storage::errors::StorageError;

use super::memory::InMemoryDataStore;
use super::sqlite::SqliteDataStore;
use super::types::DocumentStore;

static GENERIC_DATA_STORE_TYPE: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_DATA_STORE_TYPE").unwrap_or_else(|_| "memory".to_string())
});

static GENERIC_DATA_STORE_URL: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_DATA_STORE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
});

/// Build the document store selected by `GENERIC_DATA_STORE_TYPE`
pub async fn data_store_from_env() -> Result<Arc<dyn DocumentStore>, StorageError> {
    open_data_store(
        GENERIC_DATA_STORE_TYPE.as_str(),
        GENERIC_DATA_STORE_URL.as_str(),
        DB_TABLE_PREFIX.as_str(),
    )
    .await
}

pub async fn open_data_store(
    store_type: &str,
    store_url: &str,
    table_prefix: &str,
) -> Result<Arc<dyn DocumentStore>, StorageError> {
    tracing::info!(
        "Initializing data store with type: {}, url: {}",
        store_type,
        store_url
    );

    let store: Arc<dyn DocumentStore> = match store_type {
        "memory" => Arc::new(InMemoryDataStore::new()),
        "sqlite" => Arc::new(SqliteDataStore::connect(store_url, table_prefix).await?),
        t => {
            return Err(StorageError::Config(format!(
                "Unsupported store type: {t}. Supported types are 'memory' and 'sqlite'"
            )));
        }
    };

    store.init().await?;
    Ok(store)
}
