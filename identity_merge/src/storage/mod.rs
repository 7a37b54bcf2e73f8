mod config;
mod data_store;
mod errors;
mod filter;
mod schema_validation;

pub use config::{COLLECTION_ACCOUNTS, DB_TABLE_PREFIX};
pub use data_store::{
    Document, DocumentStore, InMemoryDataStore, SqliteDataStore, Update, data_store_from_env,
    open_data_store,
};
pub use errors::StorageError;
pub use filter::Filter;

pub(crate) use data_store::document_id;
pub(crate) use filter::replace_at_path;
