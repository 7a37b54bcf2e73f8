mod config;
mod memory;
mod sqlite;
mod types;

pub use config::{data_store_from_env, open_data_store};
pub use memory::InMemoryDataStore;
pub use sqlite::SqliteDataStore;
pub use types::{Document, DocumentStore, Update};
pub(crate) use types::document_id;
