//! Database table configuration

use std::env;
use std::sync::LazyLock;

/// Table prefix from environment variable
pub static DB_TABLE_PREFIX: LazyLock<String> =
    LazyLock::new(|| env::var("DB_TABLE_PREFIX").unwrap_or_else(|_| "im_".to_string()));

/// Accounts collection name
pub const COLLECTION_ACCOUNTS: &str = "accounts";
