use thiserror::Error;

use crate::storage::StorageError;

#[derive(Clone, Error, Debug)]
pub enum AccountError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for AccountError {
    fn from(err: serde_json::Error) -> Self {
        AccountError::InvalidData(err.to_string())
    }
}

impl From<StorageError> for AccountError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serde(msg) | StorageError::InvalidDocument(msg) => {
                AccountError::InvalidData(msg)
            }
            other => AccountError::Storage(other.to_string()),
        }
    }
}
