use thiserror::Error;

/// Failures reported by external collaborators
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Access control error: {0}")]
    AccessControl(String),

    #[error("Notification error: {0}")]
    Notification(String),
}
