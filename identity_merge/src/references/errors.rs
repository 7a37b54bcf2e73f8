use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MigrationError {
    /// A tracked collection could not be rewritten. The merge stops here and
    /// can be retried.
    #[error("Reference migration failed for {collection}.{path}: {reason}")]
    ReferenceMigrationFailure {
        collection: String,
        path: String,
        reason: String,
    },
}
