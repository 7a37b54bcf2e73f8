//! Error types for identity resolution

use thiserror::Error;

use crate::account::AccountError;
use crate::profile::ProfileError;
use crate::references::MigrationError;
use crate::services::ServiceError;
use crate::storage::StorageError;
use crate::utils::UtilError;

use super::conflict::MergeConflict;

/// Errors that can occur while resolving or merging identities
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The provider profile lacks an id or a usable email
    #[error("Profile incomplete: {0}")]
    ProfileIncomplete(String),

    /// The caller already links a different identity at this provider
    #[error("Provider identity conflict: {provider}")]
    ProviderIdentityConflict { provider: String },

    /// The provider payload could not be read
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Several accounts match; the caller has to pick the one to keep
    #[error("Merge conflict: {}", .0.explanation)]
    MergeConflict(MergeConflict),

    /// The account chosen to keep is not among the current candidates
    #[error("Invalid merge selection: {0}")]
    InvalidMergeSelection(String),

    #[error("Cannot merge account {0} into itself")]
    SelfMerge(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// No account holds the confirmation token
    #[error("Invalid confirmation token")]
    InvalidToken,

    #[error("Confirmation token expired")]
    TokenExpired,

    /// Resource not found with context
    #[error("Resource not found: {resource_type} {resource_id}")]
    ResourceNotFound {
        resource_type: String,
        resource_id: String,
    },

    /// Rewriting foreign keys failed part way; the merge can be retried
    #[error("Reference migration error: {0}")]
    ReferenceMigration(MigrationError),

    #[error("Account error: {0}")]
    AccountError(AccountError),

    #[error("Storage error: {0}")]
    StorageError(StorageError),

    #[error("Service error: {0}")]
    ServiceError(ServiceError),

    #[error("Utils error: {0}")]
    UtilsError(UtilError),
}

impl ResolutionError {
    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::ProfileIncomplete(msg) => tracing::error!("Profile incomplete: {}", msg),
            Self::ProviderIdentityConflict { provider } => {
                tracing::error!("Provider identity conflict: {}", provider)
            }
            Self::InvalidProfile(msg) => tracing::error!("Invalid profile: {}", msg),
            Self::MergeConflict(conflict) => tracing::error!(
                "Merge conflict between {} accounts: {}",
                conflict.candidates.len(),
                conflict.explanation
            ),
            Self::InvalidMergeSelection(id) => tracing::error!("Invalid merge selection: {}", id),
            Self::SelfMerge(id) => tracing::error!("Cannot merge account {} into itself", id),
            Self::InvalidEmail(email) => tracing::error!("Invalid email address: {}", email),
            Self::InvalidToken => tracing::error!("Invalid confirmation token"),
            Self::TokenExpired => tracing::error!("Confirmation token expired"),
            Self::ResourceNotFound {
                resource_type,
                resource_id,
            } => tracing::error!("Resource not found: {} {}", resource_type, resource_id),
            Self::ReferenceMigration(err) => tracing::error!("Reference migration error: {}", err),
            Self::AccountError(err) => tracing::error!("Account error: {}", err),
            Self::StorageError(err) => tracing::error!("Storage error: {}", err),
            Self::ServiceError(err) => tracing::error!("Service error: {}", err),
            Self::UtilsError(err) => tracing::error!("Utils error: {}", err),
        }
        self
    }

    pub(crate) fn account_not_found(id: &str) -> Self {
        Self::ResourceNotFound {
            resource_type: "Account".to_string(),
            resource_id: id.to_string(),
        }
    }
}

// Profile problems are expected outcomes of a login attempt, so they are
// logged quietly. Everything else is logged as it crosses into this layer.

impl From<ProfileError> for ResolutionError {
    fn from(err: ProfileError) -> Self {
        tracing::debug!("{}", err);
        match err {
            ProfileError::ProfileIncomplete(msg) => Self::ProfileIncomplete(msg),
            ProfileError::ProviderIdentityConflict { provider } => {
                Self::ProviderIdentityConflict { provider }
            }
            ProfileError::InvalidPayload(msg) => Self::InvalidProfile(msg),
        }
    }
}

impl From<MigrationError> for ResolutionError {
    fn from(err: MigrationError) -> Self {
        let error = Self::ReferenceMigration(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<AccountError> for ResolutionError {
    fn from(err: AccountError) -> Self {
        let error = Self::AccountError(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<StorageError> for ResolutionError {
    fn from(err: StorageError) -> Self {
        let error = Self::StorageError(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<ServiceError> for ResolutionError {
    fn from(err: ServiceError) -> Self {
        let error = Self::ServiceError(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<UtilError> for ResolutionError {
    fn from(err: UtilError) -> Self {
        let error = Self::UtilsError(err);
        tracing::error!("{}", error);
        error
    }
}
