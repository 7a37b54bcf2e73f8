use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    /// The payload lacks a provider user id or a usable email
    #[error("Profile incomplete: {0}")]
    ProfileIncomplete(String),

    /// The caller's account already links a different identity at this provider
    #[error("Provider identity conflict: {provider} is linked to a different identity on this account")]
    ProviderIdentityConflict { provider: String },

    #[error("Invalid profile payload: {0}")]
    InvalidPayload(String),
}

impl From<serde_json::Error> for ProfileError {
    fn from(err: serde_json::Error) -> Self {
        ProfileError::InvalidPayload(err.to_string())
    }
}
