mod errors;
mod normalize;
mod types;

pub use errors::ProfileError;
pub use normalize::{check_provider_identity, normalize_profile};
pub use types::NormalizedProfile;

pub(crate) use normalize::normalize_emails;
