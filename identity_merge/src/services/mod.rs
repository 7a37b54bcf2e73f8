//! Collaborators the resolver calls out to

mod access_control;
mod errors;
mod notifier;

pub use access_control::{AccessControl, LoggingAccessControl};
pub use errors::ServiceError;
pub use notifier::{LoggingNotifier, Notifier};
