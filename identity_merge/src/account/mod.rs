mod errors;
mod store;
mod types;

pub use errors::AccountError;
pub use store::{AccountSearchField, AccountStore};
pub use types::{
    Account, AccountCounters, AccountSummary, EmailStatus, EmailStatusCode, LinkedProviderIdentity,
};
