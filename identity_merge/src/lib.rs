//! identity_merge - Identity resolution and account merge engine
//!
//! Reconciles logins from external identity providers and confirmed email
//! addresses into one canonical account per person. When signals overlap it
//! merges accounts, moving every foreign key held by other collections and
//! repairing per-target uniqueness of ratings and stars along the way.
//!
//! The engine works against any [`DocumentStore`]; an in-memory store and a
//! SQLite-backed one are provided. Role grants and merge notices go through
//! the injected [`AccessControl`] and [`Notifier`] collaborators.

mod account;
mod config;
mod coordination;
mod profile;
mod references;
mod services;
mod storage;
mod utils;

#[cfg(test)]
mod test_utils;

pub use account::{
    Account, AccountCounters, AccountError, AccountSearchField, AccountStore, AccountSummary,
    EmailStatus, EmailStatusCode, LinkedProviderIdentity,
};

pub use config::{
    ACCOUNT_DEFAULT_PLAN, ACCOUNT_DEFAULT_ROLE, ACCOUNT_PLANS, ACCOUNT_ROOT_ROLE,
    EMAIL_CONFIRMATION_TTL_SECS, ResolverConfig,
};

pub use coordination::{
    EmailConfirmation, IdentityResolver, MergeConflict, MergeReport, ResolutionError,
};

pub use profile::{NormalizedProfile, ProfileError, check_provider_identity, normalize_profile};

pub use references::{
    ContentKind, DuplicatePolicy, MigrationError, MigrationReport, ReferenceKind,
    ReferenceMigrator, ReferenceRegistry, TrackedReference,
};

pub use services::{AccessControl, LoggingAccessControl, LoggingNotifier, Notifier, ServiceError};

pub use storage::{
    COLLECTION_ACCOUNTS, DB_TABLE_PREFIX, Document, DocumentStore, Filter, InMemoryDataStore,
    SqliteDataStore, StorageError, Update, data_store_from_env, open_data_store,
};

pub use utils::{UtilError, gen_random_string};
