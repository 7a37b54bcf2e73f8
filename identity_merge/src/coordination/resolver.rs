use std::sync::Arc;

use crate::account::AccountStore;
use crate::config::ResolverConfig;
use crate::references::{ReferenceMigrator, ReferenceRegistry};
use crate::services::{AccessControl, Notifier};
use crate::storage::DocumentStore;

/// Entry point for resolving external identities into accounts.
///
/// Holds no lock and no cached state: every call reads and writes the
/// injected store directly, one document at a time.
#[derive(Clone)]
pub struct IdentityResolver {
    pub(super) accounts: AccountStore,
    pub(super) migrator: ReferenceMigrator,
    pub(super) access_control: Arc<dyn AccessControl>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) config: ResolverConfig,
}

impl IdentityResolver {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        access_control: Arc<dyn AccessControl>,
        notifier: Arc<dyn Notifier>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            accounts: AccountStore::new(store.clone()),
            migrator: ReferenceMigrator::new(store, ReferenceRegistry::default()),
            access_control,
            notifier,
            config,
        }
    }

    /// Replace the set of tracked reference collections
    pub fn with_registry(mut self, registry: ReferenceRegistry) -> Self {
        self.migrator = ReferenceMigrator::new(self.accounts.document_store(), registry);
        self
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn registry(&self) -> &ReferenceRegistry {
        self.migrator.registry()
    }
}
