//! Shared helpers for unit tests across the crate

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Arc, Mutex};

use crate::account::{Account, EmailStatus, EmailStatusCode};
use crate::config::ResolverConfig;
use crate::coordination::IdentityResolver;
use crate::services::{AccessControl, Notifier, ServiceError};
use crate::storage::{DocumentStore, InMemoryDataStore};

/// Access control double that remembers every call
#[derive(Default)]
pub(crate) struct RecordingAccessControl {
    pub(crate) granted: Mutex<Vec<(String, Vec<String>)>>,
    pub(crate) revoked: Mutex<Vec<(String, Vec<String>)>>,
}

#[async_trait]
impl AccessControl for RecordingAccessControl {
    async fn add_user_roles(&self, account_id: &str, roles: &[String]) -> Result<(), ServiceError> {
        if let Ok(mut granted) = self.granted.lock() {
            granted.push((account_id.to_string(), roles.to_vec()));
        }
        Ok(())
    }

    async fn remove_user_roles(
        &self,
        account_id: &str,
        roles: &[String],
    ) -> Result<(), ServiceError> {
        if let Ok(mut revoked) = self.revoked.lock() {
            revoked.push((account_id.to_string(), roles.to_vec()));
        }
        Ok(())
    }
}

/// Notifier double; fails every call when `fail` is set
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub(crate) fail: bool,
    pub(crate) sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_account_merged_notice(
        &self,
        survivor: &Account,
        removed: &Account,
        explanation: &str,
    ) -> Result<(), ServiceError> {
        if self.fail {
            return Err(ServiceError::Notification("mail relay unreachable".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((
                survivor.id.clone(),
                removed.id.clone(),
                explanation.to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) struct TestContext {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) access: Arc<RecordingAccessControl>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) resolver: IdentityResolver,
}

pub(crate) fn test_context() -> TestContext {
    context_with_notifier(RecordingNotifier::default())
}

pub(crate) fn context_with_notifier(notifier: RecordingNotifier) -> TestContext {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDataStore::new());
    let access = Arc::new(RecordingAccessControl::default());
    let notifier = Arc::new(notifier);
    let resolver = IdentityResolver::new(
        store.clone(),
        access.clone(),
        notifier.clone(),
        ResolverConfig::default(),
    );
    TestContext {
        store,
        access,
        notifier,
        resolver,
    }
}

/// Persist a confirmed account with the given id and email
pub(crate) async fn insert_account(ctx: &TestContext, id: &str, email: &str) -> Account {
    let mut account = Account::new(id.to_string(), format!("user-{id}"), email.to_string());
    account.plan = "free".to_string();
    ctx.resolver
        .accounts()
        .upsert_account(account)
        .await
        .expect("Failed to insert account")
}

/// Persist an account whose registration was never confirmed
pub(crate) async fn insert_pending_account(
    ctx: &TestContext,
    id: &str,
    email: &str,
    token: &str,
) -> Account {
    let mut account = Account::new(id.to_string(), format!("pending-{id}"), email.to_string());
    account.is_active = false;
    account.email_status = EmailStatus {
        code: EmailStatusCode::PendingRegistration,
        token: Some(token.to_string()),
        expires_at: Some(Utc::now() + Duration::hours(1)),
        value: None,
    };
    ctx.resolver
        .accounts()
        .upsert_account(account)
        .await
        .expect("Failed to insert pending account")
}
