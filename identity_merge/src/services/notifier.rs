use async_trait::async_trait;

use crate::account::Account;

use super::errors::ServiceError;

/// Outbound notices about account changes
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Tell the survivor of a merge which account was folded into theirs
    async fn send_account_merged_notice(
        &self,
        survivor: &Account,
        removed: &Account,
        explanation: &str,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send_account_merged_notice(
        &self,
        survivor: &Account,
        removed: &Account,
        explanation: &str,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            "Merge notice to {} <{}>: account {} <{}> merged. {}",
            survivor.name,
            survivor.email,
            removed.name,
            removed.email,
            explanation
        );
        Ok(())
    }
}
