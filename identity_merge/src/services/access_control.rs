use async_trait::async_trait;

use super::errors::ServiceError;

/// Role grants held outside the account document
#[async_trait]
pub trait AccessControl: Send + Sync + 'static {
    async fn add_user_roles(&self, account_id: &str, roles: &[String]) -> Result<(), ServiceError>;

    async fn remove_user_roles(
        &self,
        account_id: &str,
        roles: &[String],
    ) -> Result<(), ServiceError>;
}

/// Access control that only records grants in the log.
/// Useful where roles are read from the account document itself.
#[derive(Debug, Default, Clone)]
pub struct LoggingAccessControl;

#[async_trait]
impl AccessControl for LoggingAccessControl {
    async fn add_user_roles(&self, account_id: &str, roles: &[String]) -> Result<(), ServiceError> {
        if !roles.is_empty() {
            tracing::info!("Granting roles {:?} to account {}", roles, account_id);
        }
        Ok(())
    }

    async fn remove_user_roles(
        &self,
        account_id: &str,
        roles: &[String],
    ) -> Result<(), ServiceError> {
        if !roles.is_empty() {
            tracing::info!("Revoking roles {:?} from account {}", roles, account_id);
        }
        Ok(())
    }
}
