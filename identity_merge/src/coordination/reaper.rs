use crate::account::EmailStatusCode;
use crate::storage::Filter;

use super::errors::ResolutionError;
use super::resolver::IdentityResolver;

impl IdentityResolver {
    /// Delete never-confirmed registrations whose primary email is one of
    /// `emails`. They hold nothing worth keeping and must not be merged.
    ///
    /// Returns the number of accounts deleted.
    pub(super) async fn reap_pending_registrations(
        &self,
        emails: &[String],
        exempt: Option<&str>,
    ) -> Result<usize, ResolutionError> {
        if emails.is_empty() {
            return Ok(0);
        }

        let filter = Filter::And(vec![
            Filter::one_of("email", emails.iter().map(String::as_str)),
            Filter::eq(
                "email_status.code",
                EmailStatusCode::PendingRegistration.as_str(),
            ),
        ]);

        let mut deleted = 0;
        for account in self.accounts.find_accounts(&filter).await? {
            if Some(account.id.as_str()) == exempt {
                continue;
            }

            if self.accounts.delete_account(&account.id).await? {
                deleted += 1;
            }
            let roles: Vec<String> = account.roles.iter().cloned().collect();
            self.access_control
                .remove_user_roles(&account.id, &roles)
                .await?;

            tracing::info!(
                "Deleted pending registration {} <{}> in favor of a confirmed identity",
                account.id,
                account.email
            );
        }
        Ok(deleted)
    }
}
