use crate::account::{Account, AccountSearchField};
use crate::profile::NormalizedProfile;
use crate::utils::gen_random_number;

use super::errors::ResolutionError;
use super::link::apply_provider_link;
use super::resolver::IdentityResolver;

const MAX_NAME_ATTEMPTS: usize = 5;

impl IdentityResolver {
    /// Create a new account for a profile nothing else matched
    pub(super) async fn materialize(
        &self,
        profile: &NormalizedProfile,
    ) -> Result<Account, ResolutionError> {
        let id = self.accounts.gen_new_account_id().await?;
        let name = self.unique_name(&profile.preferred_name(), &id).await?;

        let mut account = Account::new(id, name, profile.primary_email().to_string());
        account.plan = self.config.default_plan.clone();
        account.roles.insert(self.config.default_role.clone());
        if self.accounts.count_accounts().await? == 0 {
            account.roles.insert(self.config.root_role.clone());
        }
        apply_provider_link(&mut account, profile);

        let account = self.accounts.upsert_account(account).await?;
        let roles: Vec<String> = account.roles.iter().cloned().collect();
        self.access_control
            .add_user_roles(&account.id, &roles)
            .await?;

        tracing::info!(
            "Created account {} ({}) from {} login {}",
            account.id,
            account.name,
            profile.provider,
            profile.provider_id
        );
        Ok(account)
    }

    /// `base` if no account uses it yet, otherwise `base` with a random
    /// numeric suffix. Falls back to the new account id after a few collisions.
    async fn unique_name(&self, base: &str, account_id: &str) -> Result<String, ResolutionError> {
        let base = if base.trim().is_empty() {
            "user"
        } else {
            base.trim()
        };

        if !self.name_taken(base).await? {
            return Ok(base.to_string());
        }

        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = format!("{}{}", base, gen_random_number(1000)?);
            if !self.name_taken(&candidate).await? {
                return Ok(candidate);
            }
        }

        tracing::debug!("Name {} is crowded, falling back to the account id", base);
        Ok(format!("{base}-{account_id}"))
    }

    async fn name_taken(&self, name: &str) -> Result<bool, ResolutionError> {
        Ok(!self
            .accounts
            .get_accounts_by(AccountSearchField::Name(name.to_string()))
            .await?
            .is_empty())
    }
}
