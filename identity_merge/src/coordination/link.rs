use chrono::Utc;

use crate::account::{Account, LinkedProviderIdentity};
use crate::profile::NormalizedProfile;

use super::errors::ResolutionError;
use super::resolver::IdentityResolver;

/// Record the provider identity on the account. Logging in through a
/// provider proves the addresses it reports, so they become validated.
pub(crate) fn apply_provider_link(account: &mut Account, profile: &NormalizedProfile) {
    let now = Utc::now();
    let created_at = account
        .providers
        .get(&profile.provider)
        .map_or(now, |linked| linked.created_at);

    account.providers.insert(
        profile.provider.clone(),
        LinkedProviderIdentity {
            id: profile.provider_id.clone(),
            name: Some(profile.preferred_name()),
            emails: profile.emails.clone(),
            profile: profile.raw.clone(),
            created_at,
            modified_at: now,
        },
    );
    account.validate_emails(&profile.emails);

    if account.name.trim().is_empty() {
        account.name = profile.preferred_name();
    }
}

impl IdentityResolver {
    /// Link or refresh a provider identity on an account and persist it
    pub async fn link_provider(
        &self,
        mut account: Account,
        profile: &NormalizedProfile,
    ) -> Result<Account, ResolutionError> {
        let relinked = account.providers.contains_key(&profile.provider);
        apply_provider_link(&mut account, profile);
        let account = self.accounts.upsert_account(account).await?;

        tracing::debug!(
            "{} {} identity {} on account {}",
            if relinked { "Refreshed" } else { "Linked" },
            profile.provider,
            profile.provider_id,
            account.id
        );
        Ok(account)
    }
}
