use crate::account::Account;
use crate::profile::NormalizedProfile;
use crate::storage::Filter;

use super::errors::ResolutionError;
use super::resolver::IdentityResolver;

/// Accounts sharing an identity signal with a profile: the linked provider
/// id, or any collected or validated email
pub(crate) fn candidate_filter(profile: &NormalizedProfile) -> Filter {
    let emails = profile.emails.iter().map(String::as_str);
    Filter::Or(vec![
        Filter::eq(
            format!("providers.{}.id", profile.provider),
            profile.provider_id.as_str(),
        ),
        Filter::one_of("emails", emails.clone()),
        Filter::one_of("validated_emails", emails),
    ])
}

impl IdentityResolver {
    /// Existing accounts matching `profile`, oldest first. Runs after the
    /// reaper; pending registrations never count.
    pub(super) async fn find_candidates(
        &self,
        profile: &NormalizedProfile,
        exclude: Option<&str>,
    ) -> Result<Vec<Account>, ResolutionError> {
        let candidates: Vec<Account> = self
            .accounts
            .find_accounts(&candidate_filter(profile))
            .await?
            .into_iter()
            .filter(|account| Some(account.id.as_str()) != exclude)
            .filter(|account| !account.is_pending_registration())
            .collect();

        tracing::debug!(
            "Found {} candidate accounts for {} login {}",
            candidates.len(),
            profile.provider,
            profile.provider_id
        );
        Ok(candidates)
    }
}
