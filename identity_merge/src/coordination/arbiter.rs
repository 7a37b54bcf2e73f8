use serde_json::Value;

use crate::account::Account;
use crate::profile::{NormalizedProfile, check_provider_identity, normalize_profile};

use super::conflict::{escalate, merge_explanation};
use super::errors::ResolutionError;
use super::resolver::IdentityResolver;

impl IdentityResolver {
    /// Resolve a provider login to exactly one account.
    ///
    /// 1. Normalize the payload and check it against the caller's links
    /// 2. Delete pending registrations colliding by email
    /// 3. Find accounts sharing a signal with the profile
    /// 4. Decide:
    ///    - signed in: fold every candidate into the caller and link the provider
    ///    - no candidate: create an account
    ///    - one candidate: link the provider to it
    ///    - several: hand the choice back as [`ResolutionError::MergeConflict`]
    pub async fn resolve_oauth_profile(
        &self,
        provider: &str,
        raw: &Value,
        caller: Option<&Account>,
    ) -> Result<Account, ResolutionError> {
        let profile = normalize_profile(provider, raw)?;
        check_provider_identity(&profile, caller)?;

        let caller_id = caller.map(|c| c.id.as_str());
        self.reap_pending_registrations(&profile.emails, caller_id)
            .await?;
        let candidates = self.find_candidates(&profile, caller_id).await?;

        match (caller, candidates.len()) {
            (Some(caller), count) => {
                ensure_no_foreign_link(&profile, &candidates)?;
                tracing::debug!(
                    "Signed-in account {} absorbs {} matching accounts",
                    caller.id,
                    count
                );
                // Work on the stored copy, the caller's may be stale
                let mut keep = self
                    .accounts
                    .get_account(&caller.id)
                    .await?
                    .ok_or_else(|| ResolutionError::account_not_found(&caller.id))?;
                for candidate in candidates {
                    (keep, _) = self.merge(keep, candidate, None).await?;
                }
                self.link_provider(keep, &profile).await
            }
            (None, 0) => {
                tracing::debug!("No account matches {} login, creating one", profile.provider);
                self.materialize(&profile).await
            }
            (None, 1) => {
                let mut candidates = candidates;
                let account = candidates.remove(0);
                ensure_no_foreign_link(&profile, std::slice::from_ref(&account))?;
                tracing::debug!(
                    "Signing in as {} through {}",
                    account.id,
                    profile.provider
                );
                self.link_provider(account, &profile).await
            }
            (None, _) => Err(escalate(&profile, &candidates)),
        }
    }

    /// Settle a [`ResolutionError::MergeConflict`] by keeping `keep_id` and
    /// merging every other current candidate into it
    pub async fn resolve_merge_conflict(
        &self,
        provider: &str,
        raw: &Value,
        keep_id: &str,
    ) -> Result<Account, ResolutionError> {
        let profile = normalize_profile(provider, raw)?;
        self.reap_pending_registrations(&profile.emails, None)
            .await?;

        // Candidates may have changed since the conflict was raised
        let candidates = self.find_candidates(&profile, None).await?;
        ensure_no_foreign_link(&profile, &candidates)?;
        let (mut survivor, others) = split_survivor(candidates, keep_id).ok_or_else(|| {
            ResolutionError::InvalidMergeSelection(format!(
                "Account {keep_id} is not among the accounts matching this login"
            ))
            .log()
        })?;

        let explanation = merge_explanation(&profile, others.len() + 1);
        for other in others {
            (survivor, _) = self.merge(survivor, other, Some(&explanation)).await?;
        }
        self.link_provider(survivor, &profile).await
    }
}

/// Linking must never replace another identity of the same provider, neither
/// on the account itself nor on one about to be merged into it
fn ensure_no_foreign_link(
    profile: &NormalizedProfile,
    accounts: &[Account],
) -> Result<(), ResolutionError> {
    for account in accounts {
        check_provider_identity(profile, Some(account))?;
    }
    Ok(())
}

fn split_survivor(mut candidates: Vec<Account>, keep_id: &str) -> Option<(Account, Vec<Account>)> {
    let index = candidates.iter().position(|c| c.id == keep_id)?;
    let survivor = candidates.remove(index);
    Some((survivor, candidates))
}
