use serde::Serialize;

use crate::account::Account;
use crate::config::ResolverConfig;
use crate::references::MigrationReport;

use super::errors::ResolutionError;
use super::resolver::IdentityResolver;

/// Outcome of folding one account into another
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    pub kept_id: String,
    pub removed_id: String,
    pub references: MigrationReport,
    /// Roles the surviving account did not have before
    pub roles_gained: Vec<String>,
    pub notified: bool,
}

/// Fold the evidence and balances of `discard` into `keep`.
/// Returns the roles `keep` gained.
pub(crate) fn merge_account_fields(
    keep: &mut Account,
    discard: &Account,
    config: &ResolverConfig,
) -> Vec<String> {
    keep.plan = config.higher_plan(&keep.plan, &discard.plan).to_string();
    keep.is_active = keep.is_active && discard.is_active;

    keep.emails.extend(discard.emails.iter().cloned());
    keep.validated_emails
        .extend(discard.validated_emails.iter().cloned());

    let roles_gained: Vec<String> = discard.roles.difference(&keep.roles).cloned().collect();
    keep.roles.extend(roles_gained.iter().cloned());

    if keep.password_hash.is_none() {
        keep.password_hash = discard.password_hash.clone();
    }

    for (provider, identity) in &discard.providers {
        keep.providers
            .entry(provider.clone())
            .or_insert_with(|| identity.clone());
    }

    keep.counter.absorb(&discard.counter);
    keep.credits += discard.credits;

    roles_gained
}

impl IdentityResolver {
    /// Merge `discard_id` into `keep_id` and delete `discard_id`.
    ///
    /// A merge notice is sent to the survivor only when an explanation is given.
    pub async fn merge_accounts(
        &self,
        keep_id: &str,
        discard_id: &str,
        explanation: Option<&str>,
    ) -> Result<(Account, MergeReport), ResolutionError> {
        if keep_id == discard_id {
            return Err(ResolutionError::SelfMerge(keep_id.to_string()).log());
        }

        let keep = self
            .accounts
            .get_account(keep_id)
            .await?
            .ok_or_else(|| ResolutionError::account_not_found(keep_id))?;
        let discard = self
            .accounts
            .get_account(discard_id)
            .await?
            .ok_or_else(|| ResolutionError::account_not_found(discard_id))?;

        self.merge(keep, discard, explanation).await
    }

    pub(super) async fn merge(
        &self,
        mut keep: Account,
        discard: Account,
        explanation: Option<&str>,
    ) -> Result<(Account, MergeReport), ResolutionError> {
        if keep.id == discard.id {
            return Err(ResolutionError::SelfMerge(keep.id).log());
        }

        // Discard stays intact until everything pointing at it has moved,
        // so every step up to its deletion can be repeated
        let references = self.migrator.migrate(&discard.id, &keep.id).await?;

        let roles_gained = merge_account_fields(&mut keep, &discard, &self.config);
        let keep = self.accounts.upsert_account(keep).await?;

        let notified = match explanation {
            Some(explanation) => self.notify_merge(&keep, &discard, explanation).await,
            None => false,
        };

        self.accounts.delete_account(&discard.id).await?;
        let discard_roles: Vec<String> = discard.roles.iter().cloned().collect();
        self.access_control
            .remove_user_roles(&discard.id, &discard_roles)
            .await?;
        if !roles_gained.is_empty() {
            self.access_control
                .add_user_roles(&keep.id, &roles_gained)
                .await?;
        }

        tracing::info!(
            "Merged account {} into {}: {} top-level and {} nested references moved, {} owned records moved, {} ratings averaged, {} stars removed",
            discard.id,
            keep.id,
            references.top_level_rewritten,
            references.nested_rewritten,
            references.owned_rewritten,
            references.duplicates_averaged,
            references.duplicates_removed
        );

        let report = MergeReport {
            kept_id: keep.id.clone(),
            removed_id: discard.id,
            references,
            roles_gained,
            notified,
        };
        Ok((keep, report))
    }

    // Notice delivery is best effort and never fails the merge
    async fn notify_merge(&self, survivor: &Account, removed: &Account, explanation: &str) -> bool {
        match self
            .notifier
            .send_account_merged_notice(survivor, removed, explanation)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "Failed to send merge notice to account {}: {}",
                    survivor.id,
                    e
                );
                false
            }
        }
    }
}
