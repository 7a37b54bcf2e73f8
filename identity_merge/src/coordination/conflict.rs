use serde::Serialize;

use crate::account::{Account, AccountSummary};
use crate::profile::NormalizedProfile;

use super::errors::ResolutionError;

/// Several existing accounts match one login and none can be preferred
/// automatically. The caller resubmits with the id of the account to keep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeConflict {
    pub explanation: String,
    pub candidates: Vec<AccountSummary>,
}

impl MergeConflict {
    pub(super) fn new(profile: &NormalizedProfile, candidates: &[Account]) -> Self {
        Self {
            explanation: merge_explanation(profile, candidates.len()),
            candidates: candidates.iter().map(AccountSummary::from).collect(),
        }
    }

    pub fn candidate_ids(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.id.as_str()).collect()
    }
}

/// Text shown to the user when asked to pick, and sent along with merge notices
pub(super) fn merge_explanation(profile: &NormalizedProfile, count: usize) -> String {
    format!(
        "Logging in with {} as {} matched {} existing accounts. \
         They are merged into the account you choose to keep.",
        profile.provider,
        profile.emails.join(", "),
        count
    )
}

pub(super) fn escalate(profile: &NormalizedProfile, candidates: &[Account]) -> ResolutionError {
    let conflict = MergeConflict::new(profile, candidates);
    tracing::debug!(
        "Escalating {} login {} to the caller, candidates {:?}",
        profile.provider,
        profile.provider_id,
        conflict.candidate_ids()
    );
    ResolutionError::MergeConflict(conflict)
}
