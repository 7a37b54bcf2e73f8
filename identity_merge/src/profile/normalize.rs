use serde_json::Value;

use crate::account::Account;

use super::errors::ProfileError;
use super::types::{
    GenericProfile, GitHubProfile, GoogleClaims, NormalizedProfile, ProfileFields, ProviderKind,
};

/// Canonicalize a raw provider payload
pub fn normalize_profile(provider: &str, raw: &Value) -> Result<NormalizedProfile, ProfileError> {
    let provider = provider.trim().to_lowercase();
    if provider.is_empty() {
        return Err(ProfileError::ProfileIncomplete(
            "Provider name is empty".to_string(),
        ));
    }
    // Provider names become document path segments
    if !provider
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ProfileError::InvalidPayload(format!(
            "Invalid provider name: {provider}"
        )));
    }

    let fields: ProfileFields = match ProviderKind::from_name(&provider) {
        ProviderKind::Google => serde_json::from_value::<GoogleClaims>(raw.clone())?.into(),
        ProviderKind::GitHub => serde_json::from_value::<GitHubProfile>(raw.clone())?.into(),
        ProviderKind::Generic(name) => {
            tracing::debug!("Reading {} profile as a generic payload", name);
            serde_json::from_value::<GenericProfile>(raw.clone())?.into()
        }
    };

    let provider_id = fields
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            ProfileError::ProfileIncomplete(format!("{provider} profile has no user id"))
        })?;

    let emails = normalize_emails(fields.emails);
    if emails.is_empty() {
        return Err(ProfileError::ProfileIncomplete(format!(
            "{provider} profile has no usable email address"
        )));
    }

    Ok(NormalizedProfile {
        provider,
        provider_id,
        emails,
        display_name: non_blank(fields.display_name),
        username: non_blank(fields.username),
        avatar_url: non_blank(fields.avatar_url),
        raw: raw.clone(),
    })
}

/// Reject a profile whose id differs from the one the caller already linked
/// for the same provider
pub fn check_provider_identity(
    profile: &NormalizedProfile,
    caller: Option<&Account>,
) -> Result<(), ProfileError> {
    let Some(caller) = caller else {
        return Ok(());
    };

    match caller.provider_id(&profile.provider) {
        Some(linked) if linked != profile.provider_id => {
            tracing::warn!(
                "Account {} already links {} identity {}, refusing {}",
                caller.id,
                profile.provider,
                linked,
                profile.provider_id
            );
            Err(ProfileError::ProviderIdentityConflict {
                provider: profile.provider.clone(),
            })
        }
        _ => Ok(()),
    }
}

/// Trim, lowercase and deduplicate, keeping first-seen order
pub(crate) fn normalize_emails(emails: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for email in emails {
        let email = email.trim().to_lowercase();
        if is_plausible_email(&email) && !normalized.contains(&email) {
            normalized.push(email);
        }
    }
    normalized
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
