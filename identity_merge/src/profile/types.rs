use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical view of a provider profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedProfile {
    /// Lowercased provider name
    pub provider: String,
    /// User id at the provider
    pub provider_id: String,
    /// Non-empty, deduplicated, lowercased emails; the first one is primary
    pub emails: Vec<String>,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    /// Payload exactly as received
    pub raw: Value,
}

impl NormalizedProfile {
    pub fn primary_email(&self) -> &str {
        self.emails.first().map(String::as_str).unwrap_or_default()
    }

    /// Name to show for this profile: display name, then username, then the
    /// local part of the primary email
    pub fn preferred_name(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| {
                self.primary_email()
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
    }
}

/// Payload shapes understood by the normalizer, selected by provider name
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProviderKind {
    Google,
    GitHub,
    /// Passport-style profile used by every other provider
    Generic(String),
}

impl ProviderKind {
    pub(crate) fn from_name(name: &str) -> Self {
        match name {
            "google" => Self::Google,
            "github" => Self::GitHub,
            other => Self::Generic(other.to_string()),
        }
    }
}

/// Fields extracted from a raw payload, before validation
#[derive(Debug, Default)]
pub(super) struct ProfileFields {
    pub(super) id: Option<String>,
    pub(super) emails: Vec<String>,
    pub(super) display_name: Option<String>,
    pub(super) username: Option<String>,
    pub(super) avatar_url: Option<String>,
}

// OIDC claims from Google
#[derive(Debug, Deserialize)]
pub(super) struct GoogleClaims {
    sub: Option<String>,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

impl From<GoogleClaims> for ProfileFields {
    fn from(claims: GoogleClaims) -> Self {
        let name = claims.name.or_else(|| {
            match (claims.given_name, claims.family_name) {
                (Some(given), Some(family)) => Some(format!("{given} {family}")),
                (given, family) => given.or(family),
            }
        });

        // An address Google reports as unverified proves nothing
        let emails = match claims.email_verified {
            Some(false) => Vec::new(),
            _ => claims.email.into_iter().collect(),
        };

        Self {
            id: claims.sub,
            emails,
            display_name: name,
            username: None,
            avatar_url: claims.picture,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum GitHubEmail {
    Plain(String),
    Entry {
        email: String,
        verified: Option<bool>,
    },
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubProfile {
    id: Option<Value>,
    login: Option<String>,
    name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    emails: Vec<GitHubEmail>,
    avatar_url: Option<String>,
}

impl From<GitHubProfile> for ProfileFields {
    fn from(profile: GitHubProfile) -> Self {
        let listed = profile.emails.into_iter().filter_map(|entry| match entry {
            GitHubEmail::Plain(email) => Some(email),
            GitHubEmail::Entry {
                verified: Some(false),
                ..
            } => None,
            GitHubEmail::Entry { email, .. } => Some(email),
        });

        Self {
            id: profile.id.as_ref().and_then(id_to_string),
            emails: profile.email.into_iter().chain(listed).collect(),
            display_name: profile.name,
            username: profile.login,
            avatar_url: profile.avatar_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ValueEntry {
    Plain(String),
    Entry { value: String },
}

impl ValueEntry {
    fn into_value(self) -> String {
        match self {
            Self::Plain(value) | Self::Entry { value } => value,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GenericProfile {
    id: Option<Value>,
    #[serde(alias = "displayName")]
    display_name: Option<String>,
    username: Option<String>,
    email: Option<String>,
    #[serde(default)]
    emails: Vec<ValueEntry>,
    #[serde(default)]
    photos: Vec<ValueEntry>,
}

impl From<GenericProfile> for ProfileFields {
    fn from(profile: GenericProfile) -> Self {
        Self {
            id: profile.id.as_ref().and_then(id_to_string),
            emails: profile
                .email
                .into_iter()
                .chain(profile.emails.into_iter().map(ValueEntry::into_value))
                .collect(),
            display_name: profile.display_name,
            username: profile.username,
            avatar_url: profile.photos.into_iter().next().map(ValueEntry::into_value),
        }
    }
}

/// Provider ids arrive as strings or numbers
fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
