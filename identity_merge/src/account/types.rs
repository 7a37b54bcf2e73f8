use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Represents a canonical user identity in the system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    /// Unique account identifier
    pub id: String,
    /// Display name, unique across accounts
    pub name: String,
    /// Primary email address
    pub email: String,
    /// Confirmation state of the primary email
    pub email_status: EmailStatus,
    /// Every email address ever collected for this account
    #[serde(default)]
    pub emails: BTreeSet<String>,
    /// Email addresses proven through confirmation or a provider login
    #[serde(default)]
    pub validated_emails: BTreeSet<String>,
    /// Linked external identities, keyed by provider name
    #[serde(default)]
    pub providers: BTreeMap<String, LinkedProviderIdentity>,
    pub is_active: bool,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    pub plan: String,
    #[serde(default)]
    pub credits: i64,
    #[serde(default)]
    pub counter: AccountCounters,
    /// Local password credential. Hashing happens elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatusCode {
    Confirmed,
    PendingRegistration,
    PendingUpdate,
}

impl EmailStatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::PendingRegistration => "pending_registration",
            Self::PendingUpdate => "pending_update",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailStatus {
    pub code: EmailStatusCode,
    /// Confirmation token, present while a confirmation is pending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Requested new primary email for `PendingUpdate`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl EmailStatus {
    pub fn confirmed() -> Self {
        Self {
            code: EmailStatusCode::Confirmed,
            token: None,
            expires_at: None,
            value: None,
        }
    }
}

/// An external identity linked to an account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkedProviderIdentity {
    /// User id at the provider
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    /// Raw profile snapshot as received from the provider
    #[serde(default)]
    pub profile: Value,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountCounters {
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub downloads: i64,
    #[serde(default)]
    pub stars: i64,
}

impl AccountCounters {
    pub fn absorb(&mut self, other: &Self) {
        self.comments += other.comments;
        self.downloads += other.downloads;
        self.stars += other.stars;
    }
}

/// Public view of an account, used where accounts are listed back to a caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub providers: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            providers: account.providers.keys().cloned().collect(),
            created_at: account.created_at,
        }
    }
}

impl Account {
    /// Create a new, confirmed and active account without roles or plan
    pub fn new(id: String, name: String, email: String) -> Self {
        let now = Utc::now();
        let email = email.trim().to_lowercase();
        Self {
            id,
            name,
            emails: BTreeSet::from([email.clone()]),
            validated_emails: BTreeSet::new(),
            email,
            email_status: EmailStatus::confirmed(),
            providers: BTreeMap::new(),
            is_active: true,
            roles: BTreeSet::new(),
            plan: String::new(),
            credits: 0,
            counter: AccountCounters::default(),
            password_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending_registration(&self) -> bool {
        self.email_status.code == EmailStatusCode::PendingRegistration
    }

    /// Provider user id linked for `provider`, if any
    pub fn provider_id(&self, provider: &str) -> Option<&str> {
        self.providers.get(provider).map(|p| p.id.as_str())
    }

    /// Add emails to the collected set, returning how many were new
    pub fn collect_emails<'a>(&mut self, emails: impl IntoIterator<Item = &'a String>) -> usize {
        emails
            .into_iter()
            .filter(|email| self.emails.insert((*email).clone()))
            .count()
    }

    /// Add emails to both the collected and the validated sets
    pub fn validate_emails<'a>(&mut self, emails: impl IntoIterator<Item = &'a String> + Clone) {
        self.collect_emails(emails.clone());
        self.validated_emails
            .extend(emails.into_iter().cloned());
    }
}
