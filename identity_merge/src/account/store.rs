use chrono::Utc;
use std::sync::Arc;

use crate::storage::{COLLECTION_ACCOUNTS, DocumentStore, Filter};
use crate::utils::gen_random_string;

use super::errors::AccountError;
use super::types::{Account, EmailStatusCode};

/// Search field options for account lookup
#[derive(Debug, Clone)]
pub enum AccountSearchField {
    /// Search by account ID
    Id(String),
    /// Search by display name
    Name(String),
    /// Search by primary email
    Email(String),
    /// Search by any collected email
    CollectedEmail(String),
    /// Search by any validated email
    ValidatedEmail(String),
    /// Search by the user id linked for a provider
    Provider {
        provider: String,
        provider_user_id: String,
    },
    /// Search by pending email confirmation token
    ConfirmationToken(String),
    /// Search by email status
    EmailStatus(EmailStatusCode),
}

impl AccountSearchField {
    pub(crate) fn to_filter(&self) -> Filter {
        match self {
            Self::Id(id) => Filter::eq("id", id.as_str()),
            Self::Name(name) => Filter::eq("name", name.as_str()),
            Self::Email(email) => Filter::eq("email", email.as_str()),
            Self::CollectedEmail(email) => Filter::eq("emails", email.as_str()),
            Self::ValidatedEmail(email) => Filter::eq("validated_emails", email.as_str()),
            Self::Provider {
                provider,
                provider_user_id,
            } => Filter::eq(
                format!("providers.{provider}.id"),
                provider_user_id.as_str(),
            ),
            Self::ConfirmationToken(token) => Filter::eq("email_status.token", token.as_str()),
            Self::EmailStatus(code) => Filter::eq("email_status.code", code.as_str()),
        }
    }
}

/// Account repository over an injected document store
#[derive(Clone)]
pub struct AccountStore {
    store: Arc<dyn DocumentStore>,
}

impl AccountStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub(crate) fn document_store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// Get an account by its ID
    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, AccountError> {
        self.store
            .get(COLLECTION_ACCOUNTS, id)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(AccountError::from)
    }

    pub async fn get_accounts_by(
        &self,
        field: AccountSearchField,
    ) -> Result<Vec<Account>, AccountError> {
        self.find_accounts(&field.to_filter()).await
    }

    /// Accounts matching an arbitrary filter, oldest first
    pub async fn find_accounts(&self, filter: &Filter) -> Result<Vec<Account>, AccountError> {
        let mut accounts = self
            .store
            .find(COLLECTION_ACCOUNTS, filter)
            .await?
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Account>, _>>()?;

        accounts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(accounts)
    }

    pub async fn count_accounts(&self) -> Result<u64, AccountError> {
        Ok(self.store.count(COLLECTION_ACCOUNTS, &Filter::All).await?)
    }

    /// Create or update an account
    pub async fn upsert_account(&self, mut account: Account) -> Result<Account, AccountError> {
        if account.id.is_empty() {
            return Err(AccountError::InvalidData(
                "Account id must be set before upserting".to_string(),
            ));
        }

        account.updated_at = Utc::now();
        let document = serde_json::to_value(&account)?;
        self.store.save(COLLECTION_ACCOUNTS, document).await?;
        Ok(account)
    }

    /// Delete an account. Returns false if it was already gone.
    pub async fn delete_account(&self, id: &str) -> Result<bool, AccountError> {
        Ok(self.store.remove(COLLECTION_ACCOUNTS, id).await?)
    }

    /// Generate a unique account ID, with built-in collision detection
    pub async fn gen_new_account_id(&self) -> Result<String, AccountError> {
        // Try up to 3 times to generate a unique ID
        for _ in 0..3 {
            let id = gen_random_string(16).map_err(|e| AccountError::Storage(e.to_string()))?;

            match self.get_account(&id).await? {
                None => return Ok(id),
                Some(_) => continue,
            }
        }

        Err(AccountError::Storage(
            "Failed to generate a unique account ID after multiple attempts".to_string(),
        ))
    }
}
