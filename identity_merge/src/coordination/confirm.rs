use chrono::Utc;
use serde::Serialize;

use crate::account::{Account, AccountSearchField, EmailStatus, EmailStatusCode};
use crate::profile::normalize_emails;
use crate::storage::Filter;
use crate::utils::gen_random_string;

use super::errors::ResolutionError;
use super::resolver::IdentityResolver;

/// Result of confirming an email address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailConfirmation {
    pub account: Account,
    /// Accounts sharing the confirmed address that were merged in
    pub merged_count: usize,
    /// Pending registrations for the address that were deleted
    pub deleted_count: usize,
}

impl IdentityResolver {
    /// Register a local account whose email still needs confirming.
    /// Returns the account and the confirmation token to deliver.
    pub async fn register_local_account(
        &self,
        name: &str,
        email: &str,
    ) -> Result<(Account, String), ResolutionError> {
        let email = single_email(email)?;
        let token = gen_random_string(32)?;

        let id = self.accounts.gen_new_account_id().await?;
        let mut account = Account::new(id, name.trim().to_string(), email);
        account.is_active = false;
        account.plan = self.config.default_plan.clone();
        account.roles.insert(self.config.default_role.clone());
        account.email_status = EmailStatus {
            code: EmailStatusCode::PendingRegistration,
            token: Some(token.clone()),
            expires_at: Some(Utc::now() + self.config.confirmation_ttl),
            value: None,
        };

        let account = self.accounts.upsert_account(account).await?;
        tracing::info!(
            "Registered account {} <{}> pending confirmation",
            account.id,
            account.email
        );
        Ok((account, token))
    }

    /// Ask to change an account's primary email. The change applies once
    /// the returned token is confirmed.
    pub async fn request_email_update(
        &self,
        account_id: &str,
        new_email: &str,
    ) -> Result<String, ResolutionError> {
        let new_email = single_email(new_email)?;
        let mut account = self
            .accounts
            .get_account(account_id)
            .await?
            .ok_or_else(|| ResolutionError::account_not_found(account_id))?;

        let token = gen_random_string(32)?;
        account.email_status = EmailStatus {
            code: EmailStatusCode::PendingUpdate,
            token: Some(token.clone()),
            expires_at: Some(Utc::now() + self.config.confirmation_ttl),
            value: Some(new_email),
        };
        self.accounts.upsert_account(account).await?;

        tracing::debug!("Email update requested for account {}", account_id);
        Ok(token)
    }

    /// Confirm the email behind `token`, then fold every other account
    /// known by that address into the confirming one
    pub async fn confirm_email(&self, token: &str) -> Result<EmailConfirmation, ResolutionError> {
        if token.is_empty() {
            return Err(ResolutionError::InvalidToken);
        }

        let mut account = self
            .accounts
            .get_accounts_by(AccountSearchField::ConfirmationToken(token.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or(ResolutionError::InvalidToken)?;

        if account
            .email_status
            .expires_at
            .is_some_and(|expires_at| expires_at < Utc::now())
        {
            return Err(ResolutionError::TokenExpired.log());
        }

        let email = match account.email_status.code {
            EmailStatusCode::PendingRegistration => {
                account.is_active = true;
                account.email.clone()
            }
            EmailStatusCode::PendingUpdate => {
                let email = account
                    .email_status
                    .value
                    .clone()
                    .ok_or(ResolutionError::InvalidToken)?;
                account.email = email.clone();
                email
            }
            EmailStatusCode::Confirmed => return Err(ResolutionError::InvalidToken),
        };

        account.validate_emails([&email]);
        account.email_status = EmailStatus::confirmed();
        let mut account = self.accounts.upsert_account(account).await?;
        tracing::info!("Confirmed email {} for account {}", email, account.id);

        let emails = [email.clone()];
        let deleted_count = self
            .reap_pending_registrations(&emails, Some(&account.id))
            .await?;

        let others: Vec<Account> = self
            .accounts
            .find_accounts(&Filter::Or(vec![
                Filter::eq("emails", email.as_str()),
                Filter::eq("validated_emails", email.as_str()),
            ]))
            .await?
            .into_iter()
            .filter(|other| other.id != account.id && !other.is_pending_registration())
            .collect();

        let merged_count = others.len();
        if merged_count > 0 {
            let explanation = format!(
                "The email address {email} was confirmed for this account, \
                 so {merged_count} other account(s) using it were merged into it."
            );
            for other in others {
                (account, _) = self.merge(account, other, Some(&explanation)).await?;
            }
        }

        Ok(EmailConfirmation {
            account,
            merged_count,
            deleted_count,
        })
    }
}

fn single_email(email: &str) -> Result<String, ResolutionError> {
    normalize_emails([email.to_string()])
        .into_iter()
        .next()
        .ok_or_else(|| ResolutionError::InvalidEmail(email.to_string()))
}
