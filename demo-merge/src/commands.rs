use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

use identity_merge::{AccountSummary, DocumentStore, Filter, IdentityResolver, ResolutionError};

pub(crate) enum Command {
    Login {
        provider: String,
        profile_path: String,
        caller: Option<String>,
    },
    Resolve {
        provider: String,
        profile_path: String,
        keep_id: String,
    },
    Merge {
        keep_id: String,
        discard_id: String,
        explanation: Option<String>,
    },
    Register {
        name: String,
        email: String,
    },
    Confirm {
        token: String,
    },
    Seed {
        account_id: String,
        target_id: String,
    },
    List,
}

impl Command {
    pub(crate) fn parse(args: &[String]) -> Option<Self> {
        let arg = |i: usize| args.get(i).cloned();
        let command = match args.first()?.as_str() {
            "login" => {
                let caller = match (args.get(3).map(String::as_str), arg(4)) {
                    (Some("--as"), Some(id)) => Some(id),
                    (None, _) => None,
                    _ => return None,
                };
                Self::Login {
                    provider: arg(1)?,
                    profile_path: arg(2)?,
                    caller,
                }
            }
            "resolve" => Self::Resolve {
                provider: arg(1)?,
                profile_path: arg(2)?,
                keep_id: arg(3)?,
            },
            "merge" => Self::Merge {
                keep_id: arg(1)?,
                discard_id: arg(2)?,
                explanation: arg(3),
            },
            "register" => Self::Register {
                name: arg(1)?,
                email: arg(2)?,
            },
            "confirm" => Self::Confirm { token: arg(1)? },
            "seed" => Self::Seed {
                account_id: arg(1)?,
                target_id: arg(2)?,
            },
            "list" => Self::List,
            _ => return None,
        };
        Some(command)
    }
}

fn read_profile(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub(crate) async fn run(
    command: Command,
    resolver: &IdentityResolver,
    store: Arc<dyn DocumentStore>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let output = match command {
        Command::Login {
            provider,
            profile_path,
            caller,
        } => {
            let raw = read_profile(&profile_path)?;
            let caller = match caller {
                Some(id) => Some(
                    resolver
                        .accounts()
                        .get_account(&id)
                        .await?
                        .ok_or_else(|| format!("No account {id}"))?,
                ),
                None => None,
            };

            match resolver
                .resolve_oauth_profile(&provider, &raw, caller.as_ref())
                .await
            {
                Ok(account) => serde_json::to_value(account)?,
                // A conflict is an answer, not a failure
                Err(ResolutionError::MergeConflict(conflict)) => json!({ "conflict": conflict }),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Resolve {
            provider,
            profile_path,
            keep_id,
        } => {
            let raw = read_profile(&profile_path)?;
            let account = resolver
                .resolve_merge_conflict(&provider, &raw, &keep_id)
                .await?;
            serde_json::to_value(account)?
        }
        Command::Merge {
            keep_id,
            discard_id,
            explanation,
        } => {
            let (account, report) = resolver
                .merge_accounts(&keep_id, &discard_id, explanation.as_deref())
                .await?;
            json!({ "account": account, "report": report })
        }
        Command::Register { name, email } => {
            let (account, token) = resolver.register_local_account(&name, &email).await?;
            json!({ "account": account, "token": token })
        }
        Command::Confirm { token } => serde_json::to_value(resolver.confirm_email(&token).await?)?,
        Command::Seed {
            account_id,
            target_id,
        } => {
            // Some content owned by the account, so merges have something to move
            let now = Utc::now().to_rfc3339();
            let comment = json!({
                "id": Uuid::new_v4().to_string(),
                "from": account_id,
                "message": "Great table!",
                "created_at": now,
            });
            let rating = json!({
                "id": Uuid::new_v4().to_string(),
                "from": account_id,
                "target": target_id,
                "value": 8,
                "created_at": now,
            });
            let star = json!({
                "id": Uuid::new_v4().to_string(),
                "from": account_id,
                "target": target_id,
                "created_at": now,
            });
            store.save("comments", comment.clone()).await?;
            store.save("ratings", rating.clone()).await?;
            store.save("stars", star.clone()).await?;
            tracing::info!("Seeded content for account {}", account_id);
            json!({ "comments": [comment], "ratings": [rating], "stars": [star] })
        }
        Command::List => {
            let accounts = resolver.accounts().find_accounts(&Filter::All).await?;
            let summaries: Vec<AccountSummary> = accounts.iter().map(AccountSummary::from).collect();
            serde_json::to_value(summaries)?
        }
    };
    Ok(output)
}
