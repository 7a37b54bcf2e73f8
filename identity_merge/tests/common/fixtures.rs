use chrono::{Duration, Utc};
use identity_merge::{
    Account, DocumentStore, EmailStatus, EmailStatusCode, IdentityResolver, InMemoryDataStore,
    ReferenceKind, ResolverConfig, TrackedReference, open_data_store,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;

use super::doubles::{RecordingAccessControl, RecordingNotifier};

/// A resolver wired to a fresh store and recording collaborators
pub struct TestEnv {
    pub store: Arc<dyn DocumentStore>,
    pub access: Arc<RecordingAccessControl>,
    pub notifier: Arc<RecordingNotifier>,
    pub resolver: IdentityResolver,
}

impl TestEnv {
    pub fn memory() -> Self {
        Self::build(Arc::new(InMemoryDataStore::new()), RecordingNotifier::default())
    }

    pub fn memory_with_notifier(notifier: RecordingNotifier) -> Self {
        Self::build(Arc::new(InMemoryDataStore::new()), notifier)
    }

    pub fn over_store(store: Arc<dyn DocumentStore>) -> Self {
        Self::build(store, RecordingNotifier::default())
    }

    pub async fn sqlite() -> Self {
        let store = open_data_store("sqlite", "sqlite::memory:", "test_")
            .await
            .expect("Failed to open SQLite store");
        Self::build(store, RecordingNotifier::default())
    }

    fn build(store: Arc<dyn DocumentStore>, notifier: RecordingNotifier) -> Self {
        let access = Arc::new(RecordingAccessControl::default());
        let notifier = Arc::new(notifier);
        let resolver = IdentityResolver::new(
            store.clone(),
            access.clone(),
            notifier.clone(),
            ResolverConfig::default(),
        );
        Self {
            store,
            access,
            notifier,
            resolver,
        }
    }

    pub async fn account(&self, id: &str) -> Option<Account> {
        self.resolver
            .accounts()
            .get_account(id)
            .await
            .expect("Failed to load account")
    }

    pub async fn account_count(&self) -> u64 {
        self.resolver
            .accounts()
            .count_accounts()
            .await
            .expect("Failed to count accounts")
    }

    /// Store a confirmed account created `age_days` ago
    pub async fn seed_account(&self, id: &str, email: &str, age_days: i64) -> Account {
        let mut account = Account::new(id.to_string(), format!("User {id}"), email.to_string());
        account.plan = "free".to_string();
        account.roles.insert("member".to_string());
        account.created_at = Utc::now() - Duration::days(age_days);
        self.save_account(account).await
    }

    /// Store an account whose local registration was never confirmed
    pub async fn seed_pending_registration(&self, id: &str, email: &str, token: &str) -> Account {
        let mut account = Account::new(id.to_string(), format!("Pending {id}"), email.to_string());
        account.is_active = false;
        account.email_status = EmailStatus {
            code: EmailStatusCode::PendingRegistration,
            token: Some(token.to_string()),
            expires_at: Some(Utc::now() + Duration::hours(2)),
            value: None,
        };
        self.save_account(account).await
    }

    pub async fn save_account(&self, account: Account) -> Account {
        self.resolver
            .accounts()
            .upsert_account(account)
            .await
            .expect("Failed to save account")
    }

    pub async fn save(&self, collection: &str, document: Value) {
        self.store
            .save(collection, document)
            .await
            .expect("Failed to save document");
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<Value> {
        self.store
            .get(collection, id)
            .await
            .expect("Failed to load document")
    }
}

/// Raw provider payloads as the providers send them
pub struct Profiles;

impl Profiles {
    pub fn google(sub: &str, email: &str, name: &str) -> Value {
        json!({
            "sub": sub,
            "email": email,
            "email_verified": true,
            "name": name,
            "picture": format!("https://lh3.googleusercontent.example/{sub}.png")
        })
    }

    pub fn github(id: u64, login: &str, emails: &[&str]) -> Value {
        json!({
            "id": id,
            "login": login,
            "name": null,
            "email": emails.first(),
            "emails": emails.iter().map(|e| json!({"email": e, "verified": true})).collect::<Vec<_>>(),
            "avatar_url": format!("https://avatars.githubusercontent.example/u/{id}")
        })
    }

    pub fn generic(id: &str, display_name: &str, emails: &[&str]) -> Value {
        json!({
            "id": id,
            "displayName": display_name,
            "emails": emails.iter().map(|e| json!({"value": e})).collect::<Vec<_>>()
        })
    }
}

/// A document in `reference.collection` that holds `account_id` at the
/// reference's path. Intermediate segments of nested paths are arrays.
pub fn document_with_reference(doc_id: &str, reference: &TrackedReference, account_id: &str) -> Value {
    let mut document = match &reference.kind {
        ReferenceKind::TopLevel { field } => nest(field, json!(account_id), false),
        ReferenceKind::Nested { path } => nest(path, json!(account_id), true),
        ReferenceKind::Owned { field, target, .. } => {
            let mut doc = nest(field, json!(account_id), false);
            doc[target.as_str()] = json!(format!("target-{doc_id}"));
            doc
        }
    };
    document["id"] = json!(doc_id);
    document["created_at"] = json!(Utc::now().to_rfc3339());
    document
}

fn nest(path: &str, leaf: Value, arrays: bool) -> Value {
    let segments: Vec<&str> = path.split('.').collect();
    let mut value = leaf;
    for (index, segment) in segments.iter().enumerate().rev() {
        let mut object = Map::new();
        object.insert(segment.to_string(), value);
        value = if arrays && index > 0 {
            json!([Value::Object(object)])
        } else {
            Value::Object(object)
        };
    }
    value
}
