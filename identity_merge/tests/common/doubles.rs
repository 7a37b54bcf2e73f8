use async_trait::async_trait;
use identity_merge::{
    AccessControl, Account, Document, DocumentStore, Filter, Notifier, ServiceError, StorageError,
    Update,
};
use std::sync::{Arc, Mutex};

/// Remembers every role grant and revocation
#[derive(Default)]
pub struct RecordingAccessControl {
    granted: Mutex<Vec<(String, Vec<String>)>>,
    revoked: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingAccessControl {
    pub fn granted(&self) -> Vec<(String, Vec<String>)> {
        self.granted.lock().unwrap().clone()
    }

    pub fn revoked(&self) -> Vec<(String, Vec<String>)> {
        self.revoked.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccessControl for RecordingAccessControl {
    async fn add_user_roles(&self, account_id: &str, roles: &[String]) -> Result<(), ServiceError> {
        self.granted
            .lock()
            .unwrap()
            .push((account_id.to_string(), roles.to_vec()));
        Ok(())
    }

    async fn remove_user_roles(
        &self,
        account_id: &str,
        roles: &[String],
    ) -> Result<(), ServiceError> {
        self.revoked
            .lock()
            .unwrap()
            .push((account_id.to_string(), roles.to_vec()));
        Ok(())
    }
}

/// A merge notice as it was handed to the notifier
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotice {
    pub survivor: String,
    pub removed: String,
    pub explanation: String,
}

/// Records merge notices, or fails every send when built with `failing()`
#[derive(Default)]
pub struct RecordingNotifier {
    fail: bool,
    sent: Mutex<Vec<SentNotice>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<SentNotice> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_account_merged_notice(
        &self,
        survivor: &Account,
        removed: &Account,
        explanation: &str,
    ) -> Result<(), ServiceError> {
        if self.fail {
            return Err(ServiceError::Notification("SMTP relay refused".to_string()));
        }
        self.sent.lock().unwrap().push(SentNotice {
            survivor: survivor.id.clone(),
            removed: removed.id.clone(),
            explanation: explanation.to_string(),
        });
        Ok(())
    }
}

/// Delegates to an inner store, but bulk updates on one collection fail
/// until `heal()` is called
pub struct FlakyStore {
    inner: Arc<dyn DocumentStore>,
    broken: Mutex<Option<String>>,
}

impl FlakyStore {
    pub fn failing_updates_on(inner: Arc<dyn DocumentStore>, collection: &str) -> Self {
        Self {
            inner,
            broken: Mutex::new(Some(collection.to_string())),
        }
    }

    pub fn heal(&self) {
        *self.broken.lock().unwrap() = None;
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn init(&self) -> Result<(), StorageError> {
        self.inner.init().await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError> {
        self.inner.get(collection, id).await
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StorageError> {
        self.inner.find(collection, filter).await
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, StorageError> {
        let broken = self.broken.lock().unwrap().as_deref() == Some(collection);
        if broken {
            return Err(StorageError::Storage(format!(
                "connection reset while updating {collection}"
            )));
        }
        self.inner.update_many(collection, filter, update).await
    }

    async fn save(&self, collection: &str, document: Document) -> Result<(), StorageError> {
        self.inner.save(collection, document).await
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        self.inner.remove(collection, id).await
    }
}
