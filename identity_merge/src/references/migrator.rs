use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::storage::{
    Document, DocumentStore, Filter, StorageError, Update, document_id, replace_at_path,
};

use super::errors::MigrationError;
use super::registry::{
    CREATED_AT_FIELD, DuplicatePolicy, ReferenceKind, ReferenceRegistry, TrackedReference,
};

/// Counts of what a migration touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Documents whose top-level reference was rewritten
    pub top_level_rewritten: u64,
    /// Embedded references rewritten inside nested entries
    pub nested_rewritten: u64,
    /// Owned records handed over to the surviving account
    pub owned_rewritten: u64,
    /// Duplicate records folded into an averaged survivor (ratings)
    pub duplicates_averaged: u64,
    /// Duplicate records dropped in favor of the earliest one (stars)
    pub duplicates_removed: u64,
}

impl MigrationReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Moves every reference from one account to another across the registry.
///
/// Each step is idempotent, so an interrupted migration can simply be run
/// again with the same ids.
#[derive(Clone)]
pub struct ReferenceMigrator {
    store: Arc<dyn DocumentStore>,
    registry: ReferenceRegistry,
}

impl ReferenceMigrator {
    pub fn new(store: Arc<dyn DocumentStore>, registry: ReferenceRegistry) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &ReferenceRegistry {
        &self.registry
    }

    /// Rewrite every reference to `from_id` so it points at `to_id`, then
    /// repair per-target uniqueness of owned records
    pub async fn migrate(
        &self,
        from_id: &str,
        to_id: &str,
    ) -> Result<MigrationReport, MigrationError> {
        let mut report = MigrationReport::default();
        let from = Value::String(from_id.to_string());
        let to = Value::String(to_id.to_string());

        // Top-level keys first, then embedded ones, then owned records
        for reference in self.registry.references() {
            if let ReferenceKind::TopLevel { field } = &reference.kind {
                report.top_level_rewritten += self
                    .rewrite_field(reference, field, &from, &to)
                    .await?;
            }
        }

        for reference in self.registry.references() {
            if let ReferenceKind::Nested { path } = &reference.kind {
                report.nested_rewritten += self
                    .rewrite_nested(reference, path, &from, &to)
                    .await?;
            }
        }

        for reference in self.registry.references() {
            if let ReferenceKind::Owned {
                field,
                target,
                policy,
            } = &reference.kind
            {
                report.owned_rewritten += self
                    .rewrite_field(reference, field, &from, &to)
                    .await?;

                let folded = self
                    .fold_duplicates(reference, field, target, policy, &to)
                    .await?;
                match policy {
                    DuplicatePolicy::Average { .. } => report.duplicates_averaged += folded,
                    DuplicatePolicy::KeepOne => report.duplicates_removed += folded,
                }
            }
        }

        tracing::debug!(
            "Migrated references from {} to {}: {:?}",
            from_id,
            to_id,
            report
        );
        Ok(report)
    }

    async fn rewrite_field(
        &self,
        reference: &TrackedReference,
        field: &str,
        from: &Value,
        to: &Value,
    ) -> Result<u64, MigrationError> {
        self.store
            .update_many(
                &reference.collection,
                &Filter::Eq(field.to_string(), from.clone()),
                &Update::Set(field.to_string(), to.clone()),
            )
            .await
            .map_err(|e| failure(reference, e))
    }

    // Nested entries live inside arrays, so the whole owning document is
    // loaded, patched and saved back
    async fn rewrite_nested(
        &self,
        reference: &TrackedReference,
        path: &str,
        from: &Value,
        to: &Value,
    ) -> Result<u64, MigrationError> {
        let documents = self
            .store
            .find(
                &reference.collection,
                &Filter::Eq(path.to_string(), from.clone()),
            )
            .await
            .map_err(|e| failure(reference, e))?;

        let mut rewritten = 0;
        for mut document in documents {
            let replaced = replace_at_path(&mut document, path, from, to);
            if replaced == 0 {
                continue;
            }
            self.store
                .save(&reference.collection, document)
                .await
                .map_err(|e| failure(reference, e))?;
            rewritten += replaced as u64;
        }
        Ok(rewritten)
    }

    /// Fold records owned by `owner` that share a target. Returns how many
    /// records were deleted.
    async fn fold_duplicates(
        &self,
        reference: &TrackedReference,
        field: &str,
        target: &str,
        policy: &DuplicatePolicy,
        owner: &Value,
    ) -> Result<u64, MigrationError> {
        let documents = self
            .store
            .find(
                &reference.collection,
                &Filter::Eq(field.to_string(), owner.clone()),
            )
            .await
            .map_err(|e| failure(reference, e))?;

        let mut groups: BTreeMap<String, Vec<Document>> = BTreeMap::new();
        for document in documents {
            // Without a target there is nothing to be a duplicate of
            let Some(key) = document
                .get(target)
                .filter(|value| !value.is_null())
                .map(Value::to_string)
            else {
                continue;
            };
            groups.entry(key).or_default().push(document);
        }

        let mut removed = 0;
        for (key, mut group) in groups {
            if group.len() < 2 {
                continue;
            }
            group.sort_by(|a, b| creation_key(a).cmp(&creation_key(b)));
            let mut survivor = group.remove(0);

            if let DuplicatePolicy::Average { value_field } = policy {
                let values: Vec<f64> = std::iter::once(&survivor)
                    .chain(group.iter())
                    .filter_map(|doc| doc.get(value_field.as_str()).and_then(Value::as_f64))
                    .collect();
                if !values.is_empty() {
                    let mean = round_half_away(values.iter().sum::<f64>() / values.len() as f64);
                    set_field(&mut survivor, value_field, Value::from(mean))
                        .map_err(|e| failure(reference, e))?;
                }
                self.store
                    .save(&reference.collection, survivor)
                    .await
                    .map_err(|e| failure(reference, e))?;
            }

            for duplicate in &group {
                let id = document_id(duplicate).map_err(|e| failure(reference, e))?;
                if self
                    .store
                    .remove(&reference.collection, id)
                    .await
                    .map_err(|e| failure(reference, e))?
                {
                    removed += 1;
                }
            }
            tracing::debug!(
                "Folded {} duplicate {} records on target {}",
                group.len(),
                reference.collection,
                key
            );
        }
        Ok(removed)
    }
}

fn failure(reference: &TrackedReference, err: StorageError) -> MigrationError {
    let error = MigrationError::ReferenceMigrationFailure {
        collection: reference.collection.clone(),
        path: reference.path().to_string(),
        reason: err.to_string(),
    };
    tracing::error!("{}", error);
    error
}

// Records without a timestamp sort first, then unparseable ones by their raw
// text, then by instant; ties fall back to the id
fn creation_key(document: &Document) -> (Option<DateTime<Utc>>, String, String) {
    let text = |field: &str| {
        document
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let raw = text(CREATED_AT_FIELD);
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(instant) => (Some(instant.with_timezone(&Utc)), String::new(), text("id")),
        Err(_) => (None, raw, text("id")),
    }
}

/// Round to the nearest integer, halves away from zero
pub(crate) fn round_half_away(value: f64) -> i64 {
    value.round() as i64
}

fn set_field(document: &mut Document, field: &str, value: Value) -> Result<(), StorageError> {
    document
        .as_object_mut()
        .map(|map| {
            map.insert(field.to_string(), value);
        })
        .ok_or_else(|| StorageError::InvalidDocument("Document is not an object".to_string()))
}
