//! Typed access to resource, operation and subscription documents.

use std::sync::Arc;

use hcp_core::ResourceId;
use serde_json::Value;

use crate::document::{Document, ETag};
use crate::error::{DatabaseError, Result};
use crate::operation::OperationDocument;
use crate::resource::{ResourceDocument, ResourceKeyDocument, key_document_id, partition_key_for};
use crate::subscription::SubscriptionDocument;
use crate::traits::DocumentStore;

/// Default partition holding every operation document.
pub const DEFAULT_OPERATIONS_PARTITION_KEY: &str = "operations";

/// Default number of re-read-and-retry rounds after a concurrency conflict.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub operations_partition_key: String,
    pub max_conflict_retries: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            operations_partition_key: DEFAULT_OPERATIONS_PARTITION_KEY.to_string(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

/// Document operations over a [`DocumentStore`].
///
/// The `update_*` methods run a read-modify-write loop: read the current
/// document, let the callback decide on the change, then write with the
/// token captured at read time. A concurrency conflict restarts the loop
/// from a fresh read, up to `max_conflict_retries` times.
#[derive(Clone)]
pub struct DocumentClient {
    store: Arc<dyn DocumentStore>,
    options: ClientOptions,
}

impl std::fmt::Debug for DocumentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentClient")
            .field("backend", &self.store.backend_name())
            .field("options", &self.options)
            .finish()
    }
}

impl DocumentClient {
    pub fn new(store: Arc<dyn DocumentStore>, options: ClientOptions) -> Self {
        Self { store, options }
    }

    pub fn operations_partition_key(&self) -> &str {
        &self.options.operations_partition_key
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    // ==================== Resources ====================

    /// Finds the document of a resource by its key.
    pub async fn get_resource_doc(&self, resource_id: &ResourceId) -> Result<ResourceDocument> {
        let partition_key = partition_key_for(resource_id);
        let key = resource_id.as_str();
        let matches = self
            .store
            .query_by_partition(&partition_key, &|doc: &Value| {
                doc.get("key")
                    .and_then(Value::as_str)
                    .is_some_and(|k| k.eq_ignore_ascii_case(key))
            })
            .await?;

        let value = matches
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::not_found(&partition_key, key))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Inserts the document of a new resource.
    ///
    /// The resource key is claimed first, so of two concurrent creates of
    /// the same resource only one succeeds; the other gets
    /// `DatabaseError::AlreadyExists`.
    pub async fn create_resource_doc(&self, doc: &ResourceDocument) -> Result<ResourceDocument> {
        let key_doc = ResourceKeyDocument::for_document(doc);
        self.insert(&key_doc).await?;

        let stored = match self.insert(doc).await {
            Ok(stored) => stored,
            Err(e) => {
                self.release_resource_key(&doc.partition_key, &doc.key).await;
                return Err(e);
            }
        };
        tracing::debug!(
            resource_id = %doc.key,
            doc_id = %doc.base.id,
            "created resource document"
        );
        Ok(stored)
    }

    /// Read-modify-write of a resource document.
    ///
    /// The callback returns whether it changed the document; `false` skips
    /// the write and returns the document as read.
    pub async fn update_resource_doc<F, E>(
        &self,
        resource_id: &ResourceId,
        callback: F,
    ) -> std::result::Result<ResourceDocument, E>
    where
        F: FnMut(&mut ResourceDocument) -> std::result::Result<bool, E>,
        E: From<DatabaseError>,
    {
        let current = self.get_resource_doc(resource_id).await?;
        self.update_document(&current.partition_key, &current.base.id, callback)
            .await
    }

    /// Removes the document of a resource and releases its key.
    ///
    /// A key left behind by an earlier partial delete is released too; only
    /// when neither exists does this fail with `DatabaseError::NotFound`.
    pub async fn delete_resource_doc(&self, resource_id: &ResourceId) -> Result<()> {
        let partition_key = partition_key_for(resource_id);
        let deleted = match self.get_resource_doc(resource_id).await {
            Ok(doc) => {
                self.store.delete(&doc.partition_key, &doc.base.id).await?;
                tracing::debug!(resource_id = %resource_id, doc_id = %doc.base.id, "deleted resource document");
                true
            }
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e),
        };

        match self
            .store
            .delete(&partition_key, &key_document_id(resource_id))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() && deleted => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Best effort: a key that stays behind is released by the next delete.
    async fn release_resource_key(&self, partition_key: &str, resource_id: &ResourceId) {
        if let Err(e) = self
            .store
            .delete(partition_key, &key_document_id(resource_id))
            .await
        {
            tracing::warn!(
                resource_id = %resource_id,
                error = %e,
                "failed to release resource key"
            );
        }
    }

    // ==================== Operations ====================

    pub async fn get_operation_doc(&self, operation_id: &str) -> Result<OperationDocument> {
        self.get(self.operations_partition_key(), operation_id).await
    }

    pub async fn create_operation_doc(&self, doc: &OperationDocument) -> Result<OperationDocument> {
        if doc.partition_key != self.options.operations_partition_key {
            return Err(DatabaseError::invalid_document(format!(
                "operation partition key '{}' does not match '{}'",
                doc.partition_key, self.options.operations_partition_key
            )));
        }
        let stored = self.insert(doc).await?;
        tracing::info!(
            operation_id = %doc.base.id,
            resource_id = %doc.external_id,
            request = %doc.request,
            status = %doc.status,
            "created operation"
        );
        Ok(stored)
    }

    /// Read-modify-write of an operation document.
    pub async fn update_operation_doc<F, E>(
        &self,
        operation_id: &str,
        callback: F,
    ) -> std::result::Result<OperationDocument, E>
    where
        F: FnMut(&mut OperationDocument) -> std::result::Result<bool, E>,
        E: From<DatabaseError>,
    {
        let partition_key = self.options.operations_partition_key.clone();
        self.update_document(&partition_key, operation_id, callback)
            .await
    }

    /// Non-terminal operations targeting a resource.
    pub async fn list_active_operation_docs(
        &self,
        external_id: &ResourceId,
    ) -> Result<Vec<OperationDocument>> {
        let key = external_id.as_str();
        let values = self
            .store
            .query_by_partition(self.operations_partition_key(), &|doc: &Value| {
                doc.get("externalId")
                    .and_then(Value::as_str)
                    .is_some_and(|id| id.eq_ignore_ascii_case(key))
            })
            .await?;

        let mut active = Vec::new();
        for value in values {
            let doc: OperationDocument = serde_json::from_value(value)?;
            if !doc.is_terminal() {
                active.push(doc);
            }
        }
        active.sort_by_key(|doc| doc.start_time);
        Ok(active)
    }

    // ==================== Subscriptions ====================

    pub async fn get_subscription_doc(&self, subscription_id: &str) -> Result<SubscriptionDocument> {
        let id = subscription_id.to_lowercase();
        self.get(&id, &id).await
    }

    /// Inserts or replaces a subscription document, whichever state the
    /// store is in.
    pub async fn upsert_subscription_doc(
        &self,
        doc: &SubscriptionDocument,
    ) -> Result<SubscriptionDocument> {
        let partition_key = doc.partition_key();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let etag = self
                .store
                .get(partition_key, doc.id())
                .await?
                .and_then(|v| v.get("_etag").and_then(Value::as_str).map(ETag::new));

            let mut value = serde_json::to_value(doc)?;
            strip_store_metadata(&mut value);
            match self.store.upsert(partition_key, value, etag.as_ref()).await {
                Ok(stored) => {
                    tracing::debug!(subscription_id = %doc.id(), "stored subscription document");
                    return Ok(serde_json::from_value(stored)?);
                }
                Err(e) if e.is_retriable() && attempt <= self.options.max_conflict_retries => {
                    tracing::warn!(
                        subscription_id = %doc.id(),
                        attempt,
                        error = %e,
                        "subscription write raced, retrying"
                    );
                }
                Err(e) => return Err(self.exhausted(SubscriptionDocument::KIND, doc.id(), e)),
            }
        }
    }

    // ==================== Internals ====================

    async fn get<T: Document>(&self, partition_key: &str, id: &str) -> Result<T> {
        let value = self
            .store
            .get(partition_key, id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(partition_key, id))?;
        Ok(serde_json::from_value(value)?)
    }

    async fn insert<T: Document>(&self, doc: &T) -> Result<T> {
        let mut value = serde_json::to_value(doc)?;
        strip_store_metadata(&mut value);
        let stored = self.store.upsert(doc.partition_key(), value, None).await?;
        Ok(serde_json::from_value(stored)?)
    }

    async fn update_document<T, F, E>(
        &self,
        partition_key: &str,
        id: &str,
        mut callback: F,
    ) -> std::result::Result<T, E>
    where
        T: Document,
        F: FnMut(&mut T) -> std::result::Result<bool, E>,
        E: From<DatabaseError>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut doc: T = self.get(partition_key, id).await?;
            let etag = doc.etag().cloned().ok_or_else(|| {
                DatabaseError::invalid_document(format!("{} document {id} has no etag", T::KIND))
            })?;

            if !callback(&mut doc)? {
                return Ok(doc);
            }

            let value = serde_json::to_value(&doc).map_err(DatabaseError::from)?;
            match self.store.upsert(partition_key, value, Some(&etag)).await {
                Ok(stored) => {
                    tracing::debug!(kind = T::KIND, doc_id = %id, attempt, "updated document");
                    return Ok(serde_json::from_value(stored).map_err(DatabaseError::from)?);
                }
                Err(e) if e.is_concurrency_conflict()
                    && attempt <= self.options.max_conflict_retries =>
                {
                    tracing::warn!(
                        kind = T::KIND,
                        doc_id = %id,
                        attempt,
                        error = %e,
                        "concurrency conflict, re-reading document"
                    );
                }
                Err(e) => return Err(self.exhausted(T::KIND, id, e).into()),
            }
        }
    }

    fn exhausted(&self, kind: &'static str, id: &str, err: DatabaseError) -> DatabaseError {
        if err.is_retriable() {
            tracing::error!(
                kind,
                doc_id = %id,
                retries = self.options.max_conflict_retries,
                error = %err,
                error.category = %err.category(),
                "giving up after repeated concurrency conflicts"
            );
        }
        err
    }
}

/// Drops fields the store owns so an insert starts from clean metadata.
fn strip_store_metadata(value: &mut Value) {
    if let Value::Object(map) = value {
        for field in ["_rid", "_self", "_etag", "_attachments", "_ts"] {
            map.remove(field);
        }
    }
}
