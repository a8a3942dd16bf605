//! In-memory document store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use uuid::Uuid;

use crate::document::ETag;
use crate::error::{DatabaseError, Result};
use crate::traits::{DocumentPredicate, DocumentStore};

type StoreKey = (String, String);

/// In-memory document store over a sharded concurrent map.
///
/// The etag check and the write happen under the same shard lock, so two
/// writers holding the same token cannot both succeed.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: DashMap<StoreKey, Value>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents across all partitions.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn document_id(document: &Value) -> Result<String> {
    document
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DatabaseError::invalid_document("document has no id"))
}

fn etag_of(document: &Value) -> Option<&str> {
    document.get("_etag").and_then(Value::as_str)
}

/// Writes the store-maintained metadata fields.
fn stamp(document: &mut Value, partition_key: &str, rid: &str) -> Result<()> {
    let Value::Object(map) = document else {
        return Err(DatabaseError::invalid_document("document is not an object"));
    };
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    map.insert("_rid".into(), Value::String(rid.to_string()));
    map.insert(
        "_self".into(),
        Value::String(format!("dbs/hcp/colls/{partition_key}/docs/{rid}/")),
    );
    map.insert("_etag".into(), Value::String(ETag::generate().to_string()));
    map.insert("_attachments".into(), Value::String("attachments/".into()));
    map.insert("_ts".into(), Value::from(now));
    Ok(())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, partition_key: &str, id: &str) -> Result<Option<Value>> {
        let key = (partition_key.to_string(), id.to_string());
        Ok(self.documents.get(&key).map(|entry| entry.value().clone()))
    }

    async fn upsert(
        &self,
        partition_key: &str,
        mut document: Value,
        if_match: Option<&ETag>,
    ) -> Result<Value> {
        let id = document_id(&document)?;
        let key = (partition_key.to_string(), id.clone());

        match self.documents.entry(key) {
            Entry::Occupied(mut entry) => {
                let Some(expected) = if_match else {
                    return Err(DatabaseError::already_exists(partition_key, id));
                };
                let actual = etag_of(entry.get()).unwrap_or_default();
                if actual != expected.as_str() {
                    return Err(DatabaseError::concurrency_conflict(
                        id,
                        expected.as_str(),
                        actual,
                    ));
                }
                let rid = entry
                    .get()
                    .get("_rid")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
                stamp(&mut document, partition_key, &rid)?;
                entry.insert(document.clone());
            }
            Entry::Vacant(entry) => {
                if if_match.is_some() {
                    return Err(DatabaseError::not_found(partition_key, id));
                }
                let rid = Uuid::new_v4().simple().to_string();
                stamp(&mut document, partition_key, &rid)?;
                entry.insert(document.clone());
            }
        }
        Ok(document)
    }

    async fn delete(&self, partition_key: &str, id: &str) -> Result<()> {
        let key = (partition_key.to_string(), id.to_string());
        self.documents
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::not_found(partition_key, id))
    }

    async fn query_by_partition(
        &self,
        partition_key: &str,
        predicate: &DocumentPredicate<'_>,
    ) -> Result<Vec<Value>> {
        Ok(self
            .documents
            .iter()
            .filter(|entry| entry.key().0 == partition_key && predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
