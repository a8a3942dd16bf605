//! The document store contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::document::ETag;
use crate::error::Result;

/// Filter applied to documents within one partition.
pub type DocumentPredicate<'a> = dyn Fn(&Value) -> bool + Send + Sync + 'a;

/// A partitioned JSON document store with optimistic concurrency.
///
/// Documents are addressed by partition key and their `id` field. Every
/// successful write stamps a fresh `_etag`; a write naming an older token
/// fails instead of overwriting.
///
/// # Example
///
/// ```ignore
/// use hcp_database::{DatabaseError, DocumentStore};
///
/// async fn exists(store: &dyn DocumentStore, pk: &str, id: &str) -> Result<bool, DatabaseError> {
///     Ok(store.get(pk, id).await?.is_some())
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document, including its store metadata.
    ///
    /// Returns `None` if the document does not exist.
    async fn get(&self, partition_key: &str, id: &str) -> Result<Option<Value>>;

    /// Writes a document and returns it as stored.
    ///
    /// With `if_match` of `None` the write only inserts.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::AlreadyExists` if `if_match` is `None` and the document exists.
    /// Returns `DatabaseError::NotFound` if `if_match` is set and the document does not exist.
    /// Returns `DatabaseError::ConcurrencyConflict` if `if_match` differs from the stored token.
    async fn upsert(
        &self,
        partition_key: &str,
        document: Value,
        if_match: Option<&ETag>,
    ) -> Result<Value>;

    /// Removes a document.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the document does not exist.
    async fn delete(&self, partition_key: &str, id: &str) -> Result<()>;

    /// All documents of a partition matching `predicate`.
    async fn query_by_partition(
        &self,
        partition_key: &str,
        predicate: &DocumentPredicate<'_>,
    ) -> Result<Vec<Value>>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}
