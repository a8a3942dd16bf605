//! Document client tests against the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use hcp_core::arm::{ProvisioningState, Subscription, SubscriptionState};
use hcp_core::{InternalId, ResourceId};
use hcp_database::{
    ClientOptions, DatabaseError, DocumentClient, DocumentPredicate, DocumentStore, ETag,
    InMemoryDocumentStore, OperationDocument, OperationRequest, ResourceDocument,
    SubscriptionDocument,
};
use serde_json::Value;

fn cluster_id(name: &str) -> ResourceId {
    ResourceId::parse(&format!(
        "/subscriptions/00000000-AAAA-0000-0000-000000000000/resourceGroups/rg/providers/Microsoft.RedHatOpenShift/hcpOpenShiftClusters/{name}"
    ))
    .unwrap()
}

fn client(store: Arc<dyn DocumentStore>) -> DocumentClient {
    DocumentClient::new(store, ClientOptions::default())
}

/// Wraps a store and lets a competing writer bump a document's etag right
/// before the next `n` replacing writes.
struct RacingStore {
    inner: InMemoryDocumentStore,
    races_left: AtomicUsize,
    upserts: AtomicUsize,
}

impl RacingStore {
    fn new(races: usize) -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            races_left: AtomicUsize::new(races),
            upserts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DocumentStore for RacingStore {
    async fn get(&self, partition_key: &str, id: &str) -> hcp_database::Result<Option<Value>> {
        self.inner.get(partition_key, id).await
    }

    async fn upsert(
        &self,
        partition_key: &str,
        document: Value,
        if_match: Option<&ETag>,
    ) -> hcp_database::Result<Value> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if if_match.is_some()
            && self
                .races_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            let id = document["id"].as_str().unwrap_or_default().to_string();
            let current = self.inner.get(partition_key, &id).await?.unwrap();
            let etag = ETag::new(current["_etag"].as_str().unwrap());
            self.inner.upsert(partition_key, current, Some(&etag)).await?;
        }
        self.inner.upsert(partition_key, document, if_match).await
    }

    async fn delete(&self, partition_key: &str, id: &str) -> hcp_database::Result<()> {
        self.inner.delete(partition_key, id).await
    }

    async fn query_by_partition(
        &self,
        partition_key: &str,
        predicate: &DocumentPredicate<'_>,
    ) -> hcp_database::Result<Vec<Value>> {
        self.inner.query_by_partition(partition_key, predicate).await
    }

    fn backend_name(&self) -> &'static str {
        "racing"
    }
}

#[tokio::test]
async fn test_stale_token_conflicts_and_fresh_token_succeeds() {
    let store = InMemoryDocumentStore::new();
    let mut doc = ResourceDocument::new(cluster_id("dev"));
    let value = serde_json::to_value(&doc).unwrap();
    let stored = store.upsert(&doc.partition_key, value, None).await.unwrap();
    let stale = ETag::new(stored["_etag"].as_str().unwrap());

    // Another writer gets in first.
    let mut other = stored.clone();
    other["provisioningState"] = "Provisioning".into();
    store
        .upsert(&doc.partition_key, other, Some(&stale))
        .await
        .unwrap();

    // The stale write fails and does not overwrite.
    doc.provisioning_state = ProvisioningState::Failed;
    let err = store
        .upsert(
            &doc.partition_key,
            serde_json::to_value(&doc).unwrap(),
            Some(&stale),
        )
        .await
        .unwrap_err();
    assert!(err.is_concurrency_conflict());
    let current = store.get(&doc.partition_key, &doc.base.id).await.unwrap().unwrap();
    assert_eq!(current["provisioningState"], "Provisioning");

    // Re-read and retry with the fresh token.
    let fresh = ETag::new(current["_etag"].as_str().unwrap());
    store
        .upsert(
            &doc.partition_key,
            serde_json::to_value(&doc).unwrap(),
            Some(&fresh),
        )
        .await
        .unwrap();
    let current = store.get(&doc.partition_key, &doc.base.id).await.unwrap().unwrap();
    assert_eq!(current["provisioningState"], "Failed");
}

#[tokio::test]
async fn test_resource_doc_lookup_ignores_casing() {
    let client = client(Arc::new(InMemoryDocumentStore::new()));
    let id = cluster_id("dev");
    let mut doc = ResourceDocument::new(id.clone());
    doc.internal_id = InternalId::cluster("c1");
    client.create_resource_doc(&doc).await.unwrap();

    let upper = ResourceId::parse(&id.as_str().to_uppercase()).unwrap();
    let found = client.get_resource_doc(&upper).await.unwrap();
    assert_eq!(found.base.id, doc.base.id);
    assert_eq!(found.partition_key, "00000000-aaaa-0000-0000-000000000000");
    assert!(found.base.etag.is_some());

    let missing = client.get_resource_doc(&cluster_id("other")).await.unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn test_create_resource_doc_twice_fails() {
    let client = client(Arc::new(InMemoryDocumentStore::new()));
    let doc = ResourceDocument::new(cluster_id("dev"));
    client.create_resource_doc(&doc).await.unwrap();
    let err = client.create_resource_doc(&doc).await.unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn test_second_document_for_same_key_is_rejected() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let client = client(store.clone());
    let id = cluster_id("dev");

    let mut first = ResourceDocument::new(id.clone());
    first.internal_id = InternalId::cluster("c1");
    let mut second = ResourceDocument::new(ResourceId::parse(&id.as_str().to_uppercase()).unwrap());
    second.internal_id = InternalId::cluster("c2");
    assert_ne!(first.base.id, second.base.id);

    client.create_resource_doc(&first).await.unwrap();
    let err = client.create_resource_doc(&second).await.unwrap_err();
    assert!(err.is_already_exists());

    let docs = store
        .query_by_partition(&first.partition_key, &|doc: &Value| doc.get("key").is_some())
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(client.get_resource_doc(&id).await.unwrap().internal_id, InternalId::cluster("c1"));
}

#[tokio::test]
async fn test_delete_releases_resource_key() {
    let client = client(Arc::new(InMemoryDocumentStore::new()));
    let id = cluster_id("dev");
    client
        .create_resource_doc(&ResourceDocument::new(id.clone()))
        .await
        .unwrap();
    client.delete_resource_doc(&id).await.unwrap();

    let recreated = ResourceDocument::new(id.clone());
    client.create_resource_doc(&recreated).await.unwrap();
    assert_eq!(client.get_resource_doc(&id).await.unwrap().base.id, recreated.base.id);
}

#[tokio::test]
async fn test_update_retries_after_conflict() {
    let store = Arc::new(RacingStore::new(2));
    let client = client(store.clone());
    let id = cluster_id("dev");
    client
        .create_resource_doc(&ResourceDocument::new(id.clone()))
        .await
        .unwrap();

    let mut calls = 0;
    let updated = client
        .update_resource_doc(&id, |doc| {
            calls += 1;
            doc.tags.insert("attempt".into(), calls.to_string());
            Ok::<_, DatabaseError>(true)
        })
        .await
        .unwrap();

    assert_eq!(calls, 3);
    assert_eq!(updated.tags["attempt"], "3");
}

#[tokio::test]
async fn test_update_gives_up_after_max_retries() {
    let store = Arc::new(RacingStore::new(usize::MAX));
    let client = DocumentClient::new(
        store.clone(),
        ClientOptions {
            max_conflict_retries: 2,
            ..ClientOptions::default()
        },
    );
    let id = cluster_id("dev");
    client
        .create_resource_doc(&ResourceDocument::new(id.clone()))
        .await
        .unwrap();

    let mut calls = 0;
    let err = client
        .update_resource_doc(&id, |_| {
            calls += 1;
            Ok::<_, DatabaseError>(true)
        })
        .await
        .unwrap_err();
    assert!(err.is_concurrency_conflict());
    assert_eq!(calls, 3);
}

#[tokio::test]
async fn test_update_callback_without_change_skips_write() {
    let store = Arc::new(RacingStore::new(0));
    let client = client(store.clone());
    let id = cluster_id("dev");
    client
        .create_resource_doc(&ResourceDocument::new(id.clone()))
        .await
        .unwrap();
    let writes_before = store.upserts.load(Ordering::SeqCst);

    client
        .update_resource_doc(&id, |_| Ok::<_, DatabaseError>(false))
        .await
        .unwrap();
    assert_eq!(store.upserts.load(Ordering::SeqCst), writes_before);
}

#[tokio::test]
async fn test_operation_status_update_round_trip() {
    let client = client(Arc::new(InMemoryDocumentStore::new()));
    let op = OperationDocument::new(
        client.operations_partition_key(),
        OperationRequest::Create,
        cluster_id("dev"),
        InternalId::cluster("c1"),
    );
    client.create_operation_doc(&op).await.unwrap();

    let updated = client
        .update_operation_doc(&op.base.id, |doc| {
            Ok::<_, DatabaseError>(
                doc.update_status(ProvisioningState::Succeeded, None)
                    .is_changed(),
            )
        })
        .await
        .unwrap();
    assert_eq!(updated.status, ProvisioningState::Succeeded);
    assert!(updated.last_transition_time > op.last_transition_time);

    let status = client.get_operation_doc(&op.base.id).await.unwrap().to_status();
    assert_eq!(status.end_time, Some(updated.last_transition_time));
}

#[tokio::test]
async fn test_create_operation_doc_checks_partition() {
    let client = client(Arc::new(InMemoryDocumentStore::new()));
    let op = OperationDocument::new(
        "elsewhere",
        OperationRequest::Create,
        cluster_id("dev"),
        InternalId::default(),
    );
    let err = client.create_operation_doc(&op).await.unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidDocument { .. }));
}

#[tokio::test]
async fn test_list_active_operation_docs() {
    let client = client(Arc::new(InMemoryDocumentStore::new()));
    let pk = client.operations_partition_key().to_string();
    let target = cluster_id("dev");

    let mut done = OperationDocument::new(
        &pk,
        OperationRequest::Create,
        target.clone(),
        InternalId::default(),
    );
    let _ = done.update_status(ProvisioningState::Succeeded, None);
    let deleting = OperationDocument::new(
        &pk,
        OperationRequest::Delete,
        target.clone(),
        InternalId::default(),
    );
    let unrelated = OperationDocument::new(
        &pk,
        OperationRequest::Create,
        cluster_id("other"),
        InternalId::default(),
    );
    for op in [&done, &deleting, &unrelated] {
        client.create_operation_doc(op).await.unwrap();
    }

    let active = client.list_active_operation_docs(&target).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].base.id, deleting.base.id);
    assert_eq!(active[0].status, ProvisioningState::Deleting);
}

#[tokio::test]
async fn test_delete_resource_doc() {
    let client = client(Arc::new(InMemoryDocumentStore::new()));
    let id = cluster_id("dev");
    client
        .create_resource_doc(&ResourceDocument::new(id.clone()))
        .await
        .unwrap();
    client.delete_resource_doc(&id).await.unwrap();
    assert!(client.get_resource_doc(&id).await.unwrap_err().is_not_found());
    assert!(client.delete_resource_doc(&id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_subscription_upsert_inserts_then_replaces() {
    let client = client(Arc::new(InMemoryDocumentStore::new()));
    let sub_id = "00000000-AAAA-0000-0000-000000000000";

    let doc = SubscriptionDocument::new(sub_id, Subscription::default());
    client.upsert_subscription_doc(&doc).await.unwrap();

    let warned = SubscriptionDocument::new(
        sub_id,
        Subscription {
            state: SubscriptionState::Warned,
            ..Subscription::default()
        },
    );
    client.upsert_subscription_doc(&warned).await.unwrap();

    let stored = client.get_subscription_doc(sub_id).await.unwrap();
    assert_eq!(stored.base.id, sub_id.to_lowercase());
    assert_eq!(stored.subscription.state, SubscriptionState::Warned);
}
