//! Request flow scenarios against the in-memory store.

use std::sync::Arc;

use assert_json_diff::assert_json_include;
use hcp_api::{HcpOpenShiftCluster, HcpOpenShiftClusterAdminCredential};
use hcp_core::arm::error::{
    CLOUD_ERROR_CODE_INVALID_SUBSCRIPTION_STATE, CLOUD_ERROR_CODE_PROPERTY_CHANGE_NOT_ALLOWED,
};
use hcp_core::arm::{ProvisioningState, Subscription, SubscriptionState};
use hcp_core::{CloudErrorBody, InternalId, RequestMethod, ResourceId};
use hcp_database::{InMemoryDocumentStore, OperationRequest};
use hcp_frontend::{AppConfig, Frontend, FrontendError, RequestContext, ResourceView};
use serde_json::{Value, json};
use time::macros::datetime;

const SUB: &str = "00000000-0000-0000-0000-000000000001";
const V2024: &str = "2024-06-10-preview";
const V2025: &str = "2025-02-01-preview";
const SUBNET: &str = "/subscriptions/00000000-0000-0000-0000-000000000001/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet/subnets/default";

fn cluster_id() -> ResourceId {
    ResourceId::parse(&format!(
        "/subscriptions/{SUB}/resourceGroups/rg/providers/Microsoft.RedHatOpenShift/hcpOpenShiftClusters/dev"
    ))
    .unwrap()
}

fn node_pool_id() -> ResourceId {
    ResourceId::parse(&format!("{}/nodePools/workers", cluster_id())).unwrap()
}

fn cluster_body() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "location": "eastus",
        "tags": {"env": "dev"},
        "properties": {
            "clusterProfile": {"subnetId": SUBNET, "controlPlaneVersion": "4.16"}
        }
    }))
    .unwrap()
}

fn put(api_version: &str) -> RequestContext {
    RequestContext::new(api_version, RequestMethod::Put)
        .with_identity("tenant", "client")
        .with_notification_uri("https://arm.example.com/notify")
}

async fn frontend() -> Frontend {
    let frontend =
        Frontend::from_config(AppConfig::default(), Arc::new(InMemoryDocumentStore::new()))
            .unwrap();
    frontend
        .register_subscription(SUB, Subscription::default())
        .await
        .unwrap();
    frontend
}

/// Creates the test cluster and reports its creation as finished.
async fn provisioned_cluster(frontend: &Frontend) -> HcpOpenShiftCluster {
    let accepted = frontend
        .create_or_update_cluster(
            &put(V2024),
            &cluster_id(),
            &cluster_body(),
            None,
            InternalId::cluster("c1"),
        )
        .await
        .unwrap();
    frontend
        .report_operation_status(&accepted.operation.base.id, ProvisioningState::Succeeded, None)
        .await
        .unwrap();
    accepted.resource
}

#[tokio::test]
async fn test_create_cluster_records_documents() {
    let frontend = frontend().await;
    let accepted = frontend
        .create_or_update_cluster(
            &put(V2024),
            &cluster_id(),
            &cluster_body(),
            None,
            InternalId::cluster("c1"),
        )
        .await
        .unwrap();

    let op = &accepted.operation;
    assert_eq!(op.request, OperationRequest::Create);
    assert_eq!(op.status, ProvisioningState::Accepted);
    assert_eq!(op.tenant_id, "tenant");
    assert_eq!(op.notification_uri.as_deref(), Some("https://arm.example.com/notify"));
    assert_eq!(
        op.operation_id.as_ref().unwrap().as_str(),
        format!(
            "/subscriptions/{SUB}/providers/Microsoft.RedHatOpenShift/locations/eastus/hcpOperationsStatus/{}",
            op.base.id
        )
    );

    let doc = &accepted.resource_doc;
    assert_eq!(doc.active_operation_id.as_deref(), Some(op.base.id.as_str()));
    assert_eq!(doc.provisioning_state, ProvisioningState::Accepted);
    assert_eq!(doc.internal_id, InternalId::cluster("c1"));
    assert_eq!(doc.tags["env"], "dev");

    assert_eq!(accepted.resource.properties.network_profile.host_prefix, 23);
    let body: Value = serde_json::from_slice(&accepted.body).unwrap();
    assert_json_include!(
        actual: body,
        expected: json!({
            "name": "dev",
            "type": "Microsoft.RedHatOpenShift/hcpOpenShiftClusters",
            "location": "eastus",
            "tags": {"env": "dev"},
            "properties": {
                "provisioningState": "Accepted",
                "clusterProfile": {"subnetId": SUBNET}
            }
        })
    );
}

#[tokio::test]
async fn test_create_applies_version_defaults() {
    let frontend = frontend().await;
    let accepted = frontend
        .create_or_update_cluster(
            &put(V2025),
            &cluster_id(),
            &cluster_body(),
            None,
            InternalId::cluster("c1"),
        )
        .await
        .unwrap();

    let network = &accepted.resource.properties.network_profile;
    assert_eq!(network.host_prefix, 24);
    assert_eq!(network.pod_cidr.unwrap().to_string(), "10.128.0.0/14");
}

#[tokio::test]
async fn test_unknown_api_version_is_rejected() {
    let frontend = frontend().await;
    let err = frontend
        .create_or_update_cluster(
            &put("2099-01-01"),
            &cluster_id(),
            &cluster_body(),
            None,
            InternalId::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FrontendError::UnsupportedApiVersion { .. }));
    let cloud = err.to_cloud_error();
    assert_eq!(cloud.status_code, 406);
    assert_eq!(cloud.error.code, "UnsupportedApiVersion");
    assert!(frontend.client().get_resource_doc(&cluster_id()).await.is_err());
}

#[tokio::test]
async fn test_patch_of_missing_resource_is_not_found() {
    let frontend = frontend().await;
    let ctx = RequestContext::new(V2024, RequestMethod::Patch);
    let err = frontend
        .create_or_update_cluster(&ctx, &cluster_id(), b"{}", None, InternalId::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_create_requires_registered_subscription() {
    let frontend =
        Frontend::from_config(AppConfig::default(), Arc::new(InMemoryDocumentStore::new()))
            .unwrap();
    let err = frontend
        .create_or_update_cluster(
            &put(V2024),
            &cluster_id(),
            &cluster_body(),
            None,
            InternalId::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.to_cloud_error().error.code,
        CLOUD_ERROR_CODE_INVALID_SUBSCRIPTION_STATE
    );

    frontend
        .register_subscription(
            SUB,
            Subscription {
                state: SubscriptionState::Suspended,
                ..Subscription::default()
            },
        )
        .await
        .unwrap();
    let err = frontend
        .create_or_update_cluster(
            &put(V2024),
            &cluster_id(),
            &cluster_body(),
            None,
            InternalId::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_cloud_error().status_code, 409);
}

#[tokio::test]
async fn test_update_records_update_operation() {
    let frontend = frontend().await;
    let current = provisioned_cluster(&frontend).await;

    let ctx = RequestContext::new(V2024, RequestMethod::Patch);
    let accepted = frontend
        .create_or_update_cluster(
            &ctx,
            &cluster_id(),
            br#"{"tags": {"env": "prod"}}"#,
            Some(&current),
            InternalId::cluster("ignored"),
        )
        .await
        .unwrap();

    assert_eq!(accepted.operation.request, OperationRequest::Update);
    assert_eq!(accepted.operation.internal_id, InternalId::cluster("c1"));
    assert_eq!(accepted.resource_doc.internal_id, InternalId::cluster("c1"));
    assert_eq!(accepted.resource_doc.tags["env"], "prod");
    assert_eq!(
        accepted.resource_doc.active_operation_id.as_deref(),
        Some(accepted.operation.base.id.as_str())
    );
    assert_eq!(
        accepted.resource.properties.cluster_profile.subnet_id,
        SUBNET
    );
}

#[tokio::test]
async fn test_update_rejects_create_only_change() {
    let frontend = frontend().await;
    let current = provisioned_cluster(&frontend).await;

    let ctx = RequestContext::new(V2024, RequestMethod::Patch);
    let err = frontend
        .create_or_update_cluster(
            &ctx,
            &cluster_id(),
            br#"{"properties": {"clusterProfile": {"subnetId": "other"}}}"#,
            Some(&current),
            InternalId::default(),
        )
        .await
        .unwrap_err();

    let cloud = err.to_cloud_error();
    assert_eq!(cloud.error.code, CLOUD_ERROR_CODE_PROPERTY_CHANGE_NOT_ALLOWED);
    assert_eq!(cloud.target(), Some("properties.clusterProfile.subnetId"));
    // Validation fails before anything is persisted.
    let active = frontend
        .client()
        .list_active_operation_docs(&cluster_id())
        .await
        .unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn test_second_delete_is_rejected_and_first_operation_untouched() {
    let frontend = frontend().await;
    provisioned_cluster(&frontend).await;
    let ctx = RequestContext::new(V2024, RequestMethod::Delete);

    let first = frontend.delete_resource(&ctx, &cluster_id()).await.unwrap();
    assert_eq!(first.request, OperationRequest::Delete);
    assert_eq!(first.status, ProvisioningState::Deleting);
    let doc = frontend.client().get_resource_doc(&cluster_id()).await.unwrap();
    assert_eq!(doc.active_operation_id.as_deref(), Some(first.base.id.as_str()));
    assert_eq!(doc.provisioning_state, ProvisioningState::Deleting);
    let before = frontend.client().get_operation_doc(&first.base.id).await.unwrap();

    let err = frontend.delete_resource(&ctx, &cluster_id()).await.unwrap_err();
    match &err {
        FrontendError::AlreadyInProgress { operation_id, .. } => {
            assert_eq!(operation_id.as_deref(), Some(first.base.id.as_str()));
        }
        other => panic!("expected AlreadyInProgress, got {other:?}"),
    }
    assert_eq!(err.to_cloud_error().status_code, 409);

    let after = frontend.client().get_operation_doc(&first.base.id).await.unwrap();
    assert_eq!(after, before);
    let active = frontend
        .client()
        .list_active_operation_docs(&cluster_id())
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn test_update_is_rejected_while_deleting() {
    let frontend = frontend().await;
    let current = provisioned_cluster(&frontend).await;
    frontend
        .delete_resource(&RequestContext::new(V2024, RequestMethod::Delete), &cluster_id())
        .await
        .unwrap();

    let err = frontend
        .create_or_update_cluster(
            &RequestContext::new(V2024, RequestMethod::Patch),
            &cluster_id(),
            br#"{"tags": {"env": "prod"}}"#,
            Some(&current),
            InternalId::default(),
        )
        .await
        .unwrap_err();
    assert!(err.is_already_in_progress());
}

#[tokio::test]
async fn test_successful_delete_removes_resource_document() {
    let frontend = frontend().await;
    provisioned_cluster(&frontend).await;
    let op = frontend
        .delete_resource(&RequestContext::new(V2024, RequestMethod::Delete), &cluster_id())
        .await
        .unwrap();

    let done = frontend
        .report_operation_status(&op.base.id, ProvisioningState::Succeeded, None)
        .await
        .unwrap();
    assert!(done.is_terminal());
    let missing = frontend.client().get_resource_doc(&cluster_id()).await.unwrap_err();
    assert!(missing.is_not_found());

    let status = frontend
        .get_operation_status(V2024, op.operation_id.as_ref().unwrap())
        .await
        .unwrap();
    assert_eq!(status.status, ProvisioningState::Succeeded);
    assert_eq!(status.end_time, Some(done.last_transition_time));
}

#[tokio::test]
async fn test_repeated_status_report_is_idempotent() {
    let frontend = frontend().await;
    let accepted = frontend
        .create_or_update_cluster(
            &put(V2024),
            &cluster_id(),
            &cluster_body(),
            None,
            InternalId::cluster("c1"),
        )
        .await
        .unwrap();
    let op_id = &accepted.operation.base.id;

    let first = frontend
        .report_operation_status(op_id, ProvisioningState::Provisioning, None)
        .await
        .unwrap();
    let second = frontend
        .report_operation_status(op_id, ProvisioningState::Provisioning, None)
        .await
        .unwrap();
    assert_eq!(second.last_transition_time, first.last_transition_time);
    assert_eq!(second.base.etag, first.base.etag);

    let doc = frontend.client().get_resource_doc(&cluster_id()).await.unwrap();
    assert_eq!(doc.provisioning_state, ProvisioningState::Provisioning);
}

#[tokio::test]
async fn test_failed_operation_copies_status_and_error() {
    let frontend = frontend().await;
    let accepted = frontend
        .create_or_update_cluster(
            &put(V2024),
            &cluster_id(),
            &cluster_body(),
            None,
            InternalId::cluster("c1"),
        )
        .await
        .unwrap();

    let error = CloudErrorBody::new("InternalServerError", "install failed");
    frontend
        .report_operation_status(
            &accepted.operation.base.id,
            ProvisioningState::Failed,
            Some(error.clone()),
        )
        .await
        .unwrap();

    let doc = frontend.client().get_resource_doc(&cluster_id()).await.unwrap();
    assert_eq!(doc.provisioning_state, ProvisioningState::Failed);
    let status = frontend
        .get_operation_status(V2024, accepted.operation.operation_id.as_ref().unwrap())
        .await
        .unwrap();
    assert_eq!(status.error, Some(error));
}

#[tokio::test]
async fn test_superseded_operation_does_not_touch_resource() {
    let frontend = frontend().await;
    let created = frontend
        .create_or_update_cluster(
            &put(V2024),
            &cluster_id(),
            &cluster_body(),
            None,
            InternalId::cluster("c1"),
        )
        .await
        .unwrap();
    let updated = frontend
        .create_or_update_cluster(
            &RequestContext::new(V2024, RequestMethod::Patch),
            &cluster_id(),
            br#"{"tags": {"env": "prod"}}"#,
            Some(&created.resource),
            InternalId::default(),
        )
        .await
        .unwrap();

    frontend
        .report_operation_status(&created.operation.base.id, ProvisioningState::Failed, None)
        .await
        .unwrap();
    let doc = frontend.client().get_resource_doc(&cluster_id()).await.unwrap();
    assert_eq!(
        doc.active_operation_id.as_deref(),
        Some(updated.operation.base.id.as_str())
    );
    assert_eq!(doc.provisioning_state, ProvisioningState::Accepted);
}

#[tokio::test]
async fn test_operation_status_is_scoped_to_subscription() {
    let frontend = frontend().await;
    let accepted = frontend
        .create_or_update_cluster(
            &put(V2024),
            &cluster_id(),
            &cluster_body(),
            None,
            InternalId::cluster("c1"),
        )
        .await
        .unwrap();
    let status_id = accepted.operation.operation_id.clone().unwrap();

    let status = frontend.get_operation_status(V2024, &status_id).await.unwrap();
    assert_eq!(status.status, ProvisioningState::Accepted);
    assert!(status.end_time.is_none());

    let foreign = ResourceId::parse(&format!(
        "/subscriptions/ffffffff-0000-0000-0000-000000000000/providers/Microsoft.RedHatOpenShift/locations/eastus/hcpOperationsStatus/{}",
        accepted.operation.base.id
    ))
    .unwrap();
    let err = frontend.get_operation_status(V2024, &foreign).await.unwrap_err();
    assert!(err.is_not_found());

    let unknown = ResourceId::parse(&format!(
        "/subscriptions/{SUB}/providers/Microsoft.RedHatOpenShift/locations/eastus/hcpOperationsStatus/nope"
    ))
    .unwrap();
    assert!(frontend.get_operation_status(V2024, &unknown).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_node_pool_requires_parent_cluster() {
    let frontend = frontend().await;
    let err = frontend
        .create_or_update_node_pool(
            &put(V2024),
            &node_pool_id(),
            br#"{"properties": {"spec": {"vmSize": "Standard_D8s_v3"}}}"#,
            None,
            InternalId::default(),
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_node_pool_create_in_newer_version() {
    let frontend = frontend().await;
    provisioned_cluster(&frontend).await;

    let accepted = frontend
        .create_or_update_node_pool(
            &put(V2025),
            &node_pool_id(),
            br#"{"properties": {"spec": {"vmSize": "Standard_D8s_v3", "replicas": 3, "osDisk": {"sizeGiB": 128}}}}"#,
            None,
            InternalId::node_pool("c1", "np1"),
        )
        .await
        .unwrap();

    let spec = &accepted.resource.properties.spec;
    assert_eq!(spec.vm_size, "Standard_D8s_v3");
    assert_eq!(spec.replicas, 3);
    assert_eq!(spec.disk_size_gib, 128);
    assert!(spec.auto_repair);
    assert_eq!(accepted.resource_doc.internal_id, InternalId::node_pool("c1", "np1"));

    let body: Value = serde_json::from_slice(&accepted.body).unwrap();
    assert_eq!(body["properties"]["spec"]["osDisk"]["sizeGiB"], 128);
}

#[tokio::test]
async fn test_node_pool_rejected_while_cluster_deleting() {
    let frontend = frontend().await;
    provisioned_cluster(&frontend).await;
    frontend
        .delete_resource(&RequestContext::new(V2024, RequestMethod::Delete), &cluster_id())
        .await
        .unwrap();

    let err = frontend
        .create_or_update_node_pool(
            &put(V2024),
            &node_pool_id(),
            br#"{"properties": {"spec": {"vmSize": "Standard_D8s_v3"}}}"#,
            None,
            InternalId::default(),
        )
        .await
        .unwrap_err();
    assert!(err.is_already_in_progress());
}

#[tokio::test]
async fn test_get_resource_takes_state_from_document() {
    let frontend = frontend().await;
    let mut cluster = provisioned_cluster(&frontend).await;
    cluster.properties.provisioning_state = None;
    cluster.tracked.tags.clear();

    let body = frontend
        .get_resource(V2024, &cluster_id(), ResourceView::Cluster(&cluster))
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_json_include!(
        actual: body,
        expected: json!({
            "id": cluster_id().as_str(),
            "tags": {"env": "dev"},
            "properties": {"provisioningState": "Succeeded"}
        })
    );
}

#[tokio::test]
async fn test_admin_credential_requires_succeeded_cluster() {
    let frontend = frontend().await;
    let credential = HcpOpenShiftClusterAdminCredential {
        kubeconfig: "apiVersion: v1".into(),
        expiration_timestamp: datetime!(2030-01-01 00:00 UTC),
    };

    frontend
        .create_or_update_cluster(
            &put(V2024),
            &cluster_id(),
            &cluster_body(),
            None,
            InternalId::cluster("c1"),
        )
        .await
        .unwrap();
    let err = frontend
        .get_resource(V2024, &cluster_id(), ResourceView::AdminCredential(&credential))
        .await
        .unwrap_err();
    assert_eq!(err.to_cloud_error().status_code, 409);

    let frontend = self::frontend().await;
    provisioned_cluster(&frontend).await;
    let body = frontend
        .get_resource(V2024, &cluster_id(), ResourceView::AdminCredential(&credential))
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["kubeconfig"], "apiVersion: v1");
}

#[tokio::test]
async fn test_enabled_versions_restrict_registry() {
    let mut config = AppConfig::default();
    config.api.enabled_versions = Some(vec![V2025.to_string()]);
    let frontend = Frontend::from_config(config, Arc::new(InMemoryDocumentStore::new())).unwrap();
    assert_eq!(frontend.registry().names(), vec![V2025]);

    let err = frontend
        .get_operation_status(V2024, &cluster_id())
        .await
        .unwrap_err();
    assert!(matches!(err, FrontendError::UnsupportedApiVersion { .. }));

    let mut config = AppConfig::default();
    config.api.enabled_versions = Some(vec!["1999-01-01".to_string()]);
    let err = Frontend::from_config(config, Arc::new(InMemoryDocumentStore::new())).unwrap_err();
    assert!(matches!(err, FrontendError::Api(_)));
}
