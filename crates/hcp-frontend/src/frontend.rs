//! Request flow between the ARM-facing API layer and the document store.
//!
//! The frontend owns no canonical resource state. The API layer passes in
//! what the backend reports for a resource; the frontend validates the
//! request against it through the requested API version, records the
//! request as documents, and hands back the normalized result.

use std::sync::Arc;

use hcp_api::versions::register_all;
use hcp_api::{
    HcpOpenShiftCluster, HcpOpenShiftClusterAdminCredential, HcpOpenShiftClusterNodePool,
    OPERATION_STATUS_RESOURCE_TYPE_NAME, PROVIDER_NAMESPACE, RegistryBuilder, Version,
    VersionRegistry, cluster_resource_type, new_default_cluster, new_default_node_pool,
    node_pool_resource_type,
};
use hcp_core::arm::error::{
    CLOUD_ERROR_CODE_INVALID_RESOURCE_TYPE, CLOUD_ERROR_CODE_INVALID_SUBSCRIPTION_STATE,
};
use hcp_core::arm::{
    CloudErrorBody, Operation, ProvisioningState, Resource, Subscription, SystemData,
    TrackedResource,
};
use hcp_core::{CloudError, InternalId, RequestMethod, ResourceId};
use hcp_database::{
    DatabaseError, DocumentClient, DocumentStore, OperationDocument, OperationRequest,
    ResourceDocument, SubscriptionDocument,
};

use crate::config::AppConfig;
use crate::error::{FrontendError, Result};

/// What the API layer knows about the incoming request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub api_version: String,
    pub method: RequestMethod,
    pub tenant_id: String,
    pub client_id: String,
    pub notification_uri: Option<String>,
    pub system_data: Option<SystemData>,
}

impl RequestContext {
    pub fn new(api_version: impl Into<String>, method: RequestMethod) -> Self {
        Self {
            api_version: api_version.into(),
            method,
            tenant_id: String::new(),
            client_id: String::new(),
            notification_uri: None,
            system_data: None,
        }
    }

    pub fn with_identity(mut self, tenant_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self.client_id = client_id.into();
        self
    }

    pub fn with_notification_uri(mut self, uri: impl Into<String>) -> Self {
        self.notification_uri = Some(uri.into());
        self
    }

    pub fn with_system_data(mut self, system_data: SystemData) -> Self {
        self.system_data = Some(system_data);
        self
    }
}

/// An accepted create or update.
#[derive(Debug, Clone)]
pub struct Accepted<T> {
    /// The canonical resource after the request was applied.
    pub resource: T,
    pub resource_doc: ResourceDocument,
    pub operation: OperationDocument,
    /// `resource` rendered in the requested API version.
    pub body: Vec<u8>,
}

/// Backend state of the resource a read renders.
#[derive(Debug, Clone, Copy)]
pub enum ResourceView<'a> {
    Cluster(&'a HcpOpenShiftCluster),
    NodePool(&'a HcpOpenShiftClusterNodePool),
    /// Admin credential of the cluster the request addresses.
    AdminCredential(&'a HcpOpenShiftClusterAdminCredential),
}

#[derive(Debug, Clone)]
pub struct Frontend {
    registry: VersionRegistry,
    client: DocumentClient,
    config: Arc<AppConfig>,
}

impl Frontend {
    /// Builds a frontend serving the versions in `registry`, narrowed to
    /// `api.enabled_versions` when configured.
    pub fn new(registry: VersionRegistry, client: DocumentClient, config: AppConfig) -> Result<Self> {
        let registry = match &config.api.enabled_versions {
            Some(names) => registry.restrict_to(names.as_slice())?,
            None => registry,
        };
        tracing::info!(
            versions = ?registry.names(),
            backend = client.store().backend_name(),
            location = %config.api.location,
            "frontend ready"
        );
        Ok(Self {
            registry,
            client,
            config: Arc::new(config),
        })
    }

    /// Frontend over `store` with every built-in API version.
    pub fn from_config(config: AppConfig, store: Arc<dyn DocumentStore>) -> Result<Self> {
        let mut builder = RegistryBuilder::new();
        register_all(&mut builder);
        let client = DocumentClient::new(store, config.client_options());
        Self::new(builder.build(), client, config)
    }

    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    pub fn client(&self) -> &DocumentClient {
        &self.client
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // ==================== Clusters ====================

    /// Validates and records a cluster PUT or PATCH.
    ///
    /// `current` is the backend state of an existing cluster and is required
    /// when the cluster already has a document. `internal_id` is used only
    /// when the request creates the cluster.
    pub async fn create_or_update_cluster(
        &self,
        ctx: &RequestContext,
        resource_id: &ResourceId,
        body: &[u8],
        current: Option<&HcpOpenShiftCluster>,
        internal_id: InternalId,
    ) -> Result<Accepted<HcpOpenShiftCluster>> {
        let version = self.version(&ctx.api_version)?;
        check_resource_type(resource_id, &cluster_resource_type())?;
        let existing = self.find_resource_doc(resource_id).await?;
        self.check_write(ctx, resource_id, existing.as_ref()).await?;

        let mut base = match (&existing, current) {
            (Some(_), Some(cluster)) => cluster.clone(),
            (Some(_), None) => return Err(missing_current_state(resource_id)),
            (None, _) => {
                let mut cluster = new_default_cluster();
                version.new_cluster(None).normalize(&mut cluster);
                cluster
            }
        };
        base.tracked.resource = identity_of(resource_id, &base.tracked);

        let current_view = version.new_cluster(Some(&base));
        let mut desired_view = version.new_cluster(Some(&base));
        desired_view.apply_json(body)?;
        desired_view.validate_static(current_view.as_ref(), existing.is_some(), ctx.method)?;

        let mut desired = base;
        desired_view.normalize(&mut desired);
        desired.tracked.resource = identity_of(resource_id, &desired.tracked);

        let (resource_doc, operation) = self
            .record_request(ctx, resource_id, existing, internal_id, &desired.tracked)
            .await?;
        desired.tracked.resource.system_data = resource_doc.system_data.clone();
        desired.properties.provisioning_state = Some(resource_doc.provisioning_state);
        let body = version.marshal_cluster(&desired)?;

        Ok(Accepted {
            resource: desired,
            resource_doc,
            operation,
            body,
        })
    }

    // ==================== Node pools ====================

    /// Validates and records a node pool PUT or PATCH. The parent cluster
    /// must exist and must not be deleting.
    pub async fn create_or_update_node_pool(
        &self,
        ctx: &RequestContext,
        resource_id: &ResourceId,
        body: &[u8],
        current: Option<&HcpOpenShiftClusterNodePool>,
        internal_id: InternalId,
    ) -> Result<Accepted<HcpOpenShiftClusterNodePool>> {
        let version = self.version(&ctx.api_version)?;
        check_resource_type(resource_id, &node_pool_resource_type())?;
        let cluster_id = resource_id
            .parent()
            .ok_or_else(|| FrontendError::internal(format!("{resource_id} has no parent")))?;
        let cluster_doc = self
            .find_resource_doc(&cluster_id)
            .await?
            .ok_or_else(|| FrontendError::not_found(cluster_id.as_str()))?;
        self.ensure_not_deleting(&cluster_doc).await?;

        let existing = self.find_resource_doc(resource_id).await?;
        self.check_write(ctx, resource_id, existing.as_ref()).await?;

        let mut base = match (&existing, current) {
            (Some(_), Some(node_pool)) => node_pool.clone(),
            (Some(_), None) => return Err(missing_current_state(resource_id)),
            (None, _) => {
                let mut node_pool = new_default_node_pool();
                version.new_node_pool(None).normalize(&mut node_pool);
                node_pool
            }
        };
        base.tracked.resource = identity_of(resource_id, &base.tracked);

        let current_view = version.new_node_pool(Some(&base));
        let mut desired_view = version.new_node_pool(Some(&base));
        desired_view.apply_json(body)?;
        desired_view.validate_static(current_view.as_ref(), existing.is_some(), ctx.method)?;

        let mut desired = base;
        desired_view.normalize(&mut desired);
        desired.tracked.resource = identity_of(resource_id, &desired.tracked);

        let (resource_doc, operation) = self
            .record_request(ctx, resource_id, existing, internal_id, &desired.tracked)
            .await?;
        desired.tracked.resource.system_data = resource_doc.system_data.clone();
        desired.properties.provisioning_state = Some(resource_doc.provisioning_state);
        let body = version.marshal_node_pool(&desired)?;

        Ok(Accepted {
            resource: desired,
            resource_doc,
            operation,
            body,
        })
    }

    // ==================== Shared request handling ====================

    /// Starts deleting a resource and returns the new operation.
    ///
    /// A resource with a deletion underway is rejected as already in
    /// progress without creating a second operation.
    pub async fn delete_resource(
        &self,
        ctx: &RequestContext,
        resource_id: &ResourceId,
    ) -> Result<OperationDocument> {
        self.version(&ctx.api_version)?;
        let doc = self.client.get_resource_doc(resource_id).await?;
        self.ensure_not_deleting(&doc).await?;

        let operation = self
            .create_operation(ctx, OperationRequest::Delete, resource_id, doc.internal_id.clone())
            .await?;
        let claimed = self
            .claim_resource(resource_id, doc.active_operation_id.clone(), &operation, |_| {})
            .await;
        if let Err(err) = claimed {
            self.abandon_operation(&operation, &err).await;
            return Err(err);
        }

        tracing::info!(
            resource_id = %resource_id,
            operation_id = %operation.base.id,
            "delete accepted"
        );
        Ok(operation)
    }

    /// Renders a resource in the requested API version.
    ///
    /// Provisioning state, tags and system data come from the resource
    /// document; everything else from `view`.
    pub async fn get_resource(
        &self,
        api_version: &str,
        resource_id: &ResourceId,
        view: ResourceView<'_>,
    ) -> Result<Vec<u8>> {
        let version = self.version(api_version)?;
        let doc = self.client.get_resource_doc(resource_id).await?;

        let body = match view {
            ResourceView::Cluster(cluster) => {
                let mut cluster = cluster.clone();
                overlay_document(&mut cluster.tracked, resource_id, &doc);
                cluster.properties.provisioning_state = Some(doc.provisioning_state);
                version.marshal_cluster(&cluster)?
            }
            ResourceView::NodePool(node_pool) => {
                let mut node_pool = node_pool.clone();
                overlay_document(&mut node_pool.tracked, resource_id, &doc);
                node_pool.properties.provisioning_state = Some(doc.provisioning_state);
                version.marshal_node_pool(&node_pool)?
            }
            ResourceView::AdminCredential(credential) => {
                if doc.provisioning_state != ProvisioningState::Succeeded {
                    return Err(FrontendError::Validation(CloudError::conflict(
                        resource_id.as_str(),
                        format!(
                            "Cannot request credentials while the cluster is {}.",
                            doc.provisioning_state
                        ),
                    )));
                }
                version.marshal_admin_credential(credential)?
            }
        };
        Ok(body)
    }

    // ==================== Operations ====================

    /// Status of an operation addressed by its status endpoint identifier.
    pub async fn get_operation_status(
        &self,
        api_version: &str,
        operation_id: &ResourceId,
    ) -> Result<Operation> {
        self.version(api_version)?;
        if !operation_id
            .resource_type_name()
            .eq_ignore_ascii_case(OPERATION_STATUS_RESOURCE_TYPE_NAME)
        {
            return Err(FrontendError::not_found(operation_id.as_str()));
        }

        let doc = match self.client.get_operation_doc(operation_id.name()).await {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => {
                return Err(FrontendError::not_found(operation_id.as_str()));
            }
            Err(e) => return Err(e.into()),
        };
        // Operations are only visible from the subscription they act on.
        if !doc
            .external_id
            .subscription_id()
            .eq_ignore_ascii_case(operation_id.subscription_id())
        {
            return Err(FrontendError::not_found(operation_id.as_str()));
        }
        Ok(doc.to_status())
    }

    /// Records a status reported by the backend reconciler.
    ///
    /// Reporting the current status again leaves the operation document
    /// alone. The status is mirrored onto the resource document while the
    /// operation is still the resource's active one; a delete that succeeded
    /// removes the resource document instead. That step runs on every
    /// report, so repeating a report repairs a resource write that failed.
    pub async fn report_operation_status(
        &self,
        operation_doc_id: &str,
        status: ProvisioningState,
        error: Option<CloudErrorBody>,
    ) -> Result<OperationDocument> {
        let mut changed = false;
        let operation = self
            .client
            .update_operation_doc(operation_doc_id, |doc| {
                changed = doc.update_status(status, error.clone()).is_changed();
                Ok::<_, FrontendError>(changed)
            })
            .await?;

        if changed {
            tracing::info!(
                operation_id = %operation_doc_id,
                resource_id = %operation.external_id,
                request = %operation.request,
                %status,
                "operation status changed"
            );
        } else {
            tracing::debug!(operation_id = %operation_doc_id, %status, "status unchanged");
        }
        self.propagate_status(&operation).await?;
        Ok(operation)
    }

    // ==================== Subscriptions ====================

    pub async fn register_subscription(
        &self,
        subscription_id: &str,
        subscription: Subscription,
    ) -> Result<SubscriptionDocument> {
        let doc = SubscriptionDocument::new(subscription_id, subscription);
        let stored = self.client.upsert_subscription_doc(&doc).await?;
        tracing::info!(
            subscription_id = %stored.base.id,
            state = ?stored.subscription.state,
            "subscription registered"
        );
        Ok(stored)
    }

    // ==================== Internals ====================

    fn version(&self, api_version: &str) -> Result<Arc<dyn Version>> {
        self.registry
            .lookup(api_version)
            .ok_or_else(|| FrontendError::unsupported_api_version(api_version))
    }

    async fn find_resource_doc(&self, resource_id: &ResourceId) -> Result<Option<ResourceDocument>> {
        match self.client.get_resource_doc(resource_id).await {
            Ok(doc) => Ok(Some(doc)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Checks shared by every create and update.
    async fn check_write(
        &self,
        ctx: &RequestContext,
        resource_id: &ResourceId,
        existing: Option<&ResourceDocument>,
    ) -> Result<()> {
        if existing.is_none() && ctx.method == RequestMethod::Patch {
            return Err(FrontendError::not_found(resource_id.as_str()));
        }
        self.ensure_subscription_allows_writes(resource_id.subscription_id())
            .await?;
        if let Some(doc) = existing {
            self.ensure_not_deleting(doc).await?;
        }
        Ok(())
    }

    async fn ensure_subscription_allows_writes(&self, subscription_id: &str) -> Result<()> {
        match self.client.get_subscription_doc(subscription_id).await {
            Ok(doc) if doc.subscription.state.allows_writes() => Ok(()),
            Ok(doc) => Err(FrontendError::Validation(CloudError::new(
                409,
                CLOUD_ERROR_CODE_INVALID_SUBSCRIPTION_STATE,
                None,
                format!(
                    "Request is not allowed in subscription in state '{:?}'.",
                    doc.subscription.state
                ),
            ))),
            Err(e) if e.is_not_found() => Err(FrontendError::Validation(CloudError::new(
                400,
                CLOUD_ERROR_CODE_INVALID_SUBSCRIPTION_STATE,
                None,
                format!("Subscription '{subscription_id}' is not registered."),
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Rejects the request when a deletion of the resource is underway.
    async fn ensure_not_deleting(&self, doc: &ResourceDocument) -> Result<()> {
        if let Some(active_id) = &doc.active_operation_id {
            match self.client.get_operation_doc(active_id).await {
                Ok(op) if is_active_delete(&op) => return Err(reject_in_progress(&doc.key, &op)),
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    tracing::warn!(
                        resource_id = %doc.key,
                        operation_id = %active_id,
                        "active operation document is missing"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let active = self.client.list_active_operation_docs(&doc.key).await?;
        if let Some(op) = active.iter().find(|op| is_active_delete(op)) {
            return Err(reject_in_progress(&doc.key, op));
        }
        Ok(())
    }

    async fn create_operation(
        &self,
        ctx: &RequestContext,
        request: OperationRequest,
        resource_id: &ResourceId,
        internal_id: InternalId,
    ) -> Result<OperationDocument> {
        let operation = OperationDocument::new(
            self.client.operations_partition_key(),
            request,
            resource_id.clone(),
            internal_id,
        )
        .with_identity(ctx.tenant_id.as_str(), ctx.client_id.as_str())
        .with_notification_uri(ctx.notification_uri.clone());
        let status_id = self.operation_status_id(resource_id, &operation.base.id)?;
        let operation = operation.with_operation_id(status_id);
        Ok(self.client.create_operation_doc(&operation).await?)
    }

    fn operation_status_id(&self, resource_id: &ResourceId, operation_doc_id: &str) -> Result<ResourceId> {
        let raw = format!(
            "/subscriptions/{}/providers/{PROVIDER_NAMESPACE}/locations/{}/{OPERATION_STATUS_RESOURCE_TYPE_NAME}/{operation_doc_id}",
            resource_id.subscription_id(),
            self.config.api.location,
        );
        ResourceId::parse(&raw).map_err(|e| FrontendError::internal(e.to_string()))
    }

    /// Writes the resource document for an accepted create or update.
    async fn record_request(
        &self,
        ctx: &RequestContext,
        resource_id: &ResourceId,
        existing: Option<ResourceDocument>,
        internal_id: InternalId,
        tracked: &TrackedResource,
    ) -> Result<(ResourceDocument, OperationDocument)> {
        let (request, internal_id, observed) = match &existing {
            Some(doc) => (
                OperationRequest::Update,
                doc.internal_id.clone(),
                doc.active_operation_id.clone(),
            ),
            None => (OperationRequest::Create, internal_id, None),
        };
        let operation = self
            .create_operation(ctx, request, resource_id, internal_id.clone())
            .await?;

        let recorded = match existing {
            None => {
                let mut doc = ResourceDocument::new(resource_id.clone());
                doc.internal_id = internal_id;
                doc.active_operation_id = Some(operation.base.id.clone());
                doc.provisioning_state = operation.status;
                doc.system_data = ctx.system_data.clone();
                doc.tags = tracked.tags.clone();
                self.client
                    .create_resource_doc(&doc)
                    .await
                    .map_err(|e| match e {
                        // Lost a race with a concurrent create.
                        DatabaseError::AlreadyExists { .. } => {
                            FrontendError::already_in_progress(resource_id.as_str(), None)
                        }
                        e => e.into(),
                    })
            }
            Some(_) => {
                self.claim_resource(resource_id, observed, &operation, |doc| {
                    doc.tags = tracked.tags.clone();
                    merge_system_data(&mut doc.system_data, ctx.system_data.as_ref());
                })
                .await
            }
        };

        match recorded {
            Ok(doc) => {
                tracing::info!(
                    resource_id = %resource_id,
                    operation_id = %operation.base.id,
                    request = %request,
                    "request accepted"
                );
                Ok((doc, operation))
            }
            Err(err) => {
                self.abandon_operation(&operation, &err).await;
                Err(err)
            }
        }
    }

    /// Points the resource document at `operation`.
    ///
    /// Fails as already in progress if another request claimed the resource
    /// since `observed` was read.
    async fn claim_resource<F>(
        &self,
        resource_id: &ResourceId,
        observed: Option<String>,
        operation: &OperationDocument,
        mut apply: F,
    ) -> Result<ResourceDocument>
    where
        F: FnMut(&mut ResourceDocument),
    {
        self.client
            .update_resource_doc(resource_id, |doc| {
                if doc.active_operation_id != observed {
                    return Err::<bool, FrontendError>(FrontendError::already_in_progress(
                        resource_id.as_str(),
                        doc.active_operation_id.clone(),
                    ));
                }
                doc.active_operation_id = Some(operation.base.id.clone());
                doc.provisioning_state = operation.status;
                apply(doc);
                Ok(true)
            })
            .await
    }

    /// Cancels an operation whose request was rejected after it was recorded.
    async fn abandon_operation(&self, operation: &OperationDocument, cause: &FrontendError) {
        let error = cause.to_cloud_error().error;
        let result = self
            .client
            .update_operation_doc(&operation.base.id, |doc| {
                Ok::<_, DatabaseError>(
                    doc.update_status(ProvisioningState::Canceled, Some(error.clone()))
                        .is_changed(),
                )
            })
            .await;
        if let Err(e) = result {
            tracing::error!(
                operation_id = %operation.base.id,
                error = %e,
                error.category = %e.category(),
                "failed to cancel abandoned operation"
            );
        }
    }

    async fn propagate_status(&self, operation: &OperationDocument) -> Result<()> {
        if operation.request == OperationRequest::Delete
            && operation.status == ProvisioningState::Succeeded
        {
            // A resource recreated after this delete belongs to a newer operation.
            match self.find_resource_doc(&operation.external_id).await? {
                Some(doc) if owned_by(&doc, operation) => {}
                _ => return Ok(()),
            }
            return match self.client.delete_resource_doc(&operation.external_id).await {
                Ok(()) => {
                    tracing::info!(resource_id = %operation.external_id, "resource deleted");
                    Ok(())
                }
                Err(e) if e.is_not_found() => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        let result = self
            .client
            .update_resource_doc(&operation.external_id, |doc| {
                // Reports from superseded operations leave the resource alone.
                if !owned_by(doc, operation) || doc.provisioning_state == operation.status {
                    return Ok::<_, DatabaseError>(false);
                }
                doc.provisioning_state = operation.status;
                Ok(true)
            })
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn owned_by(doc: &ResourceDocument, operation: &OperationDocument) -> bool {
    doc.active_operation_id.as_deref() == Some(operation.base.id.as_str())
}

fn is_active_delete(op: &OperationDocument) -> bool {
    !op.is_terminal() && op.status == ProvisioningState::Deleting
}

fn reject_in_progress(resource_id: &ResourceId, op: &OperationDocument) -> FrontendError {
    tracing::warn!(
        resource_id = %resource_id,
        operation_id = %op.base.id,
        "deletion already in progress"
    );
    FrontendError::already_in_progress(resource_id.as_str(), Some(op.base.id.clone()))
}

fn check_resource_type(resource_id: &ResourceId, expected: &str) -> Result<()> {
    let actual = resource_id.resource_type();
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(());
    }
    Err(FrontendError::Validation(CloudError::new(
        400,
        CLOUD_ERROR_CODE_INVALID_RESOURCE_TYPE,
        Some(resource_id.to_string()),
        format!("The resource type '{actual}' is not valid here; expected '{expected}'."),
    )))
}

fn missing_current_state(resource_id: &ResourceId) -> FrontendError {
    FrontendError::internal(format!("backend state of {resource_id} is required to update it"))
}

/// Id, name and type derived from the request path, keeping system data.
fn identity_of(resource_id: &ResourceId, tracked: &TrackedResource) -> Resource {
    Resource {
        system_data: tracked.resource.system_data.clone(),
        ..Resource::from_id(resource_id)
    }
}

fn overlay_document(tracked: &mut TrackedResource, resource_id: &ResourceId, doc: &ResourceDocument) {
    tracked.resource = Resource {
        system_data: doc.system_data.clone(),
        ..Resource::from_id(resource_id)
    };
    tracked.tags = doc.tags.clone();
}

/// Updates keep the creation audit fields and take the modification ones.
fn merge_system_data(stored: &mut Option<SystemData>, incoming: Option<&SystemData>) {
    let Some(incoming) = incoming else {
        return;
    };
    match stored {
        Some(stored) => {
            stored.last_modified_by = incoming.last_modified_by.clone();
            stored.last_modified_by_type = incoming.last_modified_by_type;
            stored.last_modified_at = incoming.last_modified_at;
        }
        None => *stored = Some(incoming.clone()),
    }
}
