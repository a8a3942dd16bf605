//! Asynchronous operation documents and their status state machine.

use std::fmt;

use hcp_core::arm::{CloudErrorBody, Operation, ProvisioningState};
use hcp_core::{InternalId, ResourceId, now_after, now_utc};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::document::{BaseDocument, Document};

/// The kind of request an operation tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationRequest {
    Create,
    Update,
    Delete,
}

impl OperationRequest {
    /// Status a freshly recorded operation starts in.
    ///
    /// A delete starts in `Deleting` so an in-flight deletion is visible in
    /// the store from the moment it is recorded.
    pub fn initial_status(&self) -> ProvisioningState {
        match self {
            Self::Create | Self::Update => ProvisioningState::Accepted,
            Self::Delete => ProvisioningState::Deleting,
        }
    }
}

impl fmt::Display for OperationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "Create"),
            Self::Update => write!(f, "Update"),
            Self::Delete => write!(f, "Delete"),
        }
    }
}

/// Outcome of [`OperationDocument::update_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum StatusUpdate {
    /// The status was already current; nothing to persist.
    Unchanged,
    /// Status, error and transition time were overwritten; persist the document.
    Changed,
}

impl StatusUpdate {
    pub fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Lifecycle record of one asynchronous request against a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDocument {
    #[serde(flatten)]
    pub base: BaseDocument,
    pub partition_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    pub request: OperationRequest,
    pub external_id: ResourceId,
    #[serde(default, skip_serializing_if = "InternalId::is_empty")]
    pub internal_id: InternalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_uri: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_transition_time: OffsetDateTime,
    pub status: ProvisioningState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CloudErrorBody>,
}

impl OperationDocument {
    pub fn new(
        partition_key: impl Into<String>,
        request: OperationRequest,
        external_id: ResourceId,
        internal_id: InternalId,
    ) -> Self {
        let now = now_utc();
        Self {
            base: BaseDocument::new(),
            partition_key: partition_key.into(),
            tenant_id: String::new(),
            client_id: String::new(),
            request,
            external_id,
            internal_id,
            operation_id: None,
            notification_uri: None,
            start_time: now,
            last_transition_time: now,
            status: request.initial_status(),
            error: None,
        }
    }

    /// Attaches the requester identity, stored verbatim.
    pub fn with_identity(mut self, tenant_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self.client_id = client_id.into();
        self
    }

    pub fn with_notification_uri(mut self, uri: Option<String>) -> Self {
        self.notification_uri = uri;
        self
    }

    pub fn with_operation_id(mut self, operation_id: ResourceId) -> Self {
        self.operation_id = Some(operation_id);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves the operation to `status`.
    ///
    /// Reporting the current status again changes nothing, not even the
    /// transition time. Any other status overwrites status and error and
    /// advances the transition time.
    pub fn update_status(
        &mut self,
        status: ProvisioningState,
        error: Option<CloudErrorBody>,
    ) -> StatusUpdate {
        if self.status == status {
            return StatusUpdate::Unchanged;
        }
        if self.is_terminal() {
            tracing::warn!(
                operation_id = %self.base.id,
                from = %self.status,
                to = %status,
                "status change on a terminal operation"
            );
        }
        self.last_transition_time = now_after(self.last_transition_time);
        self.status = status;
        self.error = error;
        StatusUpdate::Changed
    }

    /// External status view. The end time is reported only once the
    /// operation is terminal.
    pub fn to_status(&self) -> Operation {
        Operation {
            id: self.operation_id.clone(),
            name: self.base.id.clone(),
            status: self.status,
            start_time: Some(self.start_time),
            end_time: self.is_terminal().then_some(self.last_transition_time),
            error: self.error.clone(),
        }
    }
}

impl Document for OperationDocument {
    const KIND: &'static str = "operation";

    fn base(&self) -> &BaseDocument {
        &self.base
    }

    fn partition_key(&self) -> &str {
        &self.partition_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn cluster_id() -> ResourceId {
        ResourceId::parse(
            "/subscriptions/abc/resourceGroups/rg/providers/Microsoft.RedHatOpenShift/hcpOpenShiftClusters/dev",
        )
        .unwrap()
    }

    fn new_op(request: OperationRequest) -> OperationDocument {
        OperationDocument::new("operations", request, cluster_id(), InternalId::cluster("c1"))
    }

    #[test]
    fn test_initial_status_by_request() {
        assert_eq!(new_op(OperationRequest::Create).status, ProvisioningState::Accepted);
        assert_eq!(new_op(OperationRequest::Update).status, ProvisioningState::Accepted);
        assert_eq!(new_op(OperationRequest::Delete).status, ProvisioningState::Deleting);
    }

    #[test]
    fn test_new_stamps_start_and_transition_time() {
        let op = new_op(OperationRequest::Create);
        assert_eq!(op.start_time, op.last_transition_time);
        assert!(op.error.is_none());
    }

    #[test]
    fn test_same_status_is_unchanged() {
        let mut op = new_op(OperationRequest::Create);
        let before = op.clone();
        assert_eq!(
            op.update_status(ProvisioningState::Accepted, None),
            StatusUpdate::Unchanged
        );
        assert_eq!(op, before);
    }

    #[test]
    fn test_same_status_keeps_existing_error() {
        let mut op = new_op(OperationRequest::Create);
        let error = CloudErrorBody::new("InternalServerError", "boom");
        let _ = op.update_status(ProvisioningState::Failed, Some(error.clone()));
        let transition = op.last_transition_time;

        let update = op.update_status(ProvisioningState::Failed, Some(error.clone()));
        assert!(!update.is_changed());
        assert_eq!(op.error, Some(error));
        assert_eq!(op.last_transition_time, transition);
    }

    #[test]
    fn test_changed_status_advances_transition_time() {
        let mut op = new_op(OperationRequest::Create);
        // Pin the transition time in the future to exercise the clock floor.
        let future = now_utc() + time::Duration::hours(1);
        op.last_transition_time = future;

        let update = op.update_status(ProvisioningState::Provisioning, None);
        assert!(update.is_changed());
        assert_eq!(op.status, ProvisioningState::Provisioning);
        assert!(op.last_transition_time > future);
    }

    #[test]
    fn test_changed_status_overwrites_error() {
        let mut op = new_op(OperationRequest::Create);
        let _ = op.update_status(
            ProvisioningState::Provisioning,
            Some(CloudErrorBody::new("Transient", "retrying")),
        );
        let _ = op.update_status(ProvisioningState::Succeeded, None);
        assert!(op.error.is_none());
        assert!(op.is_terminal());
    }

    #[test]
    fn test_to_status_omits_end_time_until_terminal() {
        let mut op = new_op(OperationRequest::Create);
        op.start_time = datetime!(2024-06-10 12:00:00 UTC);
        op.last_transition_time = datetime!(2024-06-10 12:00:00 UTC);

        let _ = op.update_status(ProvisioningState::Provisioning, None);
        let status = op.to_status();
        assert_eq!(status.start_time, Some(datetime!(2024-06-10 12:00:00 UTC)));
        assert!(status.end_time.is_none());

        let _ = op.update_status(ProvisioningState::Succeeded, None);
        let status = op.to_status();
        assert_eq!(status.end_time, Some(op.last_transition_time));
        assert_eq!(status.name, op.base.id);
    }

    #[test]
    fn test_persisted_field_names() {
        let op = new_op(OperationRequest::Delete)
            .with_identity("tenant", "client")
            .with_notification_uri(Some("https://arm.example.com/notify".into()));
        let value = serde_json::to_value(&op).unwrap();

        for field in [
            "id",
            "partitionKey",
            "tenantId",
            "clientId",
            "request",
            "externalId",
            "internalId",
            "notificationUri",
            "startTime",
            "lastTransitionTime",
            "status",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert_eq!(value["request"], "Delete");
        assert_eq!(value["status"], "Deleting");

        let back: OperationDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, op);
    }
}
