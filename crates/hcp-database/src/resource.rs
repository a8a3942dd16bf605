use std::collections::BTreeMap;

use hcp_core::arm::{ProvisioningState, SystemData};
use hcp_core::{InternalId, ResourceId};
use serde::{Deserialize, Serialize};

use crate::document::{BaseDocument, Document};

/// Persisted state of a managed resource.
///
/// `active_operation_id` is a weak reference: only the id of the most
/// recent operation document, resolved through the store when needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDocument {
    #[serde(flatten)]
    pub base: BaseDocument,
    pub key: ResourceId,
    pub partition_key: String,
    #[serde(default, skip_serializing_if = "InternalId::is_empty")]
    pub internal_id: InternalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_operation_id: Option<String>,
    #[serde(default)]
    pub provisioning_state: ProvisioningState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_data: Option<SystemData>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl ResourceDocument {
    /// A new document for `key`. The partition key is fixed here and never
    /// recomputed.
    pub fn new(key: ResourceId) -> Self {
        let partition_key = partition_key_for(&key);
        Self {
            base: BaseDocument::new(),
            key,
            partition_key,
            internal_id: InternalId::default(),
            active_operation_id: None,
            provisioning_state: ProvisioningState::default(),
            system_data: None,
            tags: BTreeMap::new(),
        }
    }
}

impl Document for ResourceDocument {
    const KIND: &'static str = "resource";

    fn base(&self) -> &BaseDocument {
        &self.base
    }

    fn partition_key(&self) -> &str {
        &self.partition_key
    }
}

/// Claims a resource key within its partition.
///
/// The id is derived from the lowercased key, so an insert-only write of
/// this document succeeds for exactly one creator of the resource. It is
/// removed together with the resource document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceKeyDocument {
    #[serde(flatten)]
    pub base: BaseDocument,
    pub resource_key: ResourceId,
    pub partition_key: String,
    pub resource_doc_id: String,
}

impl ResourceKeyDocument {
    pub fn for_document(doc: &ResourceDocument) -> Self {
        Self {
            base: BaseDocument::with_id(key_document_id(&doc.key)),
            resource_key: doc.key.clone(),
            partition_key: doc.partition_key.clone(),
            resource_doc_id: doc.base.id.clone(),
        }
    }
}

impl Document for ResourceKeyDocument {
    const KIND: &'static str = "resourceKey";

    fn base(&self) -> &BaseDocument {
        &self.base
    }

    fn partition_key(&self) -> &str {
        &self.partition_key
    }
}

/// Id of the key document for `id`. Path separators are not valid in
/// document ids.
pub fn key_document_id(id: &ResourceId) -> String {
    format!("key{}", id.as_str().to_lowercase().replace('/', "|"))
}

/// Partition holding the documents of a resource: its lowercased
/// subscription id.
pub fn partition_key_for(id: &ResourceId) -> String {
    id.subscription_id().to_lowercase()
}
