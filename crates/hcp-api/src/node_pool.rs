//! Canonical node pool and admin credential models.

use std::collections::BTreeMap;

use hcp_core::arm::{ProvisioningState, TrackedResource};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A worker node pool belonging to a cluster.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HcpOpenShiftClusterNodePool {
    #[serde(flatten)]
    pub tracked: TrackedResource,
    #[serde(default)]
    pub properties: NodePoolProperties,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(default)]
    pub spec: NodePoolSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subnet_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vm_size: String,
    #[serde(default, rename = "diskSizeGiB")]
    pub disk_size_gib: i32,
    #[serde(default)]
    pub replicas: i32,
    #[serde(default)]
    pub auto_repair: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<NodePoolAutoscaling>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taint {
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolAutoscaling {
    pub min_replicas: i32,
    pub max_replicas: i32,
}

/// Creates a node pool with the version-independent non-zero defaults.
pub fn new_default_node_pool() -> HcpOpenShiftClusterNodePool {
    HcpOpenShiftClusterNodePool {
        properties: NodePoolProperties {
            spec: NodePoolSpec {
                disk_size_gib: 64,
                auto_repair: true,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Temporary admin credential for a cluster. Read only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HcpOpenShiftClusterAdminCredential {
    pub kubeconfig: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expiration_timestamp: OffsetDateTime,
}
