//! Canonical, version-independent cluster model.
//!
//! Every API version normalizes into these types and marshals out of them.
//! Field visibility is declared in [`crate::visibility::CLUSTER_VISIBILITY`].

use std::net::IpAddr;

use hcp_core::arm::{ProvisioningState, TrackedResource};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use url::Url;

/// An HCP OpenShift cluster resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HcpOpenShiftCluster {
    #[serde(flatten)]
    pub tracked: TrackedResource,
    #[serde(default)]
    pub properties: ClusterProperties,
}

/// Property bag of a cluster.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(default)]
    pub cluster_profile: ClusterProfile,
    #[serde(default)]
    pub proxy_profile: ProxyProfile,
    #[serde(default)]
    pub api_profile: ApiProfile,
    #[serde(default)]
    pub console_profile: ConsoleProfile,
    #[serde(default)]
    pub ingress_profile: IngressProfile,
    #[serde(default)]
    pub network_profile: NetworkProfile,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_pool_profiles: Vec<NodePoolProfile>,
    #[serde(default)]
    pub etcd_encryption: EtcdEncryptionProfile,
}

/// High level cluster configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProfile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub control_plane_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subnet_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub managed_resource_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc_issuer_url: Option<Url>,
}

/// Cluster-wide egress proxy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyProfile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub http_proxy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub https_proxy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub no_proxy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trusted_ca: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutboundType {
    #[default]
    LoadBalancer,
}

/// API server endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
    #[serde(default)]
    pub visibility: Visibility,
}

/// Web console endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(default)]
    pub fips: bool,
}

/// Default ingress endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(default)]
    pub visibility: Visibility,
}

/// Cluster networking. Fixed at creation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_cidr: Option<IpNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_cidr: Option<IpNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_cidr: Option<IpNetwork>,
    #[serde(default)]
    pub host_prefix: i32,
    #[serde(default)]
    pub outbound_type: OutboundType,
    #[serde(default)]
    pub preconfigured_nsgs: bool,
}

/// Summary of a node pool, as reported on the cluster.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default)]
    pub replicas: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vm_size: String,
}

/// Customer-managed key encryption of etcd.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtcdEncryptionProfile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub disc_encryption_set_id: String,
}

/// Creates a cluster with the version-independent non-zero defaults.
pub fn new_default_cluster() -> HcpOpenShiftCluster {
    HcpOpenShiftCluster {
        properties: ClusterProperties {
            network_profile: NetworkProfile {
                host_prefix: 23,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}
