//! API version `2024-06-10-preview`.
//!
//! The wire shape mirrors the canonical model. Every field is optional on
//! the wire; an absent field normalizes to the canonical default.

use std::collections::BTreeMap;
use std::net::IpAddr;

use hcp_core::arm::{ProvisioningState, SystemData};
use hcp_core::{CloudError, RequestMethod, ResourceId};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

use super::{TargetAliases, marshal_with, non_empty, overlay, validate_cluster, validate_node_pool};
use crate::cluster::{self, new_default_cluster};
use crate::error::Result;
use crate::node_pool::{self, new_default_node_pool};
use crate::version::{Version, VersionedCluster, VersionedNodePool};
use crate::visibility::{ADMIN_CREDENTIAL_VISIBILITY, CLUSTER_VISIBILITY, NODE_POOL_VISIBILITY};

pub const API_VERSION: &str = "2024-06-10-preview";

const CLUSTER_ALIASES: TargetAliases = &[];
const NODE_POOL_ALIASES: TargetAliases = &[];

#[derive(Debug, Clone, Copy, Default)]
pub struct Version20240610Preview;

impl Version for Version20240610Preview {
    fn name(&self) -> &'static str {
        API_VERSION
    }

    fn new_cluster(&self, from: Option<&cluster::HcpOpenShiftCluster>) -> Box<dyn VersionedCluster> {
        match from {
            Some(c) => Box::new(HcpOpenShiftCluster::from(c)),
            None => Box::new(HcpOpenShiftCluster::from(&new_default_cluster())),
        }
    }

    fn new_node_pool(
        &self,
        from: Option<&node_pool::HcpOpenShiftClusterNodePool>,
    ) -> Box<dyn VersionedNodePool> {
        match from {
            Some(np) => Box::new(HcpOpenShiftClusterNodePool::from(np)),
            None => Box::new(HcpOpenShiftClusterNodePool::from(&new_default_node_pool())),
        }
    }

    fn marshal_cluster(&self, cluster: &cluster::HcpOpenShiftCluster) -> Result<Vec<u8>> {
        marshal_with(&CLUSTER_VISIBILITY, cluster, |c| HcpOpenShiftCluster::from(c))
    }

    fn marshal_node_pool(&self, node_pool: &node_pool::HcpOpenShiftClusterNodePool) -> Result<Vec<u8>> {
        marshal_with(&NODE_POOL_VISIBILITY, node_pool, |np| {
            HcpOpenShiftClusterNodePool::from(np)
        })
    }

    fn marshal_admin_credential(
        &self,
        credential: &node_pool::HcpOpenShiftClusterAdminCredential,
    ) -> Result<Vec<u8>> {
        marshal_with(&ADMIN_CREDENTIAL_VISIBILITY, credential, |c| AdminCredential {
            kubeconfig: c.kubeconfig.clone(),
            expiration_timestamp: c.expiration_timestamp,
        })
    }
}

// Cluster

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HcpOpenShiftCluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_data: Option<SystemData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ClusterProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_profile: Option<ClusterProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_profile: Option<ProxyProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_profile: Option<ApiProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_profile: Option<ConsoleProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_profile: Option<IngressProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_pool_profiles: Option<Vec<NodePoolProfile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etcd_encryption: Option<EtcdEncryptionProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_resource_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc_issuer_url: Option<Url>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_ca: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundType {
    LoadBalancer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fips: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_cidr: Option<IpNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_cidr: Option<IpNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_cidr: Option<IpNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_prefix: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_type: Option<OutboundType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preconfigured_nsgs: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_size: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtcdEncryptionProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_encryption_set_id: Option<String>,
}

impl From<cluster::Visibility> for Visibility {
    fn from(v: cluster::Visibility) -> Self {
        match v {
            cluster::Visibility::Public => Self::Public,
            cluster::Visibility::Private => Self::Private,
        }
    }
}

impl From<Visibility> for cluster::Visibility {
    fn from(v: Visibility) -> Self {
        match v {
            Visibility::Public => Self::Public,
            Visibility::Private => Self::Private,
        }
    }
}

impl From<&cluster::HcpOpenShiftCluster> for HcpOpenShiftCluster {
    fn from(c: &cluster::HcpOpenShiftCluster) -> Self {
        let resource = &c.tracked.resource;
        let p = &c.properties;
        Self {
            id: resource.id.clone(),
            name: non_empty(&resource.name),
            resource_type: non_empty(&resource.resource_type),
            system_data: resource.system_data.clone(),
            location: non_empty(&c.tracked.location),
            tags: (!c.tracked.tags.is_empty()).then(|| c.tracked.tags.clone()),
            properties: Some(ClusterProperties {
                provisioning_state: p.provisioning_state,
                cluster_profile: Some(ClusterProfile {
                    control_plane_version: non_empty(&p.cluster_profile.control_plane_version),
                    subnet_id: non_empty(&p.cluster_profile.subnet_id),
                    managed_resource_group: non_empty(&p.cluster_profile.managed_resource_group),
                    oidc_issuer_url: p.cluster_profile.oidc_issuer_url.clone(),
                }),
                proxy_profile: Some(ProxyProfile {
                    http_proxy: non_empty(&p.proxy_profile.http_proxy),
                    https_proxy: non_empty(&p.proxy_profile.https_proxy),
                    no_proxy: non_empty(&p.proxy_profile.no_proxy),
                    trusted_ca: non_empty(&p.proxy_profile.trusted_ca),
                }),
                api_profile: Some(ApiProfile {
                    url: p.api_profile.url.clone(),
                    ip: p.api_profile.ip,
                    visibility: Some(p.api_profile.visibility.into()),
                }),
                console_profile: Some(ConsoleProfile {
                    url: p.console_profile.url.clone(),
                    fips: Some(p.console_profile.fips),
                }),
                ingress_profile: Some(IngressProfile {
                    ip: p.ingress_profile.ip,
                    url: p.ingress_profile.url.clone(),
                    visibility: Some(p.ingress_profile.visibility.into()),
                }),
                network_profile: Some(NetworkProfile {
                    pod_cidr: p.network_profile.pod_cidr,
                    service_cidr: p.network_profile.service_cidr,
                    machine_cidr: p.network_profile.machine_cidr,
                    host_prefix: Some(p.network_profile.host_prefix),
                    outbound_type: Some(OutboundType::LoadBalancer),
                    preconfigured_nsgs: Some(p.network_profile.preconfigured_nsgs),
                }),
                node_pool_profiles: (!p.node_pool_profiles.is_empty()).then(|| {
                    p.node_pool_profiles
                        .iter()
                        .map(|np| NodePoolProfile {
                            name: np.name.clone(),
                            version: non_empty(&np.version),
                            replicas: Some(np.replicas),
                            vm_size: non_empty(&np.vm_size),
                        })
                        .collect()
                }),
                etcd_encryption: Some(EtcdEncryptionProfile {
                    disc_encryption_set_id: non_empty(&p.etcd_encryption.disc_encryption_set_id),
                }),
            }),
        }
    }
}

impl VersionedCluster for HcpOpenShiftCluster {
    fn apply_json(&mut self, body: &[u8]) -> std::result::Result<(), CloudError> {
        overlay(self, body)
    }

    fn normalize(&self, out: &mut cluster::HcpOpenShiftCluster) {
        let defaults = new_default_cluster();

        out.tracked.resource.id = self.id.clone();
        out.tracked.resource.name = self.name.clone().unwrap_or_default();
        out.tracked.resource.resource_type = self.resource_type.clone().unwrap_or_default();
        out.tracked.resource.system_data = self.system_data.clone();
        out.tracked.location = self.location.clone().unwrap_or_default();
        out.tracked.tags = self.tags.clone().unwrap_or_default();

        let p = self.properties.clone().unwrap_or_default();
        let o = &mut out.properties;
        o.provisioning_state = p.provisioning_state;

        let cp = p.cluster_profile.unwrap_or_default();
        o.cluster_profile.control_plane_version = cp.control_plane_version.unwrap_or_default();
        o.cluster_profile.subnet_id = cp.subnet_id.unwrap_or_default();
        o.cluster_profile.managed_resource_group = cp.managed_resource_group.unwrap_or_default();
        o.cluster_profile.oidc_issuer_url = cp.oidc_issuer_url;

        let proxy = p.proxy_profile.unwrap_or_default();
        o.proxy_profile.http_proxy = proxy.http_proxy.unwrap_or_default();
        o.proxy_profile.https_proxy = proxy.https_proxy.unwrap_or_default();
        o.proxy_profile.no_proxy = proxy.no_proxy.unwrap_or_default();
        o.proxy_profile.trusted_ca = proxy.trusted_ca.unwrap_or_default();

        let api = p.api_profile.unwrap_or_default();
        o.api_profile.url = api.url;
        o.api_profile.ip = api.ip;
        o.api_profile.visibility = api
            .visibility
            .map_or(defaults.properties.api_profile.visibility, Into::into);

        let console = p.console_profile.unwrap_or_default();
        o.console_profile.url = console.url;
        o.console_profile.fips = console.fips.unwrap_or_default();

        let ingress = p.ingress_profile.unwrap_or_default();
        o.ingress_profile.ip = ingress.ip;
        o.ingress_profile.url = ingress.url;
        o.ingress_profile.visibility = ingress
            .visibility
            .map_or(defaults.properties.ingress_profile.visibility, Into::into);

        let net = p.network_profile.unwrap_or_default();
        o.network_profile.pod_cidr = net.pod_cidr;
        o.network_profile.service_cidr = net.service_cidr;
        o.network_profile.machine_cidr = net.machine_cidr;
        o.network_profile.host_prefix = net
            .host_prefix
            .unwrap_or(defaults.properties.network_profile.host_prefix);
        o.network_profile.outbound_type = cluster::OutboundType::LoadBalancer;
        o.network_profile.preconfigured_nsgs = net.preconfigured_nsgs.unwrap_or_default();

        o.node_pool_profiles = p
            .node_pool_profiles
            .unwrap_or_default()
            .into_iter()
            .map(|np| cluster::NodePoolProfile {
                name: np.name,
                version: np.version.unwrap_or_default(),
                replicas: np.replicas.unwrap_or_default(),
                vm_size: np.vm_size.unwrap_or_default(),
            })
            .collect();

        o.etcd_encryption.disc_encryption_set_id = p
            .etcd_encryption
            .and_then(|e| e.disc_encryption_set_id)
            .unwrap_or_default();
    }

    fn validate_static(
        &self,
        current: &dyn VersionedCluster,
        updating: bool,
        method: RequestMethod,
    ) -> std::result::Result<(), CloudError> {
        let mut desired = new_default_cluster();
        self.normalize(&mut desired);
        let mut base = new_default_cluster();
        current.normalize(&mut base);
        validate_cluster(&desired, &base, updating, method, CLUSTER_ALIASES)
    }
}

// Node pool

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HcpOpenShiftClusterNodePool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_data: Option<SystemData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<NodePoolProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<NodePoolSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_size: Option<String>,
    #[serde(default, rename = "diskSizeGiB", skip_serializing_if = "Option::is_none")]
    pub disk_size_gib: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_repair: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taints: Option<Vec<Taint>>,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolAutoscaling {
    pub min_replicas: i32,
    pub max_replicas: i32,
}

impl From<&node_pool::Taint> for Taint {
    fn from(t: &node_pool::Taint) -> Self {
        Self {
            key: t.key.clone(),
            value: non_empty(&t.value),
            effect: match t.effect {
                node_pool::TaintEffect::NoSchedule => TaintEffect::NoSchedule,
                node_pool::TaintEffect::PreferNoSchedule => TaintEffect::PreferNoSchedule,
                node_pool::TaintEffect::NoExecute => TaintEffect::NoExecute,
            },
        }
    }
}

impl From<Taint> for node_pool::Taint {
    fn from(t: Taint) -> Self {
        Self {
            key: t.key,
            value: t.value.unwrap_or_default(),
            effect: match t.effect {
                TaintEffect::NoSchedule => node_pool::TaintEffect::NoSchedule,
                TaintEffect::PreferNoSchedule => node_pool::TaintEffect::PreferNoSchedule,
                TaintEffect::NoExecute => node_pool::TaintEffect::NoExecute,
            },
        }
    }
}

impl From<&node_pool::HcpOpenShiftClusterNodePool> for HcpOpenShiftClusterNodePool {
    fn from(np: &node_pool::HcpOpenShiftClusterNodePool) -> Self {
        let resource = &np.tracked.resource;
        let spec = &np.properties.spec;
        Self {
            id: resource.id.clone(),
            name: non_empty(&resource.name),
            resource_type: non_empty(&resource.resource_type),
            system_data: resource.system_data.clone(),
            location: non_empty(&np.tracked.location),
            tags: (!np.tracked.tags.is_empty()).then(|| np.tracked.tags.clone()),
            properties: Some(NodePoolProperties {
                provisioning_state: np.properties.provisioning_state,
                spec: Some(NodePoolSpec {
                    version: non_empty(&spec.version),
                    subnet_id: non_empty(&spec.subnet_id),
                    vm_size: non_empty(&spec.vm_size),
                    disk_size_gib: Some(spec.disk_size_gib),
                    replicas: Some(spec.replicas),
                    auto_repair: Some(spec.auto_repair),
                    labels: (!spec.labels.is_empty()).then(|| spec.labels.clone()),
                    taints: (!spec.taints.is_empty())
                        .then(|| spec.taints.iter().map(Taint::from).collect()),
                    autoscaling: spec.autoscaling.map(|a| NodePoolAutoscaling {
                        min_replicas: a.min_replicas,
                        max_replicas: a.max_replicas,
                    }),
                }),
            }),
        }
    }
}

impl VersionedNodePool for HcpOpenShiftClusterNodePool {
    fn apply_json(&mut self, body: &[u8]) -> std::result::Result<(), CloudError> {
        overlay(self, body)
    }

    fn normalize(&self, out: &mut node_pool::HcpOpenShiftClusterNodePool) {
        let defaults = new_default_node_pool().properties.spec;

        out.tracked.resource.id = self.id.clone();
        out.tracked.resource.name = self.name.clone().unwrap_or_default();
        out.tracked.resource.resource_type = self.resource_type.clone().unwrap_or_default();
        out.tracked.resource.system_data = self.system_data.clone();
        out.tracked.location = self.location.clone().unwrap_or_default();
        out.tracked.tags = self.tags.clone().unwrap_or_default();

        let p = self.properties.clone().unwrap_or_default();
        out.properties.provisioning_state = p.provisioning_state;

        let spec = p.spec.unwrap_or_default();
        let o = &mut out.properties.spec;
        o.version = spec.version.unwrap_or_default();
        o.subnet_id = spec.subnet_id.unwrap_or_default();
        o.vm_size = spec.vm_size.unwrap_or_default();
        o.disk_size_gib = spec.disk_size_gib.unwrap_or(defaults.disk_size_gib);
        o.replicas = spec.replicas.unwrap_or_default();
        o.auto_repair = spec.auto_repair.unwrap_or(defaults.auto_repair);
        o.labels = spec.labels.unwrap_or_default();
        o.taints = spec
            .taints
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect();
        o.autoscaling = spec.autoscaling.map(|a| node_pool::NodePoolAutoscaling {
            min_replicas: a.min_replicas,
            max_replicas: a.max_replicas,
        });
    }

    fn validate_static(
        &self,
        current: &dyn VersionedNodePool,
        updating: bool,
        method: RequestMethod,
    ) -> std::result::Result<(), CloudError> {
        let mut desired = new_default_node_pool();
        self.normalize(&mut desired);
        let mut base = new_default_node_pool();
        current.normalize(&mut base);
        validate_node_pool(&desired, &base, updating, method, NODE_POOL_ALIASES)
    }
}

// Admin credential

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCredential {
    pub kubeconfig: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expiration_timestamp: OffsetDateTime,
}
