//! Canonical resource model and versioned API schemas.
//!
//! Each supported `api-version` is a [`Version`] implementation that maps
//! between its own wire shape and the canonical model in [`cluster`] and
//! [`node_pool`]. Versions are collected in a [`VersionRegistry`] during
//! process start and looked up by name afterwards.

pub mod cluster;
pub mod error;
pub mod node_pool;
pub mod registry;
pub mod version;
pub mod versions;
pub mod visibility;

pub use cluster::{HcpOpenShiftCluster, new_default_cluster};
pub use error::{ApiError, Result};
pub use node_pool::{
    HcpOpenShiftClusterAdminCredential, HcpOpenShiftClusterNodePool, new_default_node_pool,
};
pub use registry::{RegistryBuilder, VersionRegistry};
pub use version::{Version, VersionedCluster, VersionedNodePool};
pub use visibility::{VisibilityFlags, VisibilityTable};

pub const PROVIDER_NAMESPACE: &str = "Microsoft.RedHatOpenShift";
pub const CLUSTER_RESOURCE_TYPE_NAME: &str = "hcpOpenShiftClusters";
pub const NODE_POOL_RESOURCE_TYPE_NAME: &str = "nodePools";
pub const OPERATION_RESULT_RESOURCE_TYPE_NAME: &str = "hcpOperationResults";
pub const OPERATION_STATUS_RESOURCE_TYPE_NAME: &str = "hcpOperationsStatus";

/// Fully qualified cluster resource type, `Namespace/type`.
pub fn cluster_resource_type() -> String {
    format!("{PROVIDER_NAMESPACE}/{CLUSTER_RESOURCE_TYPE_NAME}")
}

/// Fully qualified node pool resource type, `Namespace/type/childType`.
pub fn node_pool_resource_type() -> String {
    format!("{PROVIDER_NAMESPACE}/{CLUSTER_RESOURCE_TYPE_NAME}/{NODE_POOL_RESOURCE_TYPE_NAME}")
}
