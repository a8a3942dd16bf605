//! The capability set every API version provides.

use std::fmt::Debug;

use hcp_core::{CloudError, RequestMethod};

use crate::cluster::HcpOpenShiftCluster;
use crate::error::Result;
use crate::node_pool::{HcpOpenShiftClusterAdminCredential, HcpOpenShiftClusterNodePool};

/// One wire schema generation of the resource provider API.
///
/// Implementations are stateless transforms between their wire shape and
/// the canonical model. They are registered under [`Version::name`].
pub trait Version: Send + Sync + Debug {
    /// The `api-version` string this implementation serves.
    fn name(&self) -> &'static str;

    /// Builds this version's view of a cluster.
    ///
    /// With `None` the result carries this version's defaults; otherwise it
    /// mirrors the given canonical state.
    fn new_cluster(&self, from: Option<&HcpOpenShiftCluster>) -> Box<dyn VersionedCluster>;

    /// Builds this version's view of a node pool.
    fn new_node_pool(
        &self,
        from: Option<&HcpOpenShiftClusterNodePool>,
    ) -> Box<dyn VersionedNodePool>;

    /// Renders a cluster in this version's wire shape, omitting fields
    /// without read visibility.
    fn marshal_cluster(&self, cluster: &HcpOpenShiftCluster) -> Result<Vec<u8>>;

    fn marshal_node_pool(&self, node_pool: &HcpOpenShiftClusterNodePool) -> Result<Vec<u8>>;

    fn marshal_admin_credential(
        &self,
        credential: &HcpOpenShiftClusterAdminCredential,
    ) -> Result<Vec<u8>>;
}

/// A cluster in some version's wire shape.
pub trait VersionedCluster: Send + Sync + Debug {
    /// Overlays a JSON request body onto this value as a merge patch.
    fn apply_json(&mut self, body: &[u8]) -> std::result::Result<(), CloudError>;

    /// Copies every field this value carries onto the canonical model.
    fn normalize(&self, out: &mut HcpOpenShiftCluster);

    /// Structural validation against the value the request started from.
    ///
    /// Performs no I/O.
    fn validate_static(
        &self,
        current: &dyn VersionedCluster,
        updating: bool,
        method: RequestMethod,
    ) -> std::result::Result<(), CloudError>;
}

/// A node pool in some version's wire shape.
pub trait VersionedNodePool: Send + Sync + Debug {
    fn apply_json(&mut self, body: &[u8]) -> std::result::Result<(), CloudError>;

    fn normalize(&self, out: &mut HcpOpenShiftClusterNodePool);

    fn validate_static(
        &self,
        current: &dyn VersionedNodePool,
        updating: bool,
        method: RequestMethod,
    ) -> std::result::Result<(), CloudError>;
}
