//! Identifiers of resources in the backing cluster-management service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

const CLUSTERS_PREFIX: &str = "/api/clusters_mgmt/v1/clusters/";
const NODE_POOLS_SEGMENT: &str = "node_pools";

/// What an [`InternalId`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalIdKind {
    Cluster,
    NodePool,
}

/// A backend resource path such as
/// `/api/clusters_mgmt/v1/clusters/{id}/node_pools/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InternalId(String);

impl InternalId {
    pub fn parse(path: &str) -> Result<Self, CoreError> {
        let rest = path
            .strip_prefix(CLUSTERS_PREFIX)
            .ok_or_else(|| CoreError::invalid_resource_id(path, "not a cluster service path"))?;
        let parts: Vec<&str> = rest.split('/').collect();
        let valid = match parts.as_slice() {
            [cluster] => !cluster.is_empty(),
            [cluster, segment, pool] => {
                !cluster.is_empty() && *segment == NODE_POOLS_SEGMENT && !pool.is_empty()
            }
            _ => false,
        };
        if !valid {
            return Err(CoreError::invalid_resource_id(
                path,
                "unrecognized cluster service path",
            ));
        }
        Ok(Self(path.to_string()))
    }

    pub fn cluster(cluster_id: &str) -> Self {
        Self(format!("{CLUSTERS_PREFIX}{cluster_id}"))
    }

    pub fn node_pool(cluster_id: &str, node_pool_id: &str) -> Self {
        Self(format!(
            "{CLUSTERS_PREFIX}{cluster_id}/{NODE_POOLS_SEGMENT}/{node_pool_id}"
        ))
    }

    /// `None` for the empty (unassigned) identifier.
    pub fn kind(&self) -> Option<InternalIdKind> {
        if self.0.is_empty() {
            None
        } else if self.0.contains(&format!("/{NODE_POOLS_SEGMENT}/")) {
            Some(InternalIdKind::NodePool)
        } else {
            Some(InternalIdKind::Cluster)
        }
    }

    /// Last path segment.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InternalId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for InternalId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for InternalId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(Self::default());
        }
        InternalId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_and_node_pool_ids() {
        let cluster = InternalId::cluster("abc");
        assert_eq!(cluster.as_str(), "/api/clusters_mgmt/v1/clusters/abc");
        assert_eq!(cluster.kind(), Some(InternalIdKind::Cluster));
        assert_eq!(cluster.id(), "abc");

        let pool = InternalId::node_pool("abc", "np1");
        assert_eq!(pool.kind(), Some(InternalIdKind::NodePool));
        assert_eq!(pool.id(), "np1");
        assert_eq!(InternalId::parse(pool.as_str()).unwrap(), pool);
    }

    #[test]
    fn test_parse_rejects_foreign_paths() {
        assert!(InternalId::parse("/api/other/v1/clusters/abc").is_err());
        assert!(InternalId::parse("/api/clusters_mgmt/v1/clusters/").is_err());
        assert!(InternalId::parse("/api/clusters_mgmt/v1/clusters/abc/machine_pools/x").is_err());
    }

    #[test]
    fn test_empty_id_roundtrips_through_serde() {
        let empty: InternalId = serde_json::from_str("\"\"").unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.kind(), None);
        assert!(serde_json::from_str::<InternalId>("\"/bogus\"").is_err());
    }
}
