//! Per-field visibility of the canonical model.
//!
//! A visibility table maps dotted JSON paths of the canonical model to the
//! request kinds that may see or set them. Paths not listed inherit the
//! flags of their nearest listed ancestor; the root is fully visible.
//!
//! The tables are consulted on the canonical JSON, so every API version
//! shares the same rules regardless of how it lays out its wire shape.

use std::collections::BTreeSet;
use std::ops::BitOr;

use serde_json::{Map, Value};

/// A set of request kinds a field is visible to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFlags(u8);

impl VisibilityFlags {
    pub const NONE: Self = Self(0);
    pub const READ: Self = Self(1);
    pub const CREATE: Self = Self(1 << 1);
    pub const UPDATE: Self = Self(1 << 2);

    pub const R: Self = Self::READ;
    pub const RC: Self = Self(Self::READ.0 | Self::CREATE.0);
    pub const RCU: Self = Self(Self::READ.0 | Self::CREATE.0 | Self::UPDATE.0);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn can_read(self) -> bool {
        self.contains(Self::READ)
    }

    /// Whether a request may set the field, given whether it updates an
    /// existing resource.
    pub const fn can_write(self, updating: bool) -> bool {
        if updating {
            self.contains(Self::UPDATE)
        } else {
            self.contains(Self::CREATE)
        }
    }

    /// Readable, but settable by neither create nor update.
    pub const fn is_read_only(self) -> bool {
        self.can_read() && !self.contains(Self::CREATE) && !self.contains(Self::UPDATE)
    }
}

impl BitOr for VisibilityFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A field whose requested value differs from the current value although
/// its visibility forbids setting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityViolation {
    pub path: String,
    pub flags: VisibilityFlags,
}

/// Static path to flags mapping.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityTable {
    entries: &'static [(&'static str, VisibilityFlags)],
}

impl VisibilityTable {
    pub const fn new(entries: &'static [(&'static str, VisibilityFlags)]) -> Self {
        Self { entries }
    }

    /// Flags declared for exactly this path.
    pub fn lookup(&self, path: &str) -> Option<VisibilityFlags> {
        self.entries
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, flags)| *flags)
    }

    /// Effective flags for a path, inherited from the nearest listed ancestor.
    pub fn effective(&self, path: &str) -> VisibilityFlags {
        let mut candidate = path;
        loop {
            if let Some(flags) = self.lookup(candidate) {
                return flags;
            }
            match candidate.rfind('.') {
                Some(idx) => candidate = &candidate[..idx],
                None => return VisibilityFlags::RCU,
            }
        }
    }

    /// Removes every field lacking read visibility.
    pub fn strip_unreadable(&self, value: &mut Value) {
        self.strip(String::new(), VisibilityFlags::RCU, value);
    }

    fn strip(&self, path: String, inherited: VisibilityFlags, value: &mut Value) {
        let Value::Object(map) = value else {
            return;
        };
        map.retain(|key, _| self.child_flags(&path, key, inherited).can_read());
        for (key, child) in map.iter_mut() {
            let child_path = join(&path, key);
            let flags = self.lookup(&child_path).unwrap_or(inherited);
            self.strip(child_path, flags, child);
        }
    }

    /// Compares a requested canonical value against the current one and
    /// reports every field that changed without write visibility.
    ///
    /// A missing field and an explicit `null` compare equal.
    pub fn violations(
        &self,
        desired: &Value,
        current: &Value,
        updating: bool,
    ) -> Vec<VisibilityViolation> {
        let mut out = Vec::new();
        self.walk(
            String::new(),
            VisibilityFlags::RCU,
            desired,
            current,
            updating,
            &mut out,
        );
        out
    }

    fn walk(
        &self,
        path: String,
        flags: VisibilityFlags,
        desired: &Value,
        current: &Value,
        updating: bool,
        out: &mut Vec<VisibilityViolation>,
    ) {
        let empty = Map::new();
        let as_object = |v: &'_ Value| -> Option<bool> {
            match v {
                Value::Object(_) => Some(true),
                Value::Null => Some(false),
                _ => None,
            }
        };

        // Recurse only when both sides are objects or absent.
        if let (Some(d_obj), Some(c_obj)) = (as_object(desired), as_object(current))
            && (d_obj || c_obj)
        {
            let d_map = desired.as_object().unwrap_or(&empty);
            let c_map = current.as_object().unwrap_or(&empty);
            let keys: BTreeSet<&String> = d_map.keys().chain(c_map.keys()).collect();
            for key in keys {
                let child_path = join(&path, key);
                let child_flags = self.lookup(&child_path).unwrap_or(flags);
                self.walk(
                    child_path,
                    child_flags,
                    d_map.get(key.as_str()).unwrap_or(&Value::Null),
                    c_map.get(key.as_str()).unwrap_or(&Value::Null),
                    updating,
                    out,
                );
            }
            return;
        }

        if desired != current && !flags.can_write(updating) {
            out.push(VisibilityViolation { path, flags });
        }
    }

    fn child_flags(&self, parent: &str, key: &str, inherited: VisibilityFlags) -> VisibilityFlags {
        self.lookup(&join(parent, key)).unwrap_or(inherited)
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

use VisibilityFlags as F;

pub static CLUSTER_VISIBILITY: VisibilityTable = VisibilityTable::new(&[
    ("id", F::R),
    ("name", F::R),
    ("type", F::R),
    ("systemData", F::R),
    ("location", F::RC),
    ("tags", F::RCU),
    ("properties.provisioningState", F::R),
    ("properties.clusterProfile.controlPlaneVersion", F::RCU),
    ("properties.clusterProfile.subnetId", F::RC),
    ("properties.clusterProfile.managedResourceGroup", F::RC),
    ("properties.clusterProfile.oidcIssuerUrl", F::R),
    ("properties.proxyProfile", F::RCU),
    ("properties.apiProfile.url", F::R),
    ("properties.apiProfile.ip", F::R),
    ("properties.apiProfile.visibility", F::RC),
    ("properties.consoleProfile.url", F::R),
    ("properties.consoleProfile.fips", F::RCU),
    ("properties.ingressProfile.ip", F::R),
    ("properties.ingressProfile.url", F::R),
    ("properties.ingressProfile.visibility", F::RC),
    ("properties.networkProfile", F::RC),
    ("properties.nodePoolProfiles", F::R),
    ("properties.etcdEncryption", F::RC),
]);

pub static NODE_POOL_VISIBILITY: VisibilityTable = VisibilityTable::new(&[
    ("id", F::R),
    ("name", F::R),
    ("type", F::R),
    ("systemData", F::R),
    ("location", F::RC),
    ("tags", F::RCU),
    ("properties.provisioningState", F::R),
    ("properties.spec.version", F::RCU),
    ("properties.spec.subnetId", F::RC),
    ("properties.spec.vmSize", F::RC),
    ("properties.spec.diskSizeGiB", F::RC),
    ("properties.spec.replicas", F::RCU),
    ("properties.spec.autoRepair", F::RC),
    ("properties.spec.labels", F::RCU),
    ("properties.spec.taints", F::RCU),
    ("properties.spec.autoscaling", F::RCU),
]);

pub static ADMIN_CREDENTIAL_VISIBILITY: VisibilityTable =
    VisibilityTable::new(&[("kubeconfig", F::R), ("expirationTimestamp", F::R)]);
