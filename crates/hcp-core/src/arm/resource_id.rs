//! Azure Resource Manager resource identifiers.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

const SUBSCRIPTIONS_KEY: &str = "subscriptions";
const RESOURCE_GROUPS_KEY: &str = "resourceGroups";
const PROVIDERS_KEY: &str = "providers";
const RESOURCES_NAMESPACE: &str = "Microsoft.Resources";

/// A parsed ARM resource identifier.
///
/// The identifier keeps the exact string it was parsed from so that it
/// serializes back unchanged. Equality and hashing ignore ASCII case, as ARM
/// does.
#[derive(Debug, Clone)]
pub struct ResourceId {
    raw: String,
    subscription_id: String,
    resource_group: Option<String>,
    provider_namespace: Option<String>,
    /// (type, name) pairs below the provider namespace, outermost first.
    segments: Vec<(String, String)>,
}

impl ResourceId {
    /// Parses a resource identifier of the form
    /// `/subscriptions/{sub}[/resourceGroups/{rg}][/providers/{ns}/{type}/{name}...]`.
    pub fn parse(id: &str) -> Result<Self> {
        let trimmed = id.trim();
        if !trimmed.starts_with('/') {
            return Err(CoreError::invalid_resource_id(id, "must start with '/'"));
        }

        let parts: Vec<&str> = trimmed.trim_matches('/').split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(CoreError::invalid_resource_id(id, "contains an empty segment"));
        }
        if parts.len() < 2 || !parts[0].eq_ignore_ascii_case(SUBSCRIPTIONS_KEY) {
            return Err(CoreError::invalid_resource_id(
                id,
                "missing subscriptions segment",
            ));
        }

        let subscription_id = parts[1].to_string();
        let mut rest = &parts[2..];

        let mut resource_group = None;
        if rest.first().is_some_and(|p| p.eq_ignore_ascii_case(RESOURCE_GROUPS_KEY)) {
            let name = rest
                .get(1)
                .ok_or_else(|| CoreError::invalid_resource_id(id, "missing resource group name"))?;
            resource_group = Some((*name).to_string());
            rest = &rest[2..];
        }

        let mut provider_namespace = None;
        let mut segments = Vec::new();
        if !rest.is_empty() {
            if !rest[0].eq_ignore_ascii_case(PROVIDERS_KEY) {
                return Err(CoreError::invalid_resource_id(
                    id,
                    format!("unexpected segment '{}'", rest[0]),
                ));
            }
            let namespace = rest
                .get(1)
                .ok_or_else(|| CoreError::invalid_resource_id(id, "missing provider namespace"))?;
            provider_namespace = Some((*namespace).to_string());

            let pairs = &rest[2..];
            if pairs.is_empty() || pairs.len() % 2 != 0 {
                return Err(CoreError::invalid_resource_id(
                    id,
                    "resource types and names must come in pairs",
                ));
            }
            segments = pairs
                .chunks(2)
                .map(|pair| (pair[0].to_string(), pair[1].to_string()))
                .collect();
        }

        Ok(Self {
            raw: trimmed.trim_end_matches('/').to_string(),
            subscription_id,
            resource_group,
            provider_namespace,
            segments,
        })
    }

    /// The identifier exactly as it was parsed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group_name(&self) -> Option<&str> {
        self.resource_group.as_deref()
    }

    pub fn provider_namespace(&self) -> Option<&str> {
        self.provider_namespace.as_deref()
    }

    /// Full resource type, e.g. `Microsoft.RedHatOpenShift/hcpOpenShiftClusters/nodePools`.
    pub fn resource_type(&self) -> String {
        match &self.provider_namespace {
            Some(namespace) => {
                let mut resource_type = namespace.clone();
                for (type_name, _) in &self.segments {
                    resource_type.push('/');
                    resource_type.push_str(type_name);
                }
                resource_type
            }
            None if self.resource_group.is_some() => format!("{RESOURCES_NAMESPACE}/resourceGroups"),
            None => format!("{RESOURCES_NAMESPACE}/subscriptions"),
        }
    }

    /// Last type segment, e.g. `nodePools`.
    pub fn resource_type_name(&self) -> &str {
        match self.segments.last() {
            Some((type_name, _)) => type_name.as_str(),
            None if self.resource_group.is_some() => RESOURCE_GROUPS_KEY,
            None => SUBSCRIPTIONS_KEY,
        }
    }

    /// The resource name (last segment of the identifier).
    pub fn name(&self) -> &str {
        match self.segments.last() {
            Some((_, name)) => name.as_str(),
            None => self
                .resource_group
                .as_deref()
                .unwrap_or(&self.subscription_id),
        }
    }

    /// Identifier of the enclosing resource, if any.
    ///
    /// A top-level provider resource's parent is its resource group; a
    /// resource group's parent is its subscription.
    pub fn parent(&self) -> Option<ResourceId> {
        let raw = if self.segments.len() > 1 {
            let cut = self.raw.rfind('/')?;
            let cut = self.raw[..cut].rfind('/')?;
            self.raw[..cut].to_string()
        } else if self.provider_namespace.is_some() {
            match &self.resource_group {
                Some(rg) => format!("/subscriptions/{}/resourceGroups/{rg}", self.subscription_id),
                None => format!("/subscriptions/{}", self.subscription_id),
            }
        } else if self.resource_group.is_some() {
            format!("/subscriptions/{}", self.subscription_id)
        } else {
            return None;
        };
        ResourceId::parse(&raw).ok()
    }

    /// Returns `true` if `self` is `other` or nested anywhere below it.
    pub fn is_within(&self, other: &ResourceId) -> bool {
        let mine = self.raw.to_ascii_lowercase();
        let theirs = other.raw.to_ascii_lowercase();
        mine == theirs || mine.starts_with(&format!("{theirs}/"))
    }
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        self.raw.eq_ignore_ascii_case(&other.raw)
    }
}

impl Eq for ResourceId {}

impl Hash for ResourceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ResourceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceId::parse(&s).map_err(serde::de::Error::custom)
    }
}
