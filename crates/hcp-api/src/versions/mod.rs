//! Concrete API versions and the validation they share.

pub mod v20240610preview;
pub mod v20250201preview;

use hcp_core::{CloudError, RequestMethod};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cluster::HcpOpenShiftCluster;
use crate::node_pool::HcpOpenShiftClusterNodePool;
use crate::registry::RegistryBuilder;
use crate::visibility::{CLUSTER_VISIBILITY, NODE_POOL_VISIBILITY, VisibilityTable};

/// Registers every API version this crate implements.
pub fn register_all(builder: &mut RegistryBuilder) -> &mut RegistryBuilder {
    builder
        .register(v20240610preview::Version20240610Preview)
        .register(v20250201preview::Version20250201Preview)
}

/// Maps canonical field paths to a version's wire paths for error targets.
pub(crate) type TargetAliases = &'static [(&'static str, &'static str)];

/// Overlays a JSON request body onto a wire value as an RFC 7386 merge
/// patch. `null` members reset the field to its zero value.
pub(crate) fn overlay<T>(value: &mut T, body: &[u8]) -> Result<(), CloudError>
where
    T: Serialize + DeserializeOwned,
{
    let patch: Value = serde_json::from_slice(body)
        .map_err(|e| CloudError::invalid_request_body(format!("Invalid request body: {e}")))?;
    if !patch.is_object() {
        return Err(CloudError::invalid_request_body(
            "Request body must be a JSON object",
        ));
    }

    let mut merged = serde_json::to_value(&*value).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize wire value");
        CloudError::internal_server_error()
    })?;
    json_patch::merge(&mut merged, &patch);

    *value = serde_json::from_value(merged)
        .map_err(|e| CloudError::invalid_request_body(e.to_string()))?;
    Ok(())
}

/// Shared static validation of a cluster request.
pub(crate) fn validate_cluster(
    desired: &HcpOpenShiftCluster,
    current: &HcpOpenShiftCluster,
    updating: bool,
    method: RequestMethod,
    aliases: TargetAliases,
) -> Result<(), CloudError> {
    let mut errors = Vec::new();
    check_method(updating, method, &mut errors);
    check_visibility(&CLUSTER_VISIBILITY, desired, current, updating, aliases, &mut errors);

    let props = &desired.properties;
    if !updating && props.cluster_profile.subnet_id.is_empty() {
        errors.push(CloudError::missing_required_field(alias(
            aliases,
            "properties.clusterProfile.subnetId",
        )));
    }

    let host_prefix = props.network_profile.host_prefix;
    if !(23..=26).contains(&host_prefix) {
        errors.push(CloudError::invalid_request_content(
            alias(aliases, "properties.networkProfile.hostPrefix"),
            format!("Invalid value '{host_prefix}': must be between 23 and 26"),
        ));
    }

    let proxy = &props.proxy_profile;
    if !proxy.trusted_ca.is_empty() && proxy.http_proxy.is_empty() && proxy.https_proxy.is_empty()
    {
        errors.push(CloudError::invalid_request_content(
            alias(aliases, "properties.proxyProfile.trustedCa"),
            "A trusted CA bundle requires an HTTP or HTTPS proxy",
        ));
    }

    finish(errors)
}

/// Shared static validation of a node pool request.
pub(crate) fn validate_node_pool(
    desired: &HcpOpenShiftClusterNodePool,
    current: &HcpOpenShiftClusterNodePool,
    updating: bool,
    method: RequestMethod,
    aliases: TargetAliases,
) -> Result<(), CloudError> {
    let mut errors = Vec::new();
    check_method(updating, method, &mut errors);
    check_visibility(&NODE_POOL_VISIBILITY, desired, current, updating, aliases, &mut errors);

    let spec = &desired.properties.spec;
    if !updating && spec.vm_size.is_empty() {
        errors.push(CloudError::missing_required_field(alias(
            aliases,
            "properties.spec.vmSize",
        )));
    }

    if spec.replicas < 0 {
        errors.push(CloudError::invalid_request_content(
            alias(aliases, "properties.spec.replicas"),
            format!("Invalid value '{}': must not be negative", spec.replicas),
        ));
    }

    if let Some(autoscaling) = &spec.autoscaling {
        if autoscaling.min_replicas > autoscaling.max_replicas {
            errors.push(CloudError::invalid_request_content(
                alias(aliases, "properties.spec.autoscaling.minReplicas"),
                "Minimum replicas must not exceed maximum replicas",
            ));
        }
        if spec.replicas != 0 {
            errors.push(CloudError::invalid_request_content(
                alias(aliases, "properties.spec.replicas"),
                "Replicas must not be set when autoscaling is enabled",
            ));
        }
    }

    finish(errors)
}

fn check_method(updating: bool, method: RequestMethod, errors: &mut Vec<CloudError>) {
    if method == RequestMethod::Patch && !updating {
        errors.push(CloudError::invalid_request_body(
            "PATCH is only valid for an existing resource",
        ));
    }
}

fn check_visibility<T: Serialize>(
    table: &VisibilityTable,
    desired: &T,
    current: &T,
    updating: bool,
    aliases: TargetAliases,
    errors: &mut Vec<CloudError>,
) {
    let (Ok(desired), Ok(current)) = (serde_json::to_value(desired), serde_json::to_value(current))
    else {
        errors.push(CloudError::internal_server_error());
        return;
    };

    for violation in table.violations(&desired, &current, updating) {
        let target = alias(aliases, &violation.path);
        if violation.flags.is_read_only() {
            errors.push(CloudError::invalid_request_content(
                target.clone(),
                format!("Field '{target}' is read-only"),
            ));
        } else {
            errors.push(CloudError::property_change_not_allowed(target));
        }
    }
}

fn alias(aliases: TargetAliases, path: &str) -> String {
    aliases
        .iter()
        .find(|(canonical, _)| *canonical == path)
        .map(|(_, wire)| (*wire).to_string())
        .unwrap_or_else(|| path.to_string())
}

fn finish(errors: Vec<CloudError>) -> Result<(), CloudError> {
    match CloudError::from_details(errors) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Wire strings are optional; empty canonical strings are omitted.
pub(crate) fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Renders a canonical value through a visibility table and a wire
/// conversion.
pub(crate) fn marshal_with<C, W>(
    table: &VisibilityTable,
    canonical: &C,
    to_wire: impl FnOnce(&C) -> W,
) -> crate::error::Result<Vec<u8>>
where
    C: Serialize + DeserializeOwned,
    W: Serialize,
{
    let mut value = serde_json::to_value(canonical)?;
    table.strip_unreadable(&mut value);
    let visible: C = serde_json::from_value(value)?;
    Ok(serde_json::to_vec(&to_wire(&visible))?)
}
