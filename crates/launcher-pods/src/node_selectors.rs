//! Node selector resolution

use std::collections::BTreeMap;

use launcher_common::PlacementPolicy;

/// Pick the node selectors a pod is scheduled with.
///
/// Custom connectors go to isolated nodes when the policy defines them.
/// Without isolated selectors every pod uses the default set. The two sets
/// are never merged.
pub fn resolve_node_selectors(
    policy: &PlacementPolicy,
    uses_custom_connector: bool,
) -> BTreeMap<String, String> {
    match (&policy.isolated_node_selectors, uses_custom_connector) {
        (Some(isolated), true) => isolated.clone(),
        _ => policy.node_selectors.clone(),
    }
}
