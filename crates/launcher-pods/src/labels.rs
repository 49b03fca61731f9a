//! Pod label vocabulary and composition

use std::collections::BTreeMap;

/// Label key marking pods created by the launcher
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
/// Value of `LABEL_MANAGED_BY`
pub const MANAGED_BY: &str = "workload-launcher";
/// Label key naming the role of a pod
pub const LABEL_COMPONENT: &str = "workload-launcher.io/component";

/// Component value for replication orchestrator pods
pub const COMPONENT_ORCHESTRATOR: &str = "replication-orchestrator";
/// Component value for source connector pods
pub const COMPONENT_SOURCE: &str = "source";
/// Component value for destination connector pods
pub const COMPONENT_DESTINATION: &str = "destination";
/// Component value for check connector pods
pub const COMPONENT_CHECK: &str = "check";

/// Role-specific label sets.
///
/// Each method returns a fixed mapping that does not depend on the request.
#[cfg_attr(test, mockall::automock)]
pub trait PodLabeler: Send + Sync {
    /// Labels for the replication orchestrator pod
    fn replication_orchestrator_labels(&self) -> BTreeMap<String, String>;

    /// Labels for the source connector of a replication
    fn source_labels(&self) -> BTreeMap<String, String>;

    /// Labels for the destination connector of a replication
    fn destination_labels(&self) -> BTreeMap<String, String>;

    /// Labels for a check connector pod
    fn check_connector_labels(&self) -> BTreeMap<String, String>;
}

/// Labeler using the launcher's standard label keys
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPodLabeler;

impl DefaultPodLabeler {
    fn component(component: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (LABEL_MANAGED_BY.to_string(), MANAGED_BY.to_string()),
            (LABEL_COMPONENT.to_string(), component.to_string()),
        ])
    }
}

impl PodLabeler for DefaultPodLabeler {
    fn replication_orchestrator_labels(&self) -> BTreeMap<String, String> {
        Self::component(COMPONENT_ORCHESTRATOR)
    }

    fn source_labels(&self) -> BTreeMap<String, String> {
        Self::component(COMPONENT_SOURCE)
    }

    fn destination_labels(&self) -> BTreeMap<String, String> {
        Self::component(COMPONENT_DESTINATION)
    }

    fn check_connector_labels(&self) -> BTreeMap<String, String> {
        Self::component(COMPONENT_CHECK)
    }
}

/// Merge role labels with caller-supplied shared labels.
///
/// Shared labels win on key collision so workload identity labels set by the
/// caller are never dropped.
pub fn compose_labels(
    role_labels: BTreeMap<String, String>,
    shared_labels: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut labels = role_labels;
    labels.extend(shared_labels.iter().map(|(k, v)| (k.clone(), v.clone())));
    labels
}
