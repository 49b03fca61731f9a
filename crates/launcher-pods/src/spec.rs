//! Launch specification output types

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use launcher_common::ContainerInfo;

use crate::files::FileMap;
use crate::model::ResourceRequirements;

/// Identity of a launched pod
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PodInfo {
    /// Namespace the pod is created in
    pub namespace: String,
    /// Pod name, a valid DNS label
    pub name: String,
    /// Main container image and pull policy
    pub main_container_info: ContainerInfo,
}

/// Role a label set applies to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PodRole {
    /// Replication orchestrator (main container of a replication pod)
    Orchestrator,
    /// Source connector launched by the orchestrator
    Source,
    /// Destination connector launched by the orchestrator
    Destination,
    /// Connector run by a check pod
    Connector,
}

impl fmt::Display for PodRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PodRole::Orchestrator => "orchestrator",
            PodRole::Source => "source",
            PodRole::Destination => "destination",
            PodRole::Connector => "connector",
        };
        f.write_str(name)
    }
}

/// Everything the orchestrator client needs to create one pod.
///
/// Built once per request by `LaunchInputMapper` and never modified.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSpecification {
    /// Pod namespace, name, and main container
    pub pod_info: PodInfo,
    /// Role of the pod's main container
    pub main_role: PodRole,
    /// Node selectors after placement resolution
    pub node_selectors: BTreeMap<String, String>,
    /// Pod annotations
    pub annotations: BTreeMap<String, String>,
    /// Composed labels per role present in the request
    pub labels: BTreeMap<PodRole, BTreeMap<String, String>>,
    /// Init files staged into the pod
    pub file_map: FileMap,
    /// Resource requirements of the main container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_requirements: Option<ResourceRequirements>,
    /// Scheduler assigned by feature flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler_name: Option<String>,
}

impl LaunchSpecification {
    /// Labels composed for a role, if the role is part of this launch
    pub fn labels_for(&self, role: PodRole) -> Option<&BTreeMap<String, String>> {
        self.labels.get(&role)
    }

    /// Kubernetes metadata for the launched pod.
    ///
    /// Carries the namespace, name, annotations, and the main role's labels.
    pub fn pod_metadata(&self) -> ObjectMeta {
        let labels = self.labels_for(self.main_role).cloned().unwrap_or_default();
        ObjectMeta {
            name: Some(self.pod_info.name.clone()),
            namespace: Some(self.pod_info.namespace.clone()),
            labels: (!labels.is_empty()).then_some(labels),
            annotations: (!self.annotations.is_empty()).then(|| self.annotations.clone()),
            ..Default::default()
        }
    }

    /// Kubernetes resource requirements of the main container
    pub fn k8s_resources(&self) -> Option<k8s_openapi::api::core::v1::ResourceRequirements> {
        self.resource_requirements.as_ref().map(|r| r.to_k8s())
    }
}
