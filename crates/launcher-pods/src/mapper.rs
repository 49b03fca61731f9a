//! LaunchInputMapper: orchestrates placement, identity, labels, and files
//!
//! For each request variant:
//! - Picks the placement policy of the variant's workload family
//! - Resolves node selectors from the custom-connector flag
//! - Resolves pod identity and main container
//! - Composes labels per role with the caller's shared labels
//! - Builds the init file manifest
//!
//! Mapping is pure: no orchestrator calls, no shared mutable state.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use launcher_common::{Error, LauncherConfig, PlacementPolicy, Result};

use crate::feature_flags::{FeatureFlagClient, StaticFeatureFlags};
use crate::files::FileMapBuilder;
use crate::labels::{compose_labels, DefaultPodLabeler, PodLabeler};
use crate::model::{CheckConnectionInput, LaunchRequest, ReplicationInput};
use crate::node_selectors::resolve_node_selectors;
use crate::pod_name::{DeterministicPodNameGenerator, PodIdentityResolver, PodNameGenerator};
use crate::serializer::{JsonSerializer, ObjectSerializer};
use crate::spec::{LaunchSpecification, PodRole};

/// Maps launch requests to launch specifications.
///
/// Holds only immutable configuration and thread-safe collaborators, so one
/// instance can serve concurrent requests.
#[derive(Clone)]
pub struct LaunchInputMapper {
    labeler: Arc<dyn PodLabeler>,
    identity: PodIdentityResolver,
    files: FileMapBuilder,
    replication_policy: PlacementPolicy,
    check_policy: PlacementPolicy,
    feature_flags: Arc<dyn FeatureFlagClient>,
}

impl LaunchInputMapper {
    /// Create a mapper from explicit collaborators
    pub fn new(
        config: &LauncherConfig,
        serializer: Arc<dyn ObjectSerializer>,
        labeler: Arc<dyn PodLabeler>,
        pod_names: Arc<dyn PodNameGenerator>,
        feature_flags: Arc<dyn FeatureFlagClient>,
    ) -> Self {
        Self {
            labeler,
            identity: PodIdentityResolver::new(
                config.namespace.clone(),
                config.orchestrator.clone(),
                pod_names,
            ),
            files: FileMapBuilder::new(serializer, config.orchestrator_env.clone()),
            replication_policy: config.replication.clone(),
            check_policy: config.check.clone(),
            feature_flags,
        }
    }

    /// Create a mapper using the default serializer, labeler, pod names, and
    /// static feature flags from `config`
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::new(
            config,
            Arc::new(JsonSerializer),
            Arc::new(DefaultPodLabeler),
            Arc::new(DeterministicPodNameGenerator),
            Arc::new(StaticFeatureFlags::from_config(config)),
        )
    }

    /// Map a launch request to the specification of the pod that runs it.
    ///
    /// Discover and spec requests are not launched through this mapper yet and
    /// fail with `Error::UnsupportedVariant`.
    #[instrument(skip(self, request, shared_labels), fields(variant = request.variant_name()))]
    pub fn map(
        &self,
        workload_id: &str,
        request: &LaunchRequest,
        shared_labels: &BTreeMap<String, String>,
    ) -> Result<LaunchSpecification> {
        let mut spec = match request {
            LaunchRequest::Replication(input) => {
                self.map_replication(workload_id, input, shared_labels)?
            }
            LaunchRequest::Check(input) => self.map_check(workload_id, input, shared_labels)?,
            LaunchRequest::Discover(_) | LaunchRequest::Spec(_) => {
                return Err(Error::unsupported_variant(request.variant_name()));
            }
        };
        spec.scheduler_name = self.feature_flags.custom_scheduler(request.connection_id());

        debug!(
            pod = %spec.pod_info.name,
            namespace = %spec.pod_info.namespace,
            image = %spec.pod_info.main_container_info.image,
            "mapped launch request"
        );
        Ok(spec)
    }

    fn map_replication(
        &self,
        workload_id: &str,
        input: &ReplicationInput,
        shared_labels: &BTreeMap<String, String>,
    ) -> Result<LaunchSpecification> {
        let job_id = input.job_id()?;
        let attempt_id = input.attempt_id()?;

        let node_selectors =
            resolve_node_selectors(&self.replication_policy, input.uses_custom_connector());
        let pod_info = self.identity.resolve_for_replication(job_id, attempt_id);
        let labels = BTreeMap::from([
            (
                PodRole::Orchestrator,
                compose_labels(self.labeler.replication_orchestrator_labels(), shared_labels),
            ),
            (
                PodRole::Source,
                compose_labels(self.labeler.source_labels(), shared_labels),
            ),
            (
                PodRole::Destination,
                compose_labels(self.labeler.destination_labels(), shared_labels),
            ),
        ]);
        let file_map = self
            .files
            .build_for_replication(input, workload_id, &pod_info)?;

        Ok(LaunchSpecification {
            pod_info,
            main_role: PodRole::Orchestrator,
            node_selectors,
            annotations: self.replication_policy.annotations.clone(),
            labels,
            file_map,
            resource_requirements: input.orchestrator_resource_requirements().cloned(),
            scheduler_name: None,
        })
    }

    fn map_check(
        &self,
        workload_id: &str,
        input: &CheckConnectionInput,
        shared_labels: &BTreeMap<String, String>,
    ) -> Result<LaunchSpecification> {
        let job_id = input.job_id()?;
        let attempt_id = input.attempt_id()?;
        let actor_type = input.actor_type()?;
        let image = &input.launcher_config()?.docker_image;
        if image.trim().is_empty() {
            return Err(Error::configuration_for_field(
                "checkConnectionInput.launcherConfig.dockerImage",
                "connector image must not be empty",
            ));
        }

        let node_selectors =
            resolve_node_selectors(&self.check_policy, input.uses_custom_connector());
        let pod_info = self.identity.resolve_for_check(
            job_id,
            attempt_id,
            actor_type,
            image,
            &self.check_policy,
        );
        let labels = BTreeMap::from([(
            PodRole::Connector,
            compose_labels(self.labeler.check_connector_labels(), shared_labels),
        )]);
        let file_map = self.files.build_for_check(input, workload_id)?;

        Ok(LaunchSpecification {
            pod_info,
            main_role: PodRole::Connector,
            node_selectors,
            annotations: self.check_policy.annotations.clone(),
            labels,
            file_map,
            resource_requirements: input.resource_requirements().cloned(),
            scheduler_name: None,
        })
    }
}
