//! Init file manifests
//!
//! The launched pod's init container writes each entry of the manifest to
//! the shared config volume. Key sets are fixed per request variant; a
//! missing sub-object fails the whole manifest before anything is serialized.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use launcher_common::Result;

use crate::model::{CheckConnectionInput, IntegrationLauncherConfig, ReplicationInput};
use crate::serializer::{serialize_as, ObjectSerializer};
use crate::spec::PodInfo;

/// File name → file contents
pub type FileMap = BTreeMap<String, String>;

/// Orchestrator environment variables
pub const INIT_FILE_ENV_MAP: &str = "envMap.json";
/// Name of the application the orchestrator should run
pub const INIT_FILE_APPLICATION: &str = "application.txt";
/// Job and attempt
pub const INIT_FILE_JOB_RUN_CONFIG: &str = "jobRunConfig.json";
/// Full replication input
pub const INIT_FILE_INPUT: &str = "input.json";
/// Source connector launch config
pub const INIT_FILE_SOURCE_LAUNCHER_CONFIG: &str = "sourceLauncherConfig.json";
/// Destination connector launch config
pub const INIT_FILE_DESTINATION_LAUNCHER_CONFIG: &str = "destinationLauncherConfig.json";
/// Identity of the orchestrator pod itself
pub const KUBE_POD_INFO: &str = "KUBE_POD_INFO";
/// Workload id, written verbatim
pub const WORKLOAD_ID_FILE: &str = "WORKLOAD_ID";
/// Connector configuration of a check
pub const CONNECTION_CONFIGURATION: &str = "connectionConfiguration.json";
/// Input envelope read by the sidecar of check pods
pub const SIDECAR_INPUT: &str = "sidecarInput.json";

/// Contents of `INIT_FILE_APPLICATION` for replication pods
pub const REPLICATION_APPLICATION: &str = "replication-orchestrator";

/// Operation a sidecar performs
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    /// Connection check
    Check,
}

/// Envelope written to `SIDECAR_INPUT`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SidecarInput<'a> {
    operation_type: OperationType,
    workload_id: &'a str,
    integration_launcher_config: &'a IntegrationLauncherConfig,
    check_connection_input: &'a CheckConnectionInput,
}

/// Builds init file manifests for launch requests
#[derive(Clone)]
pub struct FileMapBuilder {
    serializer: Arc<dyn ObjectSerializer>,
    orchestrator_env: BTreeMap<String, String>,
}

impl FileMapBuilder {
    /// Create a builder.
    ///
    /// `orchestrator_env` is written to every replication manifest.
    pub fn new(
        serializer: Arc<dyn ObjectSerializer>,
        orchestrator_env: BTreeMap<String, String>,
    ) -> Self {
        Self {
            serializer,
            orchestrator_env,
        }
    }

    /// Manifest of a replication orchestrator pod
    pub fn build_for_replication(
        &self,
        input: &ReplicationInput,
        workload_id: &str,
        pod_info: &PodInfo,
    ) -> Result<FileMap> {
        let job_run_config = input.job_run_config()?;
        let source = input.source_launcher_config()?;
        let destination = input.destination_launcher_config()?;

        let serializer = self.serializer.as_ref();
        let files = FileMap::from([
            (
                INIT_FILE_ENV_MAP.to_string(),
                serialize_as(serializer, "orchestratorEnv", &self.orchestrator_env)?,
            ),
            (
                INIT_FILE_APPLICATION.to_string(),
                REPLICATION_APPLICATION.to_string(),
            ),
            (
                INIT_FILE_JOB_RUN_CONFIG.to_string(),
                serialize_as(serializer, "JobRunConfig", job_run_config)?,
            ),
            (
                INIT_FILE_INPUT.to_string(),
                serialize_as(serializer, "ReplicationInput", input)?,
            ),
            (
                INIT_FILE_SOURCE_LAUNCHER_CONFIG.to_string(),
                serialize_as(serializer, "IntegrationLauncherConfig", source)?,
            ),
            (
                INIT_FILE_DESTINATION_LAUNCHER_CONFIG.to_string(),
                serialize_as(serializer, "IntegrationLauncherConfig", destination)?,
            ),
            (
                KUBE_POD_INFO.to_string(),
                serialize_as(serializer, "PodInfo", pod_info)?,
            ),
            (WORKLOAD_ID_FILE.to_string(), workload_id.to_string()),
        ]);

        debug!(workload_id, files = files.len(), "built replication file map");
        Ok(files)
    }

    /// Manifest of a check pod
    pub fn build_for_check(
        &self,
        input: &CheckConnectionInput,
        workload_id: &str,
    ) -> Result<FileMap> {
        let job_run_config = input.job_run_config()?;
        let launcher_config = input.launcher_config()?;
        let connection_configuration = input.connection_configuration_payload()?;

        let sidecar_input = SidecarInput {
            operation_type: OperationType::Check,
            workload_id,
            integration_launcher_config: launcher_config,
            check_connection_input: input,
        };

        let serializer = self.serializer.as_ref();
        let files = FileMap::from([
            (
                INIT_FILE_JOB_RUN_CONFIG.to_string(),
                serialize_as(serializer, "JobRunConfig", job_run_config)?,
            ),
            (
                CONNECTION_CONFIGURATION.to_string(),
                serialize_as(serializer, "connectionConfiguration", connection_configuration)?,
            ),
            (
                SIDECAR_INPUT.to_string(),
                serialize_as(serializer, "SidecarInput", &sidecar_input)?,
            ),
        ]);

        debug!(workload_id, files = files.len(), "built check file map");
        Ok(files)
    }
}
