//! Launch request data model
//!
//! Requests arrive as JSON payloads. Sub-objects the launcher needs are
//! `Option`s so an incomplete payload still deserializes and is rejected
//! during mapping with a field-specific configuration error.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use launcher_common::{Error, Result};

/// Which side of a connection a connector plays
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorType {
    /// Reads records
    Source,
    /// Writes records
    Destination,
}

impl ActorType {
    /// Lowercase name, usable in pod names and label values
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::Source => "source",
            ActorType::Destination => "destination",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU and memory requests and limits, each optional
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    /// CPU request (e.g., "500m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_request: Option<String>,
    /// CPU limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,
    /// Memory request (e.g., "1Gi")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_request: Option<String>,
    /// Memory limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,
}

impl ResourceRequirements {
    /// Convert to the Kubernetes container resource representation.
    ///
    /// Blank values are dropped; `requests`/`limits` are `None` when empty.
    pub fn to_k8s(&self) -> k8s_openapi::api::core::v1::ResourceRequirements {
        fn quantities(
            cpu: &Option<String>,
            memory: &Option<String>,
        ) -> Option<BTreeMap<String, Quantity>> {
            let map: BTreeMap<String, Quantity> = [("cpu", cpu), ("memory", memory)]
                .into_iter()
                .filter_map(|(name, value)| {
                    value
                        .as_deref()
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(|v| (name.to_string(), Quantity(v.to_string())))
                })
                .collect();
            (!map.is_empty()).then_some(map)
        }

        k8s_openapi::api::core::v1::ResourceRequirements {
            requests: quantities(&self.cpu_request, &self.memory_request),
            limits: quantities(&self.cpu_limit, &self.memory_limit),
            ..Default::default()
        }
    }
}

/// Per-container resource requirements of a replication run
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncResourceRequirements {
    /// Orchestrator container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestrator: Option<ResourceRequirements>,
    /// Source connector container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ResourceRequirements>,
    /// Destination connector container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<ResourceRequirements>,
}

/// Job and attempt a launched pod belongs to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobRunConfig {
    /// Job identifier
    pub job_id: String,
    /// Attempt number within the job
    pub attempt_id: u64,
}

/// How to launch one connector
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationLauncherConfig {
    /// Job identifier
    pub job_id: String,
    /// Attempt number within the job
    pub attempt_id: u64,
    /// Connector image reference
    pub docker_image: String,
    /// Whether the image is user-supplied code
    #[serde(default)]
    pub is_custom_connector: bool,
    /// Connection the job belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<Uuid>,
    /// Workspace the job belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<Uuid>,
    /// Connector protocol version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}

/// Input of a full replication run
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationInput {
    /// Job and attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_run_config: Option<JobRunConfig>,
    /// Source connector launch config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_launcher_config: Option<IntegrationLauncherConfig>,
    /// Destination connector launch config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_launcher_config: Option<IntegrationLauncherConfig>,
    /// Connection being replicated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<Uuid>,
    /// Workspace owning the connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<Uuid>,
    /// Resource requirements per container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_resource_requirements: Option<SyncResourceRequirements>,
    /// Orchestrator tuning passed through untouched
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub sync_config: serde_json::Value,
}

impl ReplicationInput {
    /// Job and attempt of this run
    pub fn job_run_config(&self) -> Result<&JobRunConfig> {
        self.job_run_config
            .as_ref()
            .ok_or_else(|| Error::missing_field("replicationInput.jobRunConfig"))
    }

    /// Job identifier
    pub fn job_id(&self) -> Result<&str> {
        Ok(&self.job_run_config()?.job_id)
    }

    /// Attempt number
    pub fn attempt_id(&self) -> Result<u64> {
        Ok(self.job_run_config()?.attempt_id)
    }

    /// Source connector launch config
    pub fn source_launcher_config(&self) -> Result<&IntegrationLauncherConfig> {
        self.source_launcher_config
            .as_ref()
            .ok_or_else(|| Error::missing_field("replicationInput.sourceLauncherConfig"))
    }

    /// Destination connector launch config
    pub fn destination_launcher_config(&self) -> Result<&IntegrationLauncherConfig> {
        self.destination_launcher_config
            .as_ref()
            .ok_or_else(|| Error::missing_field("replicationInput.destinationLauncherConfig"))
    }

    /// True if either connector is user-supplied code
    pub fn uses_custom_connector(&self) -> bool {
        [&self.source_launcher_config, &self.destination_launcher_config]
            .into_iter()
            .flatten()
            .any(|c| c.is_custom_connector)
    }

    /// Resource requirements for the orchestrator container
    pub fn orchestrator_resource_requirements(&self) -> Option<&ResourceRequirements> {
        self.sync_resource_requirements
            .as_ref()
            .and_then(|r| r.orchestrator.as_ref())
    }
}

/// Check input as handed to the connector
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StandardCheckConnectionInput {
    /// Side of the connection being checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_type: Option<ActorType>,
    /// Actor being checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Uuid>,
    /// Connector configuration (opaque JSON)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_configuration: Option<serde_json::Value>,
    /// Resource requirements for the connector container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_requirements: Option<ResourceRequirements>,
}

/// Input of a connector check call
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckConnectionInput {
    /// Job and attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_run_config: Option<JobRunConfig>,
    /// Connector launch config, carries the image to run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launcher_config: Option<IntegrationLauncherConfig>,
    /// Check payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_configuration: Option<StandardCheckConnectionInput>,
}

impl CheckConnectionInput {
    /// Job and attempt of this check
    pub fn job_run_config(&self) -> Result<&JobRunConfig> {
        self.job_run_config
            .as_ref()
            .ok_or_else(|| Error::missing_field("checkConnectionInput.jobRunConfig"))
    }

    /// Job identifier
    pub fn job_id(&self) -> Result<&str> {
        Ok(&self.job_run_config()?.job_id)
    }

    /// Attempt number
    pub fn attempt_id(&self) -> Result<u64> {
        Ok(self.job_run_config()?.attempt_id)
    }

    /// Connector launch config
    pub fn launcher_config(&self) -> Result<&IntegrationLauncherConfig> {
        self.launcher_config
            .as_ref()
            .ok_or_else(|| Error::missing_field("checkConnectionInput.launcherConfig"))
    }

    /// Check payload
    pub fn connection_configuration(&self) -> Result<&StandardCheckConnectionInput> {
        self.connection_configuration
            .as_ref()
            .ok_or_else(|| Error::missing_field("checkConnectionInput.connectionConfiguration"))
    }

    /// Connector configuration JSON inside the check payload
    pub fn connection_configuration_payload(&self) -> Result<&serde_json::Value> {
        self.connection_configuration()?
            .connection_configuration
            .as_ref()
            .ok_or_else(|| {
                Error::missing_field(
                    "checkConnectionInput.connectionConfiguration.connectionConfiguration",
                )
            })
    }

    /// Side of the connection being checked
    pub fn actor_type(&self) -> Result<ActorType> {
        self.connection_configuration()?.actor_type.ok_or_else(|| {
            Error::missing_field("checkConnectionInput.connectionConfiguration.actorType")
        })
    }

    /// True if the connector is user-supplied code
    pub fn uses_custom_connector(&self) -> bool {
        self.launcher_config
            .as_ref()
            .is_some_and(|c| c.is_custom_connector)
    }

    /// Resource requirements for the connector container
    pub fn resource_requirements(&self) -> Option<&ResourceRequirements> {
        self.connection_configuration
            .as_ref()
            .and_then(|c| c.resource_requirements.as_ref())
    }
}

/// Input of a discover or spec call
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorCommandInput {
    /// Job and attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_run_config: Option<JobRunConfig>,
    /// Connector launch config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launcher_config: Option<IntegrationLauncherConfig>,
}

/// A request to launch one workload pod
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LaunchRequest {
    /// Full replication run, launched as an orchestrator pod
    Replication(ReplicationInput),
    /// Connector connection check
    Check(CheckConnectionInput),
    /// Connector catalog discovery
    Discover(ConnectorCommandInput),
    /// Connector specification fetch
    Spec(ConnectorCommandInput),
}

impl LaunchRequest {
    /// Every `type` tag this launcher understands
    pub const VARIANTS: [&'static str; 4] = ["replication", "check", "discover", "spec"];

    /// Decode a request from its JSON payload.
    ///
    /// A `type` tag this launcher does not know is reported as
    /// `Error::UnsupportedVariant`, so a newer caller is told apart from a
    /// malformed payload.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(data).map_err(|e| {
            Error::configuration_for_field("request", format!("invalid launch request: {}", e))
        })?;
        if let Some(tag) = value.get("type").and_then(|t| t.as_str()) {
            if !Self::VARIANTS.contains(&tag) {
                return Err(Error::unsupported_variant(tag));
            }
        }
        serde_json::from_value(value).map_err(|e| {
            Error::configuration_for_field("request", format!("invalid launch request: {}", e))
        })
    }

    /// Variant name, as used in the `type` tag
    pub fn variant_name(&self) -> &'static str {
        match self {
            LaunchRequest::Replication(_) => "replication",
            LaunchRequest::Check(_) => "check",
            LaunchRequest::Discover(_) => "discover",
            LaunchRequest::Spec(_) => "spec",
        }
    }

    /// Connection the request belongs to, if known
    pub fn connection_id(&self) -> Option<Uuid> {
        match self {
            LaunchRequest::Replication(input) => input.connection_id,
            LaunchRequest::Check(input) => input
                .launcher_config
                .as_ref()
                .and_then(|c| c.connection_id),
            LaunchRequest::Discover(input) | LaunchRequest::Spec(input) => input
                .launcher_config
                .as_ref()
                .and_then(|c| c.connection_id),
        }
    }
}
