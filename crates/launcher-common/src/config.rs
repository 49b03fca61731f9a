//! Launcher configuration
//!
//! Configuration is read once at startup from a YAML document and then
//! overridden from the environment. The result is immutable and shared by
//! every mapping call.
//!
//! Map-valued environment variables use comma-separated `key=value` pairs,
//! e.g. `JOB_KUBE_NODE_SELECTORS=pool=jobs,zone=us-east-1a`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result, DEFAULT_IMAGE_PULL_POLICY, DEFAULT_NAMESPACE};

/// Namespace launched pods are created in
pub const ENV_NAMESPACE: &str = "WORKLOAD_LAUNCHER_NAMESPACE";
/// Orchestrator container image
pub const ENV_ORCHESTRATOR_IMAGE: &str = "ORCHESTRATOR_IMAGE";
/// Orchestrator container pull policy
pub const ENV_ORCHESTRATOR_PULL_POLICY: &str = "ORCHESTRATOR_IMAGE_PULL_POLICY";
/// Scheduler name handed out by the static feature flags
pub const ENV_CUSTOM_SCHEDULER: &str = "CUSTOM_SCHEDULER_NAME";

/// Environment variable names for one placement policy family
struct PolicyEnvKeys {
    node_selectors: &'static str,
    isolated_node_selectors: &'static str,
    annotations: &'static str,
    pull_policy: &'static str,
}

const REPLICATION_ENV: PolicyEnvKeys = PolicyEnvKeys {
    node_selectors: "JOB_KUBE_NODE_SELECTORS",
    isolated_node_selectors: "JOB_ISOLATED_KUBE_NODE_SELECTORS",
    annotations: "JOB_KUBE_ANNOTATIONS",
    pull_policy: "JOB_KUBE_MAIN_CONTAINER_IMAGE_PULL_POLICY",
};

const CHECK_ENV: PolicyEnvKeys = PolicyEnvKeys {
    node_selectors: "CHECK_JOB_KUBE_NODE_SELECTORS",
    isolated_node_selectors: "CHECK_JOB_ISOLATED_KUBE_NODE_SELECTORS",
    annotations: "CHECK_JOB_KUBE_ANNOTATIONS",
    pull_policy: "CHECK_JOB_KUBE_MAIN_CONTAINER_IMAGE_PULL_POLICY",
};

/// Trait for reading environment configuration
///
/// Abstracts environment variable access so overrides can be tested
/// without touching process-global state.
#[cfg_attr(test, mockall::automock)]
pub trait EnvSource: Send + Sync {
    /// Get the value of an environment variable, if set
    fn var(&self, name: &str) -> Option<String>;
}

/// Default implementation that reads from the process environment
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEnv;

impl EnvSource for OsEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Image and pull policy of a pod's main container
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInfo {
    /// Fully qualified image reference
    pub image: String,
    /// Kubernetes image pull policy (Always, IfNotPresent, Never)
    #[serde(default = "default_pull_policy")]
    pub pull_policy: String,
}

impl ContainerInfo {
    /// Create container info from an image and pull policy
    pub fn new(image: impl Into<String>, pull_policy: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            pull_policy: pull_policy.into(),
        }
    }
}

/// Placement configuration for one workload family
///
/// One instance governs orchestrator (replication) pods, another governs
/// check/discover/spec pods.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlacementPolicy {
    /// Node selectors for ordinary workloads
    #[serde(default)]
    pub node_selectors: BTreeMap<String, String>,
    /// Node selectors for custom connector workloads; `None` when sandboxed
    /// placement is not available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isolated_node_selectors: Option<BTreeMap<String, String>>,
    /// Annotations applied to launched pods
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Pull policy for the main container
    #[serde(default = "default_pull_policy")]
    pub image_pull_policy: String,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            node_selectors: BTreeMap::new(),
            isolated_node_selectors: None,
            annotations: BTreeMap::new(),
            image_pull_policy: default_pull_policy(),
        }
    }
}

impl PlacementPolicy {
    fn apply_env(&mut self, env: &dyn EnvSource, keys: &PolicyEnvKeys) -> Result<()> {
        if let Some(raw) = env.var(keys.node_selectors) {
            self.node_selectors = parse_key_value_pairs(keys.node_selectors, &raw)?;
        }
        // Blank isolated selectors are treated as unset.
        if let Some(raw) = env.var(keys.isolated_node_selectors) {
            let isolated = parse_key_value_pairs(keys.isolated_node_selectors, &raw)?;
            self.isolated_node_selectors = Some(isolated).filter(|m| !m.is_empty());
        }
        if let Some(raw) = env.var(keys.annotations) {
            self.annotations = parse_key_value_pairs(keys.annotations, &raw)?;
        }
        if let Some(policy) = env.var(keys.pull_policy) {
            self.image_pull_policy = policy;
        }
        Ok(())
    }
}

/// Complete launcher configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LauncherConfig {
    /// Namespace launched pods are created in
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Process-wide orchestrator container used for replication pods
    pub orchestrator: ContainerInfo,
    /// Environment handed to the orchestrator through its init files
    #[serde(default)]
    pub orchestrator_env: BTreeMap<String, String>,
    /// Placement for replication orchestrator pods
    #[serde(default)]
    pub replication: PlacementPolicy,
    /// Placement for check/discover/spec pods
    #[serde(default)]
    pub check: PlacementPolicy,
    /// Scheduler assigned to launched pods when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler_name: Option<String>,
}

impl LauncherConfig {
    /// Parse configuration from a YAML document
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let config: LauncherConfig = serde_yaml::from_str(input)?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_yaml_str(&data)?;
        info!(path = %path.display(), "loaded launcher configuration");
        Ok(config)
    }

    /// Override configuration values from the environment
    pub fn apply_env(mut self, env: &dyn EnvSource) -> Result<Self> {
        if let Some(namespace) = env.var(ENV_NAMESPACE) {
            self.namespace = namespace;
        }
        if let Some(image) = env.var(ENV_ORCHESTRATOR_IMAGE) {
            self.orchestrator.image = image;
        }
        if let Some(policy) = env.var(ENV_ORCHESTRATOR_PULL_POLICY) {
            self.orchestrator.pull_policy = policy;
        }
        if let Some(scheduler) = env.var(ENV_CUSTOM_SCHEDULER) {
            self.scheduler_name = Some(scheduler).filter(|s| !s.is_empty());
        }
        self.replication.apply_env(env, &REPLICATION_ENV)?;
        self.check.apply_env(env, &CHECK_ENV)?;
        debug!(namespace = %self.namespace, "applied environment overrides");
        Ok(self)
    }

    /// Reject configuration that cannot produce a launchable pod
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::configuration_for_field(
                "namespace",
                "namespace must not be empty",
            ));
        }
        if self.orchestrator.image.trim().is_empty() {
            return Err(Error::configuration_for_field(
                "orchestrator.image",
                "orchestrator image must not be empty",
            ));
        }
        Ok(())
    }
}

/// Parse `key=value` pairs separated by commas into a map.
///
/// An empty or blank input yields an empty map. Whitespace around keys and
/// values is ignored.
pub fn parse_key_value_pairs(name: &str, raw: &str) -> Result<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(Error::configuration_for_field(
                name,
                format!("expected key=value, got '{}'", pair),
            )),
        })
        .collect()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_pull_policy() -> String {
    DEFAULT_IMAGE_PULL_POLICY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
namespace: ab-jobs
orchestrator:
  image: registry.local/orchestrator:1.2.0
  pullPolicy: Always
orchestratorEnv:
  LOG_LEVEL: info
replication:
  nodeSelectors:
    pool: replication
  isolatedNodeSelectors:
    pool: sandbox
  annotations:
    team: data
check:
  nodeSelectors:
    pool: check
  imagePullPolicy: Always
"#;

    fn env_with(vars: &'static [(&'static str, &'static str)]) -> MockEnvSource {
        let mut mock = MockEnvSource::new();
        mock.expect_var().returning(move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        });
        mock
    }

    #[test]
    fn parses_yaml_document() {
        let config = LauncherConfig::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(config.namespace, "ab-jobs");
        assert_eq!(
            config.orchestrator,
            ContainerInfo::new("registry.local/orchestrator:1.2.0", "Always")
        );
        assert_eq!(config.orchestrator_env["LOG_LEVEL"], "info");
        assert_eq!(config.replication.node_selectors["pool"], "replication");
        assert_eq!(
            config.replication.isolated_node_selectors,
            Some(BTreeMap::from([("pool".to_string(), "sandbox".to_string())]))
        );
        assert_eq!(config.replication.image_pull_policy, "IfNotPresent");
        assert_eq!(config.check.isolated_node_selectors, None);
        assert_eq!(config.check.image_pull_policy, "Always");
        assert_eq!(config.scheduler_name, None);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = LauncherConfig::from_yaml_str("orchestrator:\n  image: orch:1\n").unwrap();

        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.orchestrator.pull_policy, DEFAULT_IMAGE_PULL_POLICY);
        assert_eq!(config.replication, PlacementPolicy::default());
        assert_eq!(config.check, PlacementPolicy::default());
    }

    #[test]
    fn invalid_yaml_is_a_configuration_error() {
        let err = LauncherConfig::from_yaml_str("namespace: [").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn env_overrides_replace_values() {
        let env = env_with(&[
            (ENV_NAMESPACE, "override-ns"),
            (ENV_ORCHESTRATOR_IMAGE, "orch:2"),
            ("JOB_KUBE_NODE_SELECTORS", "pool=big, zone=a"),
            ("CHECK_JOB_ISOLATED_KUBE_NODE_SELECTORS", "pool=isolated-check"),
            ("CHECK_JOB_KUBE_ANNOTATIONS", "owner=platform"),
            ("CHECK_JOB_KUBE_MAIN_CONTAINER_IMAGE_PULL_POLICY", "Never"),
            (ENV_CUSTOM_SCHEDULER, "gang-scheduler"),
        ]);

        let config = LauncherConfig::from_yaml_str(SAMPLE)
            .unwrap()
            .apply_env(&env)
            .unwrap();

        assert_eq!(config.namespace, "override-ns");
        assert_eq!(config.orchestrator.image, "orch:2");
        assert_eq!(config.orchestrator.pull_policy, "Always");
        assert_eq!(
            config.replication.node_selectors,
            BTreeMap::from([
                ("pool".to_string(), "big".to_string()),
                ("zone".to_string(), "a".to_string()),
            ])
        );
        // Untouched by env
        assert_eq!(
            config.replication.isolated_node_selectors,
            Some(BTreeMap::from([("pool".to_string(), "sandbox".to_string())]))
        );
        assert_eq!(
            config.check.isolated_node_selectors,
            Some(BTreeMap::from([(
                "pool".to_string(),
                "isolated-check".to_string()
            )]))
        );
        assert_eq!(config.check.annotations["owner"], "platform");
        assert_eq!(config.check.image_pull_policy, "Never");
        assert_eq!(config.scheduler_name.as_deref(), Some("gang-scheduler"));
    }

    #[test]
    fn empty_scheduler_env_clears_scheduler() {
        let env = env_with(&[(ENV_CUSTOM_SCHEDULER, "")]);
        let mut config = LauncherConfig::from_yaml_str(SAMPLE).unwrap();
        config.scheduler_name = Some("configured".to_string());

        let config = config.apply_env(&env).unwrap();
        assert_eq!(config.scheduler_name, None);
    }

    #[test]
    fn blank_isolated_selectors_env_means_unset() {
        let env = env_with(&[
            ("JOB_ISOLATED_KUBE_NODE_SELECTORS", ""),
            ("CHECK_JOB_ISOLATED_KUBE_NODE_SELECTORS", " , "),
        ]);

        let config = LauncherConfig::from_yaml_str(SAMPLE)
            .unwrap()
            .apply_env(&env)
            .unwrap();

        assert_eq!(config.replication.isolated_node_selectors, None);
        assert_eq!(config.check.isolated_node_selectors, None);
        assert_eq!(config.replication.node_selectors["pool"], "replication");
    }

    #[test]
    fn malformed_env_pair_is_rejected() {
        let env = env_with(&[("JOB_KUBE_ANNOTATIONS", "team=data,broken")]);
        let err = LauncherConfig::from_yaml_str(SAMPLE)
            .unwrap()
            .apply_env(&env)
            .unwrap_err();

        assert_eq!(err.field(), Some("JOB_KUBE_ANNOTATIONS"));
    }

    #[test]
    fn parse_pairs_handles_blank_input() {
        assert!(parse_key_value_pairs("X", "").unwrap().is_empty());
        assert!(parse_key_value_pairs("X", " , ").unwrap().is_empty());
        assert!(parse_key_value_pairs("X", "=value").is_err());
    }

    #[test]
    fn parse_pairs_keeps_equals_in_values() {
        let pairs = parse_key_value_pairs("X", "expr=a=b").unwrap();
        assert_eq!(pairs["expr"], "a=b");
    }

    #[test]
    fn validate_rejects_empty_namespace_and_image() {
        let mut config = LauncherConfig::from_yaml_str(SAMPLE).unwrap();
        assert!(config.validate().is_ok());

        config.namespace = " ".to_string();
        assert_eq!(config.validate().unwrap_err().field(), Some("namespace"));

        config.namespace = "jobs".to_string();
        config.orchestrator.image = String::new();
        assert_eq!(
            config.validate().unwrap_err().field(),
            Some("orchestrator.image")
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LauncherConfig::from_file("/nonexistent/launcher.yaml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
