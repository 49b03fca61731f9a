//! Pod naming and identity
//!
//! Names are pure functions of job id, attempt, and (for checks) actor type,
//! so a retried launch of the same attempt resolves to the same pod.

use std::sync::Arc;

use aws_lc_rs::digest::{digest, SHA256};

use launcher_common::{ContainerInfo, PlacementPolicy};

use crate::model::ActorType;
use crate::spec::PodInfo;

/// Kubernetes limit for DNS label names
pub const MAX_POD_NAME_LEN: usize = 63;

/// Hex digits of the name hash appended when a name is truncated
const HASH_SUFFIX_LEN: usize = 8;

/// Derives pod names from job coordinates
#[cfg_attr(test, mockall::automock)]
pub trait PodNameGenerator: Send + Sync {
    /// Name of the orchestrator pod of a replication attempt
    fn name_for_replication(&self, job_id: &str, attempt_id: u64) -> String;

    /// Name of a check pod
    fn name_for_check(&self, job_id: &str, attempt_id: u64, actor_type: ActorType) -> String;
}

/// Readable, deterministic names bounded to a DNS label
#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicPodNameGenerator;

impl PodNameGenerator for DeterministicPodNameGenerator {
    fn name_for_replication(&self, job_id: &str, attempt_id: u64) -> String {
        bounded_dns_label(&format!(
            "orchestrator-repl-job-{}-attempt-{}",
            job_id, attempt_id
        ))
    }

    fn name_for_check(&self, job_id: &str, attempt_id: u64, actor_type: ActorType) -> String {
        bounded_dns_label(&format!(
            "{}-check-{}-{}",
            actor_type.as_str(),
            job_id,
            attempt_id
        ))
    }
}

/// Sanitize a string into a DNS label of at most 63 characters.
///
/// Names that must be shortened end with a hash of the full input, so two
/// inputs sharing a long prefix still map to different names.
pub fn bounded_dns_label(raw: &str) -> String {
    let sanitized = sanitize_dns_label(raw);
    if sanitized.len() <= MAX_POD_NAME_LEN {
        return sanitized;
    }

    let hash = digest(&SHA256, raw.as_bytes());
    let suffix: String = hash
        .as_ref()
        .iter()
        .take(HASH_SUFFIX_LEN / 2)
        .map(|b| format!("{:02x}", b))
        .collect();
    let prefix = sanitized[..MAX_POD_NAME_LEN - HASH_SUFFIX_LEN - 1].trim_end_matches('-');
    format!("{}-{}", prefix, suffix)
}

/// Lowercase, replace anything outside `[a-z0-9]` with `-`, trim dashes.
fn sanitize_dns_label(s: &str) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    sanitized.trim_matches('-').to_string()
}

/// Resolves namespace, name, and main container of launched pods
#[derive(Clone)]
pub struct PodIdentityResolver {
    namespace: String,
    orchestrator: ContainerInfo,
    names: Arc<dyn PodNameGenerator>,
}

impl PodIdentityResolver {
    /// Create a resolver for pods in `namespace`.
    ///
    /// `orchestrator` is the process-wide container used by replication pods.
    pub fn new(
        namespace: impl Into<String>,
        orchestrator: ContainerInfo,
        names: Arc<dyn PodNameGenerator>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            orchestrator,
            names,
        }
    }

    /// Identity of a replication orchestrator pod
    pub fn resolve_for_replication(&self, job_id: &str, attempt_id: u64) -> PodInfo {
        PodInfo {
            namespace: self.namespace.clone(),
            name: self.names.name_for_replication(job_id, attempt_id),
            main_container_info: self.orchestrator.clone(),
        }
    }

    /// Identity of a check pod running `image` with the check policy's pull policy
    pub fn resolve_for_check(
        &self,
        job_id: &str,
        attempt_id: u64,
        actor_type: ActorType,
        image: &str,
        check_policy: &PlacementPolicy,
    ) -> PodInfo {
        PodInfo {
            namespace: self.namespace.clone(),
            name: self.names.name_for_check(job_id, attempt_id, actor_type),
            main_container_info: ContainerInfo::new(image, &check_policy.image_pull_policy),
        }
    }
}
