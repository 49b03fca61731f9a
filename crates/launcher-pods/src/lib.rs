//! Launch input mapping for connector and orchestrator pods
//!
//! Turns a `LaunchRequest` (a replication run or a single connector check)
//! into a `LaunchSpecification`: pod identity, placement, labels, annotations,
//! init files, and resource requirements. Pure mapping crate, no orchestrator
//! calls.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mapper = LaunchInputMapper::from_config(&config);
//! let spec = mapper.map(&workload_id, &request, &shared_labels)?;
//! ```

pub mod feature_flags;
pub mod files;
pub mod labels;
pub mod mapper;
pub mod model;
pub mod node_selectors;
pub mod pod_name;
pub mod serializer;
pub mod spec;

pub use feature_flags::{FeatureFlagClient, StaticFeatureFlags};
pub use files::{FileMap, FileMapBuilder};
pub use labels::{compose_labels, DefaultPodLabeler, PodLabeler};
pub use mapper::LaunchInputMapper;
pub use model::{
    ActorType, CheckConnectionInput, IntegrationLauncherConfig, JobRunConfig, LaunchRequest,
    ReplicationInput, ResourceRequirements, StandardCheckConnectionInput,
};
pub use node_selectors::resolve_node_selectors;
pub use pod_name::{DeterministicPodNameGenerator, PodIdentityResolver, PodNameGenerator};
pub use serializer::{JsonSerializer, ObjectSerializer};
pub use spec::{LaunchSpecification, PodInfo, PodRole};

pub use launcher_common::{ContainerInfo, Error, PlacementPolicy, Result};
