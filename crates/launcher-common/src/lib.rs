//! Common types for the workload launcher: errors, configuration, and logging

#![cfg_attr(not(test), deny(missing_docs))]

pub mod config;
pub mod error;
pub mod telemetry;

pub use config::{ContainerInfo, EnvSource, LauncherConfig, OsEnv, PlacementPolicy};
pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Namespace used for launched pods when configuration does not name one
pub const DEFAULT_NAMESPACE: &str = "jobs";

/// Kubernetes image pull policy applied when configuration does not set one
pub const DEFAULT_IMAGE_PULL_POLICY: &str = "IfNotPresent";
