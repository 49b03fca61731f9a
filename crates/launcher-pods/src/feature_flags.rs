//! Feature flags consulted while mapping

use uuid::Uuid;

use launcher_common::LauncherConfig;

/// Source of per-connection feature flag values
#[cfg_attr(test, mockall::automock)]
pub trait FeatureFlagClient: Send + Sync {
    /// Scheduler that should place pods of this connection, if not the default
    fn custom_scheduler(&self, connection_id: Option<Uuid>) -> Option<String>;
}

/// Flags fixed at startup, identical for every connection
#[derive(Clone, Debug, Default)]
pub struct StaticFeatureFlags {
    scheduler_name: Option<String>,
}

impl StaticFeatureFlags {
    /// Flags with an optional scheduler for all pods
    pub fn new(scheduler_name: Option<String>) -> Self {
        Self { scheduler_name }
    }

    /// Flags taken from launcher configuration
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::new(config.scheduler_name.clone())
    }
}

impl FeatureFlagClient for StaticFeatureFlags {
    fn custom_scheduler(&self, _connection_id: Option<Uuid>) -> Option<String> {
        self.scheduler_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_flags_ignore_connection() {
        let flags = StaticFeatureFlags::new(Some("volcano".to_string()));
        assert_eq!(flags.custom_scheduler(None).as_deref(), Some("volcano"));
        assert_eq!(
            flags.custom_scheduler(Some(Uuid::new_v4())).as_deref(),
            Some("volcano")
        );
    }

    #[test]
    fn default_flags_use_default_scheduler() {
        assert_eq!(StaticFeatureFlags::default().custom_scheduler(None), None);
    }
}
