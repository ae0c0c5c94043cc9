//! Executor configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default number of nodes the parallel runner executes at once.
pub const DEFAULT_MAX_CONCURRENT_NODES: usize = 4;

/// Configuration shared by all runners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ExecutorConfig {
    /// Maximum number of nodes executing at the same time.
    ///
    /// Ignored by the local runner.
    #[builder(default = "DEFAULT_MAX_CONCURRENT_NODES")]
    #[serde(default = "default_max_concurrent_nodes")]
    pub max_concurrent_nodes: usize,

    /// Keep every intermediate stream until the run ends instead of releasing
    /// it once its last consumer has run.
    #[builder(default)]
    #[serde(default)]
    pub retain_intermediate: bool,
}

fn default_max_concurrent_nodes() -> usize {
    DEFAULT_MAX_CONCURRENT_NODES
}

impl ExecutorConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_concurrent_nodes
            && max == 0
        {
            return Err("max_concurrent_nodes must be at least 1".into());
        }
        Ok(())
    }
}

impl ExecutorConfig {
    /// Returns a builder for creating a configuration.
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_nodes == 0 {
            return Err("max_concurrent_nodes must be at least 1".into());
        }
        Ok(())
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_nodes: DEFAULT_MAX_CONCURRENT_NODES,
            retain_intermediate: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_concurrent_nodes, DEFAULT_MAX_CONCURRENT_NODES);
        assert!(!config.retain_intermediate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ExecutorConfig::builder()
            .max_concurrent_nodes(2usize)
            .retain_intermediate(true)
            .build()
            .expect("valid config");
        assert_eq!(config.max_concurrent_nodes, 2);
        assert!(config.retain_intermediate);
    }

    #[test]
    fn test_config_validation() {
        assert!(
            ExecutorConfig::builder()
                .max_concurrent_nodes(0usize)
                .build()
                .is_err()
        );

        let zero = ExecutorConfig {
            max_concurrent_nodes: 0,
            ..ExecutorConfig::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: ExecutorConfig = serde_json::from_str("{}").expect("valid json");
        assert_eq!(config, ExecutorConfig::default());
    }
}
