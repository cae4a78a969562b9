//! Configuration for schema inference

use serde::{Deserialize, Serialize};

/// Configuration for schema inference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InferenceConfig {
    /// Maximum number of rows to sample (at least 1)
    pub sample_limit: usize,

    /// Infer array element types from the first element only
    pub shallow_arrays: bool,

    /// Name of the synthetic root record
    pub root_name: String,

    /// Namespace of the root record
    pub namespace: Option<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_limit: 100,
            shallow_arrays: false,
            root_name: "root".to_string(),
            namespace: None,
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> InferenceConfigBuilder {
        InferenceConfigBuilder::default()
    }

    /// The sample limit, never below one
    pub fn effective_sample_limit(&self) -> usize {
        self.sample_limit.max(1)
    }
}

/// Builder for InferenceConfig
#[derive(Debug, Default)]
pub struct InferenceConfigBuilder {
    config: InferenceConfig,
}

impl InferenceConfigBuilder {
    /// Set the sample limit (clamped to at least 1)
    pub fn sample_limit(mut self, limit: usize) -> Self {
        self.config.sample_limit = limit.max(1);
        self
    }

    /// Enable or disable first-element array inference
    pub fn shallow_arrays(mut self, shallow: bool) -> Self {
        self.config.shallow_arrays = shallow;
        self
    }

    /// Set the root record name
    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.config.root_name = name.into();
        self
    }

    /// Set the root record namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = Some(namespace.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> InferenceConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.sample_limit, 100);
        assert!(!config.shallow_arrays);
        assert_eq!(config.root_name, "root");
        assert!(config.namespace.is_none());
    }

    #[test]
    fn test_builder() {
        let config = InferenceConfig::builder()
            .sample_limit(10)
            .shallow_arrays(true)
            .root_name("Event")
            .namespace("com.example")
            .build();

        assert_eq!(config.sample_limit, 10);
        assert!(config.shallow_arrays);
        assert_eq!(config.root_name, "Event");
        assert_eq!(config.namespace.as_deref(), Some("com.example"));
    }

    #[test]
    fn test_sample_limit_is_at_least_one() {
        let config = InferenceConfig::builder().sample_limit(0).build();
        assert_eq!(config.sample_limit, 1);

        let config: InferenceConfig = serde_json::from_str(r#"{"sampleLimit": 0}"#).unwrap();
        assert_eq!(config.effective_sample_limit(), 1);
    }
}
