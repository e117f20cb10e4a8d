//! Pipeline configuration
//!
//! Loaded from YAML or JSON with camelCase keys; every field is optional.
//!
//! ```yaml
//! relationshipPolicy: annotatedOnly
//! modelName: Shop
//! includeOperations: false
//! identity:
//!   maxLength: 80
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interchange::IdentityConfig;
use crate::semantic::RelationshipPolicy;

/// Errors raised while loading a [`PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Options for one pipeline invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub relationship_policy: RelationshipPolicy,
    pub model_name: String,
    /// Emit operations and their parameters.
    pub include_operations: bool,
    /// Create stub classifiers under `_external` for external references.
    pub include_external_stubs: bool,
    /// Inject annotation applications.
    pub include_annotations: bool,
    pub identity: IdentityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relationship_policy: RelationshipPolicy::default(),
            model_name: "JavaModel".to_string(),
            include_operations: true,
            include_external_stubs: true,
            include_annotations: true,
            identity: IdentityConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_policy(mut self, policy: RelationshipPolicy) -> Self {
        self.relationship_policy = policy;
        self
    }

    pub fn with_model_name(mut self, name: &str) -> Self {
        self.model_name = name.to_string();
        self
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| ConfigError::parse(e.to_string()))?;
        config.validated()
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::parse(e.to_string()))?;
        config.validated()
    }

    /// Load from a file; `.json` is read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        tracing::debug!("[CONFIG] loaded {} ({})", path.display(), config.relationship_policy.as_str());
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let identity = &self.identity;
        if identity.max_length <= identity.suffix_length + 1 {
            return Err(ConfigError::invalid(
                "identity.maxLength",
                format!(
                    "{} leaves no room for the marker and a {}-character suffix",
                    identity.max_length, identity.suffix_length
                ),
            ));
        }
        if identity.suffix_length == 0 || identity.suffix_length > 64 {
            return Err(ConfigError::invalid(
                "identity.suffixLength",
                format!("{} is outside 1..=64", identity.suffix_length),
            ));
        }
        if identity.hash_width == 0 || identity.hash_width > 64 {
            return Err(ConfigError::invalid(
                "identity.hashWidth",
                format!("{} is outside 1..=64", identity.hash_width),
            ));
        }
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::invalid("modelName", "must not be empty"));
        }
        Ok(())
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.relationship_policy, RelationshipPolicy::Smart);
        assert_eq!(config.model_name, "JavaModel");
        assert!(config.include_operations);
        assert_eq!(config.identity.max_length, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial() {
        let config = PipelineConfig::from_yaml_str(
            "relationshipPolicy: annotatedOnly\nidentity:\n  maxLength: 80\n",
        )
        .unwrap();
        assert_eq!(config.relationship_policy, RelationshipPolicy::AnnotatedOnly);
        assert_eq!(config.identity.max_length, 80);
        assert_eq!(config.identity.suffix_length, 10);
        assert!(config.include_annotations);
    }

    #[rstest]
    #[case(r#"{"relationshipPolicy": "none"}"#, RelationshipPolicy::None)]
    #[case(r#"{"relationshipPolicy": "resolved"}"#, RelationshipPolicy::Resolved)]
    #[case("{}", RelationshipPolicy::Smart)]
    fn test_json_policy(#[case] text: &str, #[case] expected: RelationshipPolicy) {
        let config = PipelineConfig::from_json_str(text).unwrap();
        assert_eq!(config.relationship_policy, expected);
    }

    #[rstest]
    #[case(r#"{"identity": {"maxLength": 11}}"#)]
    #[case(r#"{"identity": {"hashWidth": 0}}"#)]
    #[case(r#"{"modelName": " "}"#)]
    fn test_invalid_values_rejected(#[case] text: &str) {
        assert!(matches!(
            PipelineConfig::from_json_str(text),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        assert!(matches!(
            PipelineConfig::from_json_str(r#"{"relationshipPolicy": "always"}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
