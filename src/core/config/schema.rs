//! core::config::schema
//!
//! Configuration file schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: schema patterns must parse and the
//! store directory and log filter must be non-empty when given.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::schema::PathPattern;

/// The configuration file.
///
/// # Example
///
/// ```toml
/// store_dir = "/var/lib/cstore"
/// log_filter = "info"
///
/// [batch]
/// stop_on_error = false
///
/// [schema]
/// leaf = ["system/host-name"]
/// multi = ["system/name-server", "interfaces/ethernet/*/address"]
/// tag = ["interfaces/ethernet", "firewall/rule"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding the active tree, session, and lock.
    pub store_dir: Option<String>,

    /// Default tracing filter (e.g. "info", "cstore=debug").
    pub log_filter: Option<String>,

    /// Batch processing defaults.
    pub batch: Option<BatchConfig>,

    /// Path patterns describing leaves, multi-value leaves, and tag nodes.
    pub schema: Option<SchemaConfig>,
}

impl StoreConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dir) = &self.store_dir {
            if dir.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "store_dir cannot be empty".to_string(),
                ));
            }
        }

        if let Some(filter) = &self.log_filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "log_filter cannot be empty".to_string(),
                ));
            }
        }

        if let Some(schema) = &self.schema {
            schema.validate()?;
        }

        Ok(())
    }
}

/// Batch command defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Stop at the first failing line instead of continuing.
    pub stop_on_error: Option<bool>,
}

/// Schema patterns.
///
/// Each entry is a `/`-separated path where `*` matches one component.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Single-value leaves.
    pub leaf: Vec<String>,

    /// Multi-value leaves.
    pub multi: Vec<String>,

    /// Tag nodes (children are instance identifiers).
    pub tag: Vec<String>,
}

impl SchemaConfig {
    /// Validate that every pattern parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pattern in self.leaf.iter().chain(&self.multi).chain(&self.tag) {
            PathPattern::parse(pattern)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_file() {
        let toml = r#"
            store_dir = "/tmp/store"
            log_filter = "debug"

            [batch]
            stop_on_error = true

            [schema]
            leaf = ["system/host-name"]
            multi = ["system/name-server"]
            tag = ["interfaces/ethernet"]
        "#;
        let config: StoreConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.store_dir.as_deref(), Some("/tmp/store"));
        assert_eq!(config.batch.unwrap().stop_on_error, Some(true));
        assert_eq!(config.schema.unwrap().tag, ["interfaces/ethernet"]);
    }

    #[test]
    fn empty_file_is_default() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(toml::from_str::<StoreConfig>("trunk = \"main\"").is_err());
        assert!(toml::from_str::<StoreConfig>("[schema]\nleafs = []").is_err());
    }

    #[test]
    fn empty_store_dir_invalid() {
        let config = StoreConfig {
            store_dir: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_pattern_invalid() {
        let config = StoreConfig {
            schema: Some(SchemaConfig {
                leaf: vec!["".to_string()],
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid config value"));
    }
}
