//! core::schema
//!
//! The schema collaborator.
//!
//! The store knows tree structure; it does not know which paths are legal
//! or what a value must look like. Those decisions are delegated to a
//! [`Schema`]:
//!
//! - `validate_set` - checked before a set lands in the working tree
//! - `validate_change` - checked per ChangeOp while a commit is validating
//! - `is_leaf` / `is_multi` / `is_tag` - structural hints used to split a
//!   trailing value off raw arguments and to flag newly created nodes
//!
//! Schema calls are synchronous and must not re-enter the store.
//!
//! # Implementations
//!
//! - [`OpenSchema`] - accepts everything, no leaves
//! - [`PatternSchema`] - path patterns from the `[schema]` config section

use std::fmt;

use super::change::ChangeOp;
use super::config::schema::SchemaConfig;
use super::config::ConfigError;
use super::node::NodeFlags;
use super::path::ConfigPath;
use super::tree::ConfigTree;

/// External validation and structure knowledge.
pub trait Schema: fmt::Debug {
    /// Decide whether `value` may be set at `path`.
    fn validate_set(&self, _path: &ConfigPath, _value: Option<&str>) -> Result<(), String> {
        Ok(())
    }

    /// Decide whether a derived change may be committed against `active`.
    fn validate_change(&self, _op: &ChangeOp, _active: &ConfigTree) -> Result<(), String> {
        Ok(())
    }

    /// True if the node at `path` holds values.
    fn is_leaf(&self, _path: &ConfigPath) -> bool {
        false
    }

    /// True if the node at `path` holds many values.
    fn is_multi(&self, _path: &ConfigPath) -> bool {
        false
    }

    /// True if the children of `path` are instance identifiers.
    fn is_tag(&self, _path: &ConfigPath) -> bool {
        false
    }

    /// Flags for a node created at `path`.
    fn flags_for(&self, path: &ConfigPath) -> NodeFlags {
        NodeFlags {
            tag_node: self.is_tag(path),
            multi: self.is_multi(path),
        }
    }

    /// True if the last of a list of raw arguments should be read as a value
    /// for the node at `path`.
    fn takes_value(&self, path: &ConfigPath) -> bool {
        self.is_leaf(path) || self.is_multi(path)
    }
}

/// Accepts every path and value; declares no leaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSchema;

impl Schema for OpenSchema {}

/// One component of a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Any,
    Exact(String),
}

/// A path pattern where `*` matches any single component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern(Vec<Segment>);

impl PathPattern {
    /// Parse a `/`-separated pattern.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the pattern is empty or a
    /// literal segment is not a valid component.
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let trimmed = pattern.trim_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "schema pattern {pattern:?} is empty"
            )));
        }
        let segments = trimmed
            .split('/')
            .map(|s| match s {
                "*" => Ok(Segment::Any),
                literal => super::path::validate_component(literal)
                    .map(|()| Segment::Exact(literal.to_string()))
                    .map_err(|e| {
                        ConfigError::InvalidValue(format!("schema pattern {pattern:?}: {e}"))
                    }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(segments))
    }

    /// True if `path` has the same length and every segment matches.
    pub fn matches(&self, path: &ConfigPath) -> bool {
        self.0.len() == path.len()
            && self.0.iter().zip(path.iter()).all(|(seg, c)| match seg {
                Segment::Any => true,
                Segment::Exact(s) => s == c,
            })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .0
            .iter()
            .map(|s| match s {
                Segment::Any => "*",
                Segment::Exact(s) => s.as_str(),
            })
            .collect();
        write!(f, "{}", parts.join("/"))
    }
}

/// Schema built from path patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSchema {
    leaf: Vec<PathPattern>,
    multi: Vec<PathPattern>,
    tag: Vec<PathPattern>,
}

impl PatternSchema {
    /// Build from the `[schema]` config section.
    pub fn from_config(config: &SchemaConfig) -> Result<Self, ConfigError> {
        let parse_all = |patterns: &[String]| {
            patterns
                .iter()
                .map(|p| PathPattern::parse(p))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            leaf: parse_all(&config.leaf)?,
            multi: parse_all(&config.multi)?,
            tag: parse_all(&config.tag)?,
        })
    }

    fn any_match(patterns: &[PathPattern], path: &ConfigPath) -> bool {
        patterns.iter().any(|p| p.matches(path))
    }
}

impl Schema for PatternSchema {
    fn validate_set(&self, path: &ConfigPath, value: Option<&str>) -> Result<(), String> {
        if value.is_some() && !self.takes_value(path) && !self.leaf.is_empty() {
            return Err(format!("{path} does not take a value"));
        }
        Ok(())
    }

    fn is_leaf(&self, path: &ConfigPath) -> bool {
        Self::any_match(&self.leaf, path)
    }

    fn is_multi(&self, path: &ConfigPath) -> bool {
        Self::any_match(&self.multi, path)
    }

    fn is_tag(&self, path: &ConfigPath) -> bool {
        Self::any_match(&self.tag, path)
    }
}
