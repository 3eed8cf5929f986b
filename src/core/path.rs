//! core::path
//!
//! Path types for addressing nodes in a configuration tree.
//!
//! # Types
//!
//! - [`ConfigPath`] - Validated, ordered sequence of components
//! - [`PathArgs`] - Owned, length-checked argument list taken at an outer boundary
//!
//! # Validation
//!
//! Components are validated when they are pushed. A `ConfigPath` that
//! exists is always well-formed, so tree operations never re-check
//! component syntax.
//!
//! # Examples
//!
//! ```
//! use cstore::core::path::ConfigPath;
//!
//! let path = ConfigPath::new(["interfaces", "eth0", "address"]).unwrap();
//! assert_eq!(path.len(), 3);
//! assert_eq!(path.to_string(), "interfaces/eth0/address");
//!
//! // Components may not contain the separator
//! assert!(ConfigPath::new(["a/b"]).is_err());
//! assert!(ConfigPath::new([""]).is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between components in rendered paths.
pub const SEPARATOR: char = '/';

/// Upper bound on the number of raw arguments accepted at a boundary.
pub const MAX_PATH_ARGS: usize = 256;

/// Upper bound on the number of components in a path.
///
/// Every tree level adds two levels of JSON nesting on disk, so this keeps
/// the deepest storable tree well inside `serde_json`'s recursion limit.
pub const MAX_DEPTH: usize = 32;

/// Errors from path construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A component is empty or contains a forbidden character.
    #[error("invalid path component {component:?}: {reason}")]
    InvalidComponent {
        /// The offending component.
        component: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Too many arguments were supplied at a boundary.
    #[error("too many path arguments: {count} (limit {limit})")]
    TooLong {
        /// Number of arguments supplied.
        count: usize,
        /// Maximum accepted.
        limit: usize,
    },

    /// A path would have more than [`MAX_DEPTH`] components.
    #[error("path too deep: more than {limit} components")]
    TooDeep {
        /// Maximum accepted.
        limit: usize,
    },
}

/// Check a single component against the path rules.
///
/// # Errors
///
/// Returns [`PathError::InvalidComponent`] if the component is empty,
/// contains [`SEPARATOR`], or contains control characters.
pub fn validate_component(component: &str) -> Result<(), PathError> {
    let reject = |reason: &str| PathError::InvalidComponent {
        component: component.to_string(),
        reason: reason.to_string(),
    };

    if component.is_empty() {
        return Err(reject("component cannot be empty"));
    }
    if component.contains(SEPARATOR) {
        return Err(reject("component cannot contain '/'"));
    }
    if component.chars().any(|c| c.is_control()) {
        return Err(reject("component cannot contain control characters"));
    }
    Ok(())
}

/// An ordered sequence of components identifying a node.
///
/// The empty path denotes the tree root. Equality and prefix relations are
/// component-wise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ConfigPath(Vec<String>);

impl ConfigPath {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from components, validating each.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InvalidComponent`] for the first bad component,
    /// or [`PathError::TooDeep`] past [`MAX_DEPTH`] components.
    pub fn new<I, S>(components: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut path = Self::root();
        for component in components {
            path.push(component)?;
        }
        Ok(path)
    }

    /// Parse a `/`-separated path such as `interfaces/eth0`.
    ///
    /// Leading and trailing separators are ignored, so `""` and `"/"` both
    /// parse to the root.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let trimmed = s.trim_matches(SEPARATOR);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::new(trimmed.split(SEPARATOR))
    }

    /// Append a component.
    ///
    /// # Errors
    ///
    /// - [`PathError::InvalidComponent`] if the component is empty or
    ///   contains the separator
    /// - [`PathError::TooDeep`] if the path already has [`MAX_DEPTH`]
    ///   components
    pub fn push(&mut self, component: impl Into<String>) -> Result<(), PathError> {
        if self.0.len() >= MAX_DEPTH {
            return Err(PathError::TooDeep { limit: MAX_DEPTH });
        }
        let component = component.into();
        validate_component(&component)?;
        self.0.push(component);
        Ok(())
    }

    /// Return a new path with `component` appended.
    pub fn join(&self, component: impl Into<String>) -> Result<Self, PathError> {
        let mut path = self.clone();
        path.push(component)?;
        Ok(path)
    }

    /// Append a component that is already known to be valid (a node name).
    pub(crate) fn join_unchecked(&self, component: &str) -> Self {
        let mut components = self.0.clone();
        components.push(component.to_string());
        Self(components)
    }

    /// Components in order.
    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Last component, or `None` for the root.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Parent path, or `None` for the root.
    pub fn parent(&self) -> Option<ConfigPath> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// True if `prefix` is a component-wise prefix of this path.
    ///
    /// Every path starts with itself and with the root.
    pub fn starts_with(&self, prefix: &ConfigPath) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// True if this path lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &ConfigPath) -> bool {
        self.0.len() > ancestor.0.len() && self.starts_with(ancestor)
    }

    /// Iterate over components.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for ConfigPath {
    /// Components joined by `/`; components with whitespace are single-quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "{SEPARATOR}");
        }
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{}", quote(component))?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<String>> for ConfigPath {
    type Error = PathError;

    fn try_from(components: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(components)
    }
}

impl From<ConfigPath> for Vec<String> {
    fn from(path: ConfigPath) -> Self {
        path.0
    }
}

/// Quote a word for display if it contains whitespace or quote characters.
///
/// The quoting is the same one understood by the batch line parser.
pub fn quote(word: &str) -> String {
    if word.chars().any(|c| c.is_whitespace() || c == '\'') {
        let escaped = word.replace('\\', "\\\\").replace('\'', "\\'");
        format!("'{escaped}'")
    } else {
        word.to_string()
    }
}

/// Raw arguments received at an outer boundary (CLI, batch line, binding).
///
/// Constructed once, length-checked, and then handed to the store, which
/// decides how the arguments split into a path and an optional trailing
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathArgs(Vec<String>);

impl PathArgs {
    /// Take ownership of raw arguments.
    ///
    /// # Errors
    ///
    /// - [`PathError::TooLong`] if more than [`MAX_PATH_ARGS`] are given
    /// - [`PathError::InvalidComponent`] if any argument is empty
    pub fn new<I, S>(args: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        if args.len() > MAX_PATH_ARGS {
            return Err(PathError::TooLong {
                count: args.len(),
                limit: MAX_PATH_ARGS,
            });
        }
        if let Some(empty) = args.iter().find(|a| a.is_empty()) {
            return Err(PathError::InvalidComponent {
                component: empty.clone(),
                reason: "argument cannot be empty".to_string(),
            });
        }
        Ok(Self(args))
    }

    /// The raw arguments.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no arguments were given.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interpret every argument as a path component.
    pub fn into_path(self) -> Result<ConfigPath, PathError> {
        ConfigPath::new(self.0)
    }

    /// Split off the last argument as a value when `takes_value` says the
    /// remaining prefix addresses a leaf.
    ///
    /// The value itself is not subject to component rules.
    pub fn split_value<F>(self, takes_value: F) -> Result<(ConfigPath, Option<String>), PathError>
    where
        F: Fn(&ConfigPath) -> bool,
    {
        let mut args = self.0;
        if args.len() >= 2 {
            let head = ConfigPath::new(args[..args.len() - 1].iter().cloned())?;
            if takes_value(&head) {
                let value = args.pop();
                return Ok((head, value));
            }
        }
        Ok((ConfigPath::new(args)?, None))
    }
}

impl fmt::Display for PathArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<String> = self.0.iter().map(|a| quote(a)).collect();
        write!(f, "{}", words.join(" "))
    }
}
