//! core::tree
//!
//! Configuration tree and its structural operations.
//!
//! # Architecture
//!
//! A [`ConfigTree`] wraps a root [`ConfigNode`]. Lookup descends through
//! hashed child maps, so resolving a path costs O(depth).
//!
//! Every mutator has a `validate_*` twin taking the same arguments with no
//! side effect. Mutators call their validator first and only then touch
//! the tree, so a failed call leaves the tree exactly as it was.
//!
//! # Invariants
//!
//! - The root cannot be deleted, renamed, copied, moved, or deactivated
//! - A node holding values is never turned into a container by `set`,
//!   `copy`, or `move`
//! - Copy and move destinations never lie inside their source
//! - No node lies deeper than [`MAX_DEPTH`] below the root
//!
//! Deserialization restores the node invariants: child keys are checked as
//! components, each child's name is taken from its key, and trees deeper
//! than [`MAX_DEPTH`] are rejected.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::node::{ConfigNode, NodeFlags};
use super::path::{validate_component, ConfigPath, PathError, MAX_DEPTH};

/// Errors from structural tree operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A path component or new name is malformed.
    #[error(transparent)]
    InvalidComponent(#[from] PathError),

    /// An intermediate path segment is a leaf holding a value.
    #[error("path conflict at {path}: node holds a value and cannot contain children")]
    PathConflict {
        /// The leaf that blocks the operation.
        path: ConfigPath,
    },

    /// The path does not exist.
    #[error("path not found: {0}")]
    NotFound(ConfigPath),

    /// The node exists but does not hold the value.
    #[error("value {value:?} not found at {path}")]
    ValueNotFound {
        /// Node path.
        path: ConfigPath,
        /// Missing value.
        value: String,
    },

    /// The destination already exists.
    #[error("path already exists: {0}")]
    AlreadyExists(ConfigPath),

    /// Activation requested for an active node.
    #[error("{0} is already active")]
    AlreadyActive(ConfigPath),

    /// Deactivation requested for a deactivated node.
    #[error("{0} is already deactivated")]
    AlreadyInactive(ConfigPath),

    /// A structural constraint was violated.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// A rooted configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigTree {
    root: ConfigNode,
}

impl<'de> Deserialize<'de> for ConfigTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut root = ConfigNode::deserialize(deserializer)?;
        root.adopt_keys(0).map_err(serde::de::Error::custom)?;
        root.clear_name();
        Ok(Self { root })
    }
}

impl ConfigTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing root node.
    pub fn from_root(root: ConfigNode) -> Self {
        Self { root }
    }

    /// The root node.
    pub fn root(&self) -> &ConfigNode {
        &self.root
    }

    /// True if the root has no children and no values.
    pub fn is_empty(&self) -> bool {
        !self.root.has_children() && !self.root.has_values()
    }

    /// Number of nodes, excluding the root.
    pub fn len(&self) -> usize {
        self.root.subtree_size() - 1
    }

    /// Resolve a path to a node.
    pub fn node(&self, path: &ConfigPath) -> Option<&ConfigNode> {
        path.iter()
            .try_fold(&self.root, |node, component| node.child(component))
    }

    pub(crate) fn node_mut(&mut self, path: &ConfigPath) -> Option<&mut ConfigNode> {
        let mut node = &mut self.root;
        for component in path.iter() {
            node = node.child_mut(component)?;
        }
        Some(node)
    }

    /// True if the path exists.
    pub fn exists(&self, path: &ConfigPath) -> bool {
        self.node(path).is_some()
    }

    /// Values at a path.
    pub fn get(&self, path: &ConfigPath) -> Option<&[String]> {
        self.node(path).map(ConfigNode::values)
    }

    /// All nodes in pre-order (parent before children), excluding the root.
    pub fn walk(&self) -> Vec<(ConfigPath, &ConfigNode)> {
        let mut out = Vec::new();
        walk_into(&self.root, &ConfigPath::root(), &mut out);
        out
    }

    /// A copy with every deactivated subtree removed.
    pub fn effective(&self) -> ConfigTree {
        let mut root = self.root.clone();
        root.prune_deactivated();
        ConfigTree { root }
    }

    /// Resolve a path or fail with `NotFound`.
    fn require(&self, path: &ConfigPath) -> Result<&ConfigNode, TreeError> {
        self.node(path)
            .ok_or_else(|| TreeError::NotFound(path.clone()))
    }

    /// First strict ancestor of `path` (excluding the root) that holds a value.
    fn blocking_leaf(&self, path: &ConfigPath) -> Option<ConfigPath> {
        let mut node = &self.root;
        let mut prefix = ConfigPath::root();
        for component in path.iter().take(path.len().saturating_sub(1)) {
            node = node.child(component)?;
            prefix = prefix.join_unchecked(component);
            if node.has_values() {
                return Some(prefix);
            }
        }
        None
    }

    // =========================================================================
    // set
    // =========================================================================

    /// Check that `set(path, value)` would succeed.
    pub fn validate_set(&self, path: &ConfigPath, value: Option<&str>) -> Result<(), TreeError> {
        if path.is_root() && value.is_some() {
            return Err(TreeError::InvalidOperation(
                "cannot set a value on the root".to_string(),
            ));
        }
        if let Some(leaf) = self.blocking_leaf(path) {
            return Err(TreeError::PathConflict { path: leaf });
        }
        Ok(())
    }

    /// Create the path (and any missing containers), then set or append `value`.
    ///
    /// `flags_for` supplies flags for each node this call creates. Existing
    /// nodes keep their flags. Creating a container that already exists is
    /// not an error.
    pub fn set(
        &mut self,
        path: &ConfigPath,
        value: Option<&str>,
        flags_for: &dyn Fn(&ConfigPath) -> NodeFlags,
    ) -> Result<(), TreeError> {
        self.validate_set(path, value)?;

        let mut node = &mut self.root;
        let mut prefix = ConfigPath::root();
        for component in path.iter() {
            prefix = prefix.join_unchecked(component);
            let flags = flags_for(&prefix);
            node = node.child_or_insert(component, flags);
        }
        if let Some(value) = value {
            node.put_value(value);
        }
        Ok(())
    }

    // =========================================================================
    // delete
    // =========================================================================

    /// Check that `delete(path, value)` would succeed.
    pub fn validate_delete(&self, path: &ConfigPath, value: Option<&str>) -> Result<(), TreeError> {
        if path.is_root() {
            return Err(TreeError::InvalidOperation(
                "cannot delete the root".to_string(),
            ));
        }
        let node = self.require(path)?;
        if let Some(value) = value {
            if !node.values().iter().any(|v| v == value) {
                return Err(TreeError::ValueNotFound {
                    path: path.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Remove the subtree at `path`, or a single value from it.
    ///
    /// Removing the last value of a childless leaf removes the leaf.
    pub fn delete(&mut self, path: &ConfigPath, value: Option<&str>) -> Result<(), TreeError> {
        self.validate_delete(path, value)?;

        let (parent, name) = split_parent(path)?;
        if let Some(value) = value {
            let node = self
                .node_mut(path)
                .ok_or_else(|| TreeError::NotFound(path.clone()))?;
            node.remove_value(value);
            if node.has_values() || node.has_children() {
                return Ok(());
            }
        }
        self.node_mut(&parent)
            .and_then(|p| p.remove_child(name))
            .map(|_| ())
            .ok_or_else(|| TreeError::NotFound(path.clone()))
    }

    // =========================================================================
    // rename
    // =========================================================================

    /// Check that `rename(path, new_name)` would succeed.
    pub fn validate_rename(&self, path: &ConfigPath, new_name: &str) -> Result<(), TreeError> {
        if path.is_root() {
            return Err(TreeError::InvalidOperation(
                "cannot rename the root".to_string(),
            ));
        }
        validate_component(new_name)?;
        self.require(path)?;
        let (parent, _) = split_parent(path)?;
        let target = parent.join_unchecked(new_name);
        if self.exists(&target) {
            return Err(TreeError::AlreadyExists(target));
        }
        Ok(())
    }

    /// Rename the last component of `path`, keeping subtree, flags, and
    /// position among siblings.
    pub fn rename(&mut self, path: &ConfigPath, new_name: &str) -> Result<(), TreeError> {
        self.validate_rename(path, new_name)?;

        let (parent, name) = split_parent(path)?;
        let renamed = self
            .node_mut(&parent)
            .map(|p| p.rename_child(name, new_name))
            .unwrap_or(false);
        if renamed {
            Ok(())
        } else {
            Err(TreeError::NotFound(path.clone()))
        }
    }

    // =========================================================================
    // copy
    // =========================================================================

    /// Check that `copy(src, dst)` would succeed.
    pub fn validate_copy(&self, src: &ConfigPath, dst: &ConfigPath) -> Result<(), TreeError> {
        if src.is_root() || dst.is_root() {
            return Err(TreeError::InvalidOperation(
                "cannot copy to or from the root".to_string(),
            ));
        }
        self.require(src)?;
        if dst.starts_with(src) {
            return Err(TreeError::InvalidOperation(format!(
                "destination {dst} overlaps source {src}"
            )));
        }
        check_depth(dst, self.require(src)?)?;
        self.check_destination(dst)
    }

    /// Deep-copy the subtree at `src` to `dst`.
    pub fn copy(&mut self, src: &ConfigPath, dst: &ConfigPath) -> Result<(), TreeError> {
        self.validate_copy(src, dst)?;

        let mut subtree = self.require(src)?.clone();
        let (parent, name) = split_parent(dst)?;
        subtree.set_name(name);
        self.attach(&parent, subtree, dst)
    }

    // =========================================================================
    // move
    // =========================================================================

    /// Check that `move_to(path, new_parent)` would succeed.
    pub fn validate_move(&self, path: &ConfigPath, new_parent: &ConfigPath) -> Result<(), TreeError> {
        if path.is_root() {
            return Err(TreeError::InvalidOperation(
                "cannot move the root".to_string(),
            ));
        }
        self.require(path)?;
        if new_parent.starts_with(path) {
            return Err(TreeError::InvalidOperation(format!(
                "cannot move {path} under itself"
            )));
        }
        let (_, name) = split_parent(path)?;
        let dst = new_parent.join_unchecked(name);
        check_depth(&dst, self.require(path)?)?;
        self.check_destination(&dst)
    }

    /// Relocate the subtree at `path` under `new_parent`, keeping its name.
    ///
    /// Validation runs before the subtree is detached, so there is no
    /// window in which the subtree exists in neither place.
    pub fn move_to(&mut self, path: &ConfigPath, new_parent: &ConfigPath) -> Result<(), TreeError> {
        self.validate_move(path, new_parent)?;

        let (old_parent, name) = split_parent(path)?;
        let subtree = self
            .node_mut(&old_parent)
            .and_then(|p| p.remove_child(name))
            .ok_or_else(|| TreeError::NotFound(path.clone()))?;
        let dst = new_parent.join_unchecked(name);
        self.attach(new_parent, subtree, &dst)
    }

    /// Destination checks shared by copy and move.
    fn check_destination(&self, dst: &ConfigPath) -> Result<(), TreeError> {
        let parent = dst.parent().unwrap_or_default();
        let parent_node = self.require(&parent)?;
        if !parent.is_root() && parent_node.has_values() {
            return Err(TreeError::PathConflict { path: parent });
        }
        if self.exists(dst) {
            return Err(TreeError::AlreadyExists(dst.clone()));
        }
        Ok(())
    }

    fn attach(
        &mut self,
        parent: &ConfigPath,
        subtree: ConfigNode,
        dst: &ConfigPath,
    ) -> Result<(), TreeError> {
        let parent_node = self
            .node_mut(parent)
            .ok_or_else(|| TreeError::NotFound(parent.clone()))?;
        if parent_node.insert_child(subtree) {
            Ok(())
        } else {
            Err(TreeError::AlreadyExists(dst.clone()))
        }
    }

    // =========================================================================
    // comment
    // =========================================================================

    /// Check that `comment(path, ..)` would succeed.
    pub fn validate_comment(&self, path: &ConfigPath) -> Result<(), TreeError> {
        self.require(path).map(|_| ())
    }

    /// Attach a comment, or clear it with `None` or an empty string.
    pub fn comment(&mut self, path: &ConfigPath, text: Option<&str>) -> Result<(), TreeError> {
        self.validate_comment(path)?;
        let text = text.filter(|t| !t.is_empty()).map(str::to_string);
        let node = self
            .node_mut(path)
            .ok_or_else(|| TreeError::NotFound(path.clone()))?;
        node.set_comment(text);
        Ok(())
    }

    // =========================================================================
    // activate / deactivate
    // =========================================================================

    /// Check that `mark_deactivated(path)` would succeed.
    pub fn validate_deactivate(&self, path: &ConfigPath) -> Result<(), TreeError> {
        if path.is_root() {
            return Err(TreeError::InvalidOperation(
                "cannot deactivate the root".to_string(),
            ));
        }
        if self.require(path)?.is_deactivated() {
            return Err(TreeError::AlreadyInactive(path.clone()));
        }
        Ok(())
    }

    /// Set the deactivated flag.
    pub fn mark_deactivated(&mut self, path: &ConfigPath) -> Result<(), TreeError> {
        self.validate_deactivate(path)?;
        self.set_deactivated(path, true)
    }

    /// Check that `unmark_deactivated(path)` would succeed.
    pub fn validate_activate(&self, path: &ConfigPath) -> Result<(), TreeError> {
        if path.is_root() {
            return Err(TreeError::InvalidOperation(
                "cannot activate the root".to_string(),
            ));
        }
        if !self.require(path)?.is_deactivated() {
            return Err(TreeError::AlreadyActive(path.clone()));
        }
        Ok(())
    }

    /// Clear the deactivated flag.
    pub fn unmark_deactivated(&mut self, path: &ConfigPath) -> Result<(), TreeError> {
        self.validate_activate(path)?;
        self.set_deactivated(path, false)
    }

    fn set_deactivated(&mut self, path: &ConfigPath, deactivated: bool) -> Result<(), TreeError> {
        let node = self
            .node_mut(path)
            .ok_or_else(|| TreeError::NotFound(path.clone()))?;
        node.set_deactivated(deactivated);
        Ok(())
    }
}

fn walk_into<'a>(
    node: &'a ConfigNode,
    path: &ConfigPath,
    out: &mut Vec<(ConfigPath, &'a ConfigNode)>,
) {
    for child in node.children() {
        let child_path = path.join_unchecked(child.name().unwrap_or_default());
        out.push((child_path.clone(), child));
        walk_into(child, &child_path, out);
    }
}

/// Reject placing `subtree` at `dst` when its deepest node would pass
/// [`MAX_DEPTH`].
fn check_depth(dst: &ConfigPath, subtree: &ConfigNode) -> Result<(), TreeError> {
    if dst.len() + subtree.height() > MAX_DEPTH {
        return Err(TreeError::InvalidComponent(PathError::TooDeep {
            limit: MAX_DEPTH,
        }));
    }
    Ok(())
}

/// Split a non-root path into its parent and last component.
fn split_parent(path: &ConfigPath) -> Result<(ConfigPath, &str), TreeError> {
    match (path.parent(), path.last()) {
        (Some(parent), Some(name)) => Ok((parent, name)),
        _ => Err(TreeError::InvalidOperation(
            "operation requires a non-root path".to_string(),
        )),
    }
}
