//! core::node
//!
//! A single node of a configuration tree.
//!
//! # Invariants
//!
//! - Child names are unique within a parent (enforced by the map)
//! - Children keep insertion order for deterministic output
//! - A child's `name` always equals its key in the parent's map
//!
//! Whether a node may hold both values and children is a schema question;
//! the node itself allows it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::path::{validate_component, PathError, MAX_DEPTH};

/// Per-node structural flags derived from the schema when a node is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeFlags {
    /// Children of this node are instance identifiers (e.g. `eth0`), not
    /// fixed field names.
    pub tag_node: bool,
    /// Setting a value appends instead of replacing.
    pub multi: bool,
}

impl NodeFlags {
    /// Flags for a tag node.
    pub fn tag() -> Self {
        Self {
            tag_node: true,
            multi: false,
        }
    }

    /// Flags for a multi-valued leaf.
    pub fn multi() -> Self {
        Self {
            tag_node: false,
            multi: true,
        }
    }
}

/// A node in a configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigNode {
    /// Name of this node (`None` for the root).
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    /// Values held by this node.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<String>,
    /// Children keyed by name.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    children: IndexMap<String, ConfigNode>,
    /// Excluded from effective configuration.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    deactivated: bool,
    /// Free-form comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    /// Schema-derived flags.
    flags: NodeFlags,
}

impl ConfigNode {
    /// Create an unnamed root node.
    pub fn root() -> Self {
        Self::default()
    }

    /// Create a named node with no values or children.
    pub fn new(name: impl Into<String>, flags: NodeFlags) -> Self {
        Self {
            name: Some(name.into()),
            flags,
            ..Self::default()
        }
    }

    /// Node name (`None` for the root).
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Values in order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// First value, if any.
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// True if the node holds at least one value.
    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }

    /// True if the node has children.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Look up a direct child.
    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        self.children.get(name)
    }

    /// Children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = &ConfigNode> {
        self.children.values()
    }

    /// Child names in insertion order.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// True if deactivated.
    pub fn is_deactivated(&self) -> bool {
        self.deactivated
    }

    /// Attached comment.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Schema-derived flags.
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// True if this node's children are instance identifiers.
    pub fn is_tag_node(&self) -> bool {
        self.flags.tag_node
    }

    /// True if this node accumulates values.
    pub fn is_multi(&self) -> bool {
        self.flags.multi
    }

    /// Number of nodes in this subtree, including this one.
    pub fn subtree_size(&self) -> usize {
        1 + self.children().map(ConfigNode::subtree_size).sum::<usize>()
    }

    /// Number of levels below this node (0 for a node without children).
    pub fn height(&self) -> usize {
        self.children()
            .map(|child| 1 + child.height())
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn child_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
        self.children.get_mut(name)
    }

    /// Insert a child under its own name. Returns false if the name is taken.
    pub(crate) fn insert_child(&mut self, child: ConfigNode) -> bool {
        let Some(name) = child.name.clone() else {
            return false;
        };
        if self.children.contains_key(&name) {
            return false;
        }
        self.children.insert(name, child);
        true
    }

    /// Get or create a child container.
    pub(crate) fn child_or_insert(&mut self, name: &str, flags: NodeFlags) -> &mut ConfigNode {
        self.children
            .entry(name.to_string())
            .or_insert_with(|| ConfigNode::new(name, flags))
    }

    /// Remove a child, keeping sibling order.
    pub(crate) fn remove_child(&mut self, name: &str) -> Option<ConfigNode> {
        self.children.shift_remove(name)
    }

    /// Rename a child in place, keeping its position among siblings.
    ///
    /// Returns false if `from` is missing or `to` is taken.
    pub(crate) fn rename_child(&mut self, from: &str, to: &str) -> bool {
        if self.children.contains_key(to) {
            return false;
        }
        let Some((index, _, mut child)) = self.children.shift_remove_full(from) else {
            return false;
        };
        child.name = Some(to.to_string());
        self.children.shift_insert(index, to.to_string(), child);
        true
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub(crate) fn clear_name(&mut self) {
        self.name = None;
    }

    pub(crate) fn set_values(&mut self, values: Vec<String>) {
        self.values = values;
    }

    /// Set a value: replace for single-valued nodes, append for multi.
    ///
    /// Appending a value that is already present is a no-op.
    pub(crate) fn put_value(&mut self, value: &str) {
        if self.flags.multi {
            if !self.values.iter().any(|v| v == value) {
                self.values.push(value.to_string());
            }
        } else {
            self.values = vec![value.to_string()];
        }
    }

    /// Remove one value. Returns false if it was not present.
    pub(crate) fn remove_value(&mut self, value: &str) -> bool {
        let before = self.values.len();
        self.values.retain(|v| v != value);
        self.values.len() != before
    }

    pub(crate) fn set_deactivated(&mut self, deactivated: bool) {
        self.deactivated = deactivated;
    }

    pub(crate) fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    pub(crate) fn set_flags(&mut self, flags: NodeFlags) {
        self.flags = flags;
    }

    /// Re-establish the key invariants on a freshly deserialized subtree
    /// whose own path has `depth` components.
    ///
    /// Every child key must be a valid component and the subtree may not
    /// reach past [`MAX_DEPTH`]. Each child's `name` is reset to its key.
    pub(crate) fn adopt_keys(&mut self, depth: usize) -> Result<(), PathError> {
        if self.has_children() && depth >= MAX_DEPTH {
            return Err(PathError::TooDeep { limit: MAX_DEPTH });
        }
        for (key, child) in self.children.iter_mut() {
            validate_component(key)?;
            child.name = Some(key.clone());
            child.adopt_keys(depth + 1)?;
        }
        Ok(())
    }

    /// Drop deactivated descendants.
    pub(crate) fn prune_deactivated(&mut self) {
        self.children.retain(|_, child| !child.deactivated);
        for child in self.children.values_mut() {
            child.prune_deactivated();
        }
    }
}
