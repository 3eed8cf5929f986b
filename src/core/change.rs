//! core::change
//!
//! Change operations derived by diffing the active tree against the
//! working tree.
//!
//! ChangeOps are pure data. They exist for the duration of a commit
//! attempt (or a `compare` preview) and are never persisted on their own.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::NodeFlags;
use super::path::{quote, ConfigPath};

/// What a change does to its target node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeKind {
    /// Create the node (its parent must already exist).
    Add {
        /// Values of the new node.
        values: Vec<String>,
        /// Flags of the new node.
        flags: NodeFlags,
    },

    /// Remove the node (it must have no remaining children).
    Delete,

    /// Replace the node's values and flags.
    ///
    /// `old` is checked against the tree before the update lands.
    Update {
        /// Expected current values.
        old: Vec<String>,
        /// New values.
        new: Vec<String>,
        /// New flags.
        flags: NodeFlags,
    },

    /// Set the deactivated flag.
    Deactivate,

    /// Clear the deactivated flag.
    Activate,

    /// Replace the node's comment.
    Comment {
        /// New comment, `None` to clear.
        text: Option<String>,
    },
}

impl ChangeKind {
    /// Short lowercase label.
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Add { .. } => "add",
            ChangeKind::Delete => "delete",
            ChangeKind::Update { .. } => "update",
            ChangeKind::Deactivate => "deactivate",
            ChangeKind::Activate => "activate",
            ChangeKind::Comment { .. } => "comment",
        }
    }
}

/// A single change targeting one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOp {
    /// Target node.
    pub path: ConfigPath,
    /// The change.
    #[serde(flatten)]
    pub kind: ChangeKind,
}

impl ChangeOp {
    /// Create a change op.
    pub fn new(path: ConfigPath, kind: ChangeKind) -> Self {
        Self { path, kind }
    }

    /// True for deletions.
    pub fn is_delete(&self) -> bool {
        matches!(self.kind, ChangeKind::Delete)
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ChangeKind::Add { values, .. } if values.is_empty() => write!(f, "+ {}", self.path),
            ChangeKind::Add { values, .. } => {
                write!(f, "+ {} {}", self.path, join_values(values))
            }
            ChangeKind::Delete => write!(f, "- {}", self.path),
            ChangeKind::Update { old, new, .. } => write!(
                f,
                "~ {} {} -> {}",
                self.path,
                join_values(old),
                join_values(new)
            ),
            ChangeKind::Deactivate => write!(f, "! deactivate {}", self.path),
            ChangeKind::Activate => write!(f, "! activate {}", self.path),
            ChangeKind::Comment { text: Some(text) } => {
                write!(f, "# {} {}", self.path, quote(text))
            }
            ChangeKind::Comment { text: None } => write!(f, "# {} (cleared)", self.path),
        }
    }
}

fn join_values(values: &[String]) -> String {
    if values.is_empty() {
        return "(none)".to_string();
    }
    values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(",")
}
