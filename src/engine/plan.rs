//! engine::plan
//!
//! Ordered commit plans.
//!
//! # Architecture
//!
//! A plan is the only intermediate representation between the diff and
//! the executor. It takes the pre-order op list from [`super::diff`] and
//! fixes the application order:
//!
//! 1. Deletions, deepest first (the reverse of their pre-order position)
//! 2. Everything else, shallowest first (pre-order, stable)
//!
//! Because the diff emits `Add` before `Deactivate`/`Comment` at the same
//! path and the partition is stable, an add always lands before the
//! (de)activation of the node it creates.
//!
//! Plans are:
//! - **Deterministic**: the same trees always produce the same plan
//! - **Previewable**: `compare` renders a plan without applying it
//! - **Pure data**: no I/O, no references into either tree
//!
//! # Example
//!
//! ```
//! use cstore::core::change::{ChangeKind, ChangeOp};
//! use cstore::core::path::ConfigPath;
//! use cstore::engine::plan::CommitPlan;
//!
//! let ops = vec![
//!     ChangeOp::new(ConfigPath::parse("a").unwrap(), ChangeKind::Delete),
//!     ChangeOp::new(ConfigPath::parse("a/b").unwrap(), ChangeKind::Delete),
//! ];
//! let plan = CommitPlan::new(ops);
//! assert_eq!(plan.ops()[0].path, ConfigPath::parse("a/b").unwrap());
//! assert!(plan.digest().starts_with("sha256:"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::core::change::ChangeOp;
use crate::core::tree::ConfigTree;

/// Unique identifier of one commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(Uuid);

impl PlanId {
    /// Generate a fresh id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered list of change operations ready for the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitPlan {
    /// Identifier for log correlation.
    pub id: PlanId,
    ops: Vec<ChangeOp>,
}

impl CommitPlan {
    /// Order a pre-order op list for application.
    pub fn new(ops: Vec<ChangeOp>) -> Self {
        let (mut deletes, rest): (Vec<_>, Vec<_>) = ops.into_iter().partition(ChangeOp::is_delete);
        deletes.reverse();
        deletes.extend(rest);
        Self {
            id: PlanId::new(),
            ops: deletes,
        }
    }

    /// Diff two trees and order the result.
    pub fn between(active: &ConfigTree, working: &ConfigTree) -> Self {
        Self::new(super::diff::diff(active, working))
    }

    /// Wrap ops that are already in application order.
    ///
    /// Used to replay crafted sequences; no reordering happens.
    pub fn from_ordered(ops: Vec<ChangeOp>) -> Self {
        Self {
            id: PlanId::new(),
            ops,
        }
    }

    /// Ops in application order.
    pub fn ops(&self) -> &[ChangeOp] {
        &self.ops
    }

    /// Number of ops.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True if there is nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// SHA-256 of the canonical JSON of the ordered ops.
    ///
    /// The id is excluded, so two plans with the same ops share a digest.
    pub fn digest(&self) -> String {
        let json = serde_json::to_string(&self.ops).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    /// One line per op, in application order.
    pub fn preview(&self) -> Vec<String> {
        self.ops.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for CommitPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.preview() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
