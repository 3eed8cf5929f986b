//! engine::exec
//!
//! The commit state machine and the copy-on-write executor.
//!
//! # Architecture
//!
//! [`CommitEngine`] drives one commit attempt through its states:
//!
//! ```text
//! Idle -> Diffing -> Validating -> Applying -> Committed
//!                         |            |
//!                         +-> Aborted <+
//! ```
//!
//! [`Executor`] is the only code that mutates a tree from a plan. It never
//! touches the caller's active tree: ops are applied to a clone, and the
//! clone is handed back only if every op landed.
//!
//! # Executor Contract
//!
//! 1. Validate every op against the schema before any mutation; abort on
//!    the first rejection
//! 2. Clone the active tree
//! 3. Apply ops in plan order with CAS-like checks (an `Update` must find
//!    the values it expects, a `Delete` must find a childless node, an
//!    `Add` must find its parent and no existing node)
//! 4. On the first failure drop the clone and report the op index
//! 5. On success return the clone as the new active tree
//!
//! # Invariants
//!
//! - A failed commit leaves the caller's trees untouched
//! - State transitions are checked; an illegal one is an internal error

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::plan::CommitPlan;
use crate::core::change::{ChangeKind, ChangeOp};
use crate::core::node::ConfigNode;
use crate::core::path::ConfigPath;
use crate::core::schema::Schema;
use crate::core::tree::ConfigTree;

/// States of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    /// Not started.
    Idle,
    /// Computing ops from the two trees.
    Diffing,
    /// Checking every op with the schema.
    Validating,
    /// Applying ops to the copy-on-write tree.
    Applying,
    /// Every op landed; the new tree replaced active.
    Committed,
    /// Nothing changed.
    Aborted,
}

impl CommitState {
    /// True if `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: CommitState) -> bool {
        use CommitState::*;
        matches!(
            (self, next),
            (Idle, Diffing)
                | (Diffing, Validating)
                | (Validating, Applying)
                | (Validating, Aborted)
                | (Applying, Committed)
                | (Applying, Aborted)
        )
    }
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommitState::Idle => "idle",
            CommitState::Diffing => "diffing",
            CommitState::Validating => "validating",
            CommitState::Applying => "applying",
            CommitState::Committed => "committed",
            CommitState::Aborted => "aborted",
        };
        write!(f, "{s}")
    }
}

/// Errors from a commit attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitError {
    /// The schema rejected an op during validation.
    #[error("validation failed at {path}: {reason}")]
    ValidationFailed {
        /// Index of the rejected op in the plan.
        index: usize,
        /// Target of the rejected op.
        path: ConfigPath,
        /// Schema diagnostic.
        reason: String,
    },

    /// An op failed to apply after validation passed.
    #[error("commit failed at op {index} ({path}): {reason}")]
    ApplyFailed {
        /// Index of the failing op in the plan.
        index: usize,
        /// Target of the failing op.
        path: ConfigPath,
        /// Why the op could not be applied.
        reason: String,
    },

    /// The state machine was driven out of order.
    #[error("invalid commit state transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: CommitState,
        /// Requested state.
        to: CommitState,
    },
}

/// Outcome of a finished commit attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    /// Final state.
    pub state: CommitState,
    /// Number of ops applied.
    pub applied: usize,
    /// Plan digest.
    pub digest: String,
    /// Rendered ops in application order.
    pub changes: Vec<String>,
}

impl CommitReport {
    /// Report for a commit with nothing to do.
    pub fn empty() -> Self {
        Self {
            state: CommitState::Committed,
            applied: 0,
            digest: CommitPlan::new(Vec::new()).digest(),
            changes: Vec::new(),
        }
    }
}

/// Applies plans to copies of a tree.
#[derive(Debug)]
pub struct Executor<'a> {
    schema: &'a dyn Schema,
}

impl<'a> Executor<'a> {
    /// Create an executor validating through `schema`.
    pub fn new(schema: &'a dyn Schema) -> Self {
        Self { schema }
    }

    /// Check every op with the schema, without mutating anything.
    ///
    /// # Errors
    ///
    /// [`CommitError::ValidationFailed`] for the first rejected op.
    pub fn validate(&self, plan: &CommitPlan, active: &ConfigTree) -> Result<(), CommitError> {
        for (index, op) in plan.ops().iter().enumerate() {
            self.validate_op(op, active)
                .map_err(|reason| CommitError::ValidationFailed {
                    index,
                    path: op.path.clone(),
                    reason,
                })?;
        }
        Ok(())
    }

    fn validate_op(&self, op: &ChangeOp, active: &ConfigTree) -> Result<(), String> {
        match &op.kind {
            ChangeKind::Add { values, .. } | ChangeKind::Update { new: values, .. } => {
                if values.is_empty() {
                    self.schema.validate_set(&op.path, None)?;
                }
                for value in values {
                    self.schema.validate_set(&op.path, Some(value))?;
                }
            }
            _ => {}
        }
        self.schema.validate_change(op, active)
    }

    /// Apply `plan` to a copy of `active` and return the copy.
    ///
    /// `active` itself is never modified.
    ///
    /// # Errors
    ///
    /// [`CommitError::ApplyFailed`] naming the first op that could not be
    /// applied. The partial copy is dropped.
    pub fn apply(&self, plan: &CommitPlan, active: &ConfigTree) -> Result<ConfigTree, CommitError> {
        before_apply(plan);

        let mut next = active.clone();
        for (index, op) in plan.ops().iter().enumerate() {
            if let Some(reason) = injected_failure(index) {
                return Err(CommitError::ApplyFailed {
                    index,
                    path: op.path.clone(),
                    reason,
                });
            }

            apply_op(&mut next, op).map_err(|reason| CommitError::ApplyFailed {
                index,
                path: op.path.clone(),
                reason,
            })?;
            tracing::debug!(index, op = %op, "applied");
        }
        Ok(next)
    }
}

#[cfg(any(test, feature = "fault_injection"))]
fn before_apply(plan: &CommitPlan) {
    super::engine_hooks::invoke_before_apply(plan);
}

#[cfg(not(any(test, feature = "fault_injection")))]
fn before_apply(_plan: &CommitPlan) {}

#[cfg(any(test, feature = "fault_injection"))]
fn injected_failure(index: usize) -> Option<String> {
    super::engine_hooks::injected_failure(index)
}

#[cfg(not(any(test, feature = "fault_injection")))]
fn injected_failure(_index: usize) -> Option<String> {
    None
}

/// Apply one op to `tree`.
fn apply_op(tree: &mut ConfigTree, op: &ChangeOp) -> Result<(), String> {
    let path = &op.path;
    match &op.kind {
        ChangeKind::Add { values, flags } => {
            let (Some(parent), Some(name)) = (path.parent(), path.last()) else {
                return Err("cannot add the root".to_string());
            };
            let parent_node = tree
                .node_mut(&parent)
                .ok_or_else(|| format!("parent {parent} does not exist"))?;
            let mut node = ConfigNode::new(name, *flags);
            node.set_values(values.clone());
            if parent_node.insert_child(node) {
                Ok(())
            } else {
                Err(format!("{path} already exists"))
            }
        }
        ChangeKind::Delete => {
            let (Some(parent), Some(name)) = (path.parent(), path.last()) else {
                return Err("cannot delete the root".to_string());
            };
            match tree.node(path) {
                None => return Err(format!("{path} does not exist")),
                Some(node) if node.has_children() => {
                    return Err(format!("{path} still has children"));
                }
                Some(_) => {}
            }
            tree.node_mut(&parent)
                .and_then(|p| p.remove_child(name))
                .map(|_| ())
                .ok_or_else(|| format!("{path} does not exist"))
        }
        ChangeKind::Update { old, new, flags } => {
            let node = tree
                .node_mut(path)
                .ok_or_else(|| format!("{path} does not exist"))?;
            if node.values() != old.as_slice() {
                return Err(format!(
                    "expected values {:?}, found {:?}",
                    old,
                    node.values()
                ));
            }
            node.set_values(new.clone());
            node.set_flags(*flags);
            Ok(())
        }
        ChangeKind::Deactivate => tree.mark_deactivated(path).map_err(|e| e.to_string()),
        ChangeKind::Activate => tree.unmark_deactivated(path).map_err(|e| e.to_string()),
        ChangeKind::Comment { text } => tree
            .comment(path, text.as_deref())
            .map_err(|e| e.to_string()),
    }
}

/// Drives one commit attempt through the state machine.
#[derive(Debug)]
pub struct CommitEngine<'a> {
    executor: Executor<'a>,
    state: CommitState,
}

impl<'a> CommitEngine<'a> {
    /// A fresh engine in `Idle`.
    pub fn new(schema: &'a dyn Schema) -> Self {
        Self {
            executor: Executor::new(schema),
            state: CommitState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> CommitState {
        self.state
    }

    fn transition(&mut self, next: CommitState) -> Result<(), CommitError> {
        if !self.state.can_transition_to(next) {
            return Err(CommitError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(from = %self.state, to = %next, "commit state");
        self.state = next;
        Ok(())
    }

    /// Reconcile `working` against `active`.
    ///
    /// Returns the new active tree and a report. On error nothing the
    /// caller owns has changed and the engine is `Aborted` (or still
    /// `Idle` if it was driven out of order).
    pub fn run(
        &mut self,
        active: &ConfigTree,
        working: &ConfigTree,
    ) -> Result<(ConfigTree, CommitReport), CommitError> {
        self.transition(CommitState::Diffing)?;
        let plan = CommitPlan::between(active, working);
        tracing::debug!(plan = %plan.id, ops = plan.len(), digest = %plan.digest(), "plan ready");

        self.transition(CommitState::Validating)?;
        if let Err(e) = self.executor.validate(&plan, active) {
            self.transition(CommitState::Aborted)?;
            return Err(e);
        }

        self.transition(CommitState::Applying)?;
        let next = match self.executor.apply(&plan, active) {
            Ok(next) => next,
            Err(e) => {
                self.transition(CommitState::Aborted)?;
                return Err(e);
            }
        };

        self.transition(CommitState::Committed)?;
        let report = CommitReport {
            state: self.state,
            applied: plan.len(),
            digest: plan.digest(),
            changes: plan.preview(),
        };
        Ok((next, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::NodeFlags;
    use crate::core::schema::OpenSchema;
    use crate::engine::engine_hooks;

    fn p(s: &str) -> ConfigPath {
        ConfigPath::parse(s).unwrap()
    }

    fn set(tree: &mut ConfigTree, path: &str, value: Option<&str>) {
        tree.set(&p(path), value, &|_: &ConfigPath| NodeFlags::default()).unwrap();
    }

    #[derive(Debug)]
    struct RejectValue(&'static str);

    impl Schema for RejectValue {
        fn validate_set(&self, _path: &ConfigPath, value: Option<&str>) -> Result<(), String> {
            if value == Some(self.0) {
                return Err(format!("{} is not allowed", self.0));
            }
            Ok(())
        }
    }

    mod state_machine {
        use super::*;

        #[test]
        fn legal_transitions() {
            use CommitState::*;
            assert!(Idle.can_transition_to(Diffing));
            assert!(Validating.can_transition_to(Aborted));
            assert!(Applying.can_transition_to(Aborted));
            assert!(Applying.can_transition_to(Committed));
        }

        #[test]
        fn illegal_transitions() {
            use CommitState::*;
            assert!(!Idle.can_transition_to(Applying));
            assert!(!Diffing.can_transition_to(Committed));
            assert!(!Committed.can_transition_to(Diffing));
            assert!(!Aborted.can_transition_to(Idle));
        }

        #[test]
        fn engine_is_single_use() {
            let schema = OpenSchema;
            let mut engine = CommitEngine::new(&schema);
            let tree = ConfigTree::new();
            engine.run(&tree, &tree).unwrap();
            assert_eq!(engine.state(), CommitState::Committed);

            let err = engine.run(&tree, &tree).unwrap_err();
            assert!(matches!(err, CommitError::InvalidTransition { .. }));
        }
    }

    mod commit {
        use super::*;

        #[test]
        fn empty_commit_changes_nothing() {
            let schema = OpenSchema;
            let mut active = ConfigTree::new();
            set(&mut active, "a", Some("1"));
            let (next, report) = CommitEngine::new(&schema).run(&active, &active).unwrap();
            assert_eq!(next, active);
            assert_eq!(report.applied, 0);
            assert_eq!(report.state, CommitState::Committed);
        }

        #[test]
        fn working_becomes_active() {
            let schema = OpenSchema;
            let mut active = ConfigTree::new();
            set(&mut active, "old/branch", None);
            set(&mut active, "system/host-name", Some("r1"));
            let mut working = active.clone();
            working.delete(&p("old"), None).unwrap();
            set(&mut working, "system/host-name", Some("r2"));
            set(&mut working, "interfaces/eth0/address", Some("10.0.0.1"));
            working.mark_deactivated(&p("interfaces/eth0")).unwrap();

            let (next, report) = CommitEngine::new(&schema).run(&active, &working).unwrap();
            assert_eq!(next, working);
            assert!(report.digest.starts_with("sha256:"));
            assert_eq!(report.applied, report.changes.len());
        }

        #[test]
        fn validation_failure_aborts() {
            let schema = RejectValue("bad");
            let active = ConfigTree::new();
            let mut working = ConfigTree::new();
            set(&mut working, "a/b", Some("bad"));

            let mut engine = CommitEngine::new(&schema);
            let err = engine.run(&active, &working).unwrap_err();
            assert_eq!(engine.state(), CommitState::Aborted);
            match err {
                CommitError::ValidationFailed { index, path, .. } => {
                    assert_eq!(index, 1);
                    assert_eq!(path, p("a/b"));
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn injected_apply_failure_aborts() {
            let schema = OpenSchema;
            let active = ConfigTree::new();
            let mut working = ConfigTree::new();
            set(&mut working, "a/b/c", None);

            engine_hooks::set_fail_at(1);
            let mut engine = CommitEngine::new(&schema);
            let err = engine.run(&active, &working).unwrap_err();
            engine_hooks::clear();

            assert_eq!(engine.state(), CommitState::Aborted);
            assert!(matches!(err, CommitError::ApplyFailed { index: 1, .. }));
        }
    }

    mod apply {
        use super::*;

        #[test]
        fn stale_update_fails_without_touching_input() {
            let schema = OpenSchema;
            let mut active = ConfigTree::new();
            set(&mut active, "a", Some("1"));
            let before = active.clone();

            let plan = CommitPlan::from_ordered(vec![ChangeOp::new(
                p("a"),
                ChangeKind::Update {
                    old: vec!["0".into()],
                    new: vec!["2".into()],
                    flags: NodeFlags::default(),
                },
            )]);
            let err = Executor::new(&schema).apply(&plan, &active).unwrap_err();
            assert!(matches!(err, CommitError::ApplyFailed { index: 0, .. }));
            assert_eq!(active, before);
        }

        #[test]
        fn delete_of_non_empty_container_fails() {
            let schema = OpenSchema;
            let mut active = ConfigTree::new();
            set(&mut active, "a/b", None);
            let plan = CommitPlan::from_ordered(vec![ChangeOp::new(p("a"), ChangeKind::Delete)]);
            let err = Executor::new(&schema).apply(&plan, &active).unwrap_err();
            assert!(err.to_string().contains("still has children"));
        }

        #[test]
        fn add_without_parent_fails() {
            let schema = OpenSchema;
            let plan = CommitPlan::from_ordered(vec![ChangeOp::new(
                p("a/b"),
                ChangeKind::Add {
                    values: vec![],
                    flags: NodeFlags::default(),
                },
            )]);
            let err = Executor::new(&schema)
                .apply(&plan, &ConfigTree::new())
                .unwrap_err();
            assert!(err.to_string().contains("parent a does not exist"));
        }

        #[test]
        fn before_apply_hook_fires() {
            use std::cell::Cell;
            use std::rc::Rc;

            let schema = OpenSchema;
            let fired = Rc::new(Cell::new(false));
            let fired_clone = Rc::clone(&fired);
            engine_hooks::set_before_apply(move |_| fired_clone.set(true));
            Executor::new(&schema)
                .apply(&CommitPlan::new(vec![]), &ConfigTree::new())
                .unwrap();
            engine_hooks::clear();
            assert!(fired.get());
        }
    }
}
