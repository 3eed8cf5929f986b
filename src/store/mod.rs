//! store
//!
//! The configuration store: an active tree, a working tree, and at most
//! one edit session.
//!
//! # Architecture
//!
//! [`Store`] owns both trees. Edits go through the store, which checks
//! the tree validator and the schema before mutating `working`. The first
//! successful edit opens a [`Session`]; commit and discard close it.
//!
//! ```text
//!   edit ──► validate_* ──► schema.validate_set ──► mutate working
//!                                                    │
//!   commit ──► CommitEngine(active, working) ──► active := new tree
//!   discard ──► working := active
//! ```
//!
//! # Invariants
//!
//! - At most one session per store
//! - A failed edit leaves `working` unchanged and opens no session
//! - A failed commit leaves `active`, `working`, and the session unchanged
//! - After commit or discard, `working == active`

pub mod batch;
pub mod persist;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::lock::LockError;
use crate::core::node::NodeFlags;
use crate::core::path::{ConfigPath, PathArgs, PathError};
use crate::core::schema::Schema;
use crate::core::tree::{ConfigTree, TreeError};
use crate::engine::{CommitEngine, CommitError, CommitPlan, CommitReport};

pub use persist::{PersistError, StoreDir};

/// Flat error taxonomy shared by every outer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidComponent,
    PathConflict,
    NotFound,
    AlreadyExists,
    AlreadyActive,
    AlreadyInactive,
    InvalidOperation,
    NoSession,
    SessionBusy,
    ValidationFailed,
    CommitFailed,
    /// Reading or writing the store directory failed.
    Storage,
}

impl ErrorKind {
    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidComponent => "invalid_component",
            ErrorKind::PathConflict => "path_conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::AlreadyActive => "already_active",
            ErrorKind::AlreadyInactive => "already_inactive",
            ErrorKind::InvalidOperation => "invalid_operation",
            ErrorKind::NoSession => "no_session",
            ErrorKind::SessionBusy => "session_busy",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::CommitFailed => "commit_failed",
            ErrorKind::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A structural tree operation failed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Discard was requested with no open session.
    #[error("no edit session is open")]
    NoSession,

    /// A session is already open (or the store is locked by another process).
    #[error("an edit session is already in progress")]
    SessionBusy,

    /// The schema rejected an edit or a derived change.
    #[error("validation failed for {path}: {reason}")]
    ValidationFailed {
        /// Rejected path.
        path: ConfigPath,
        /// Schema diagnostic.
        reason: String,
    },

    /// A change failed to apply after validation passed.
    #[error("commit failed at op {index} ({path}): {reason}")]
    CommitFailed {
        /// Index of the failing op.
        index: usize,
        /// Target of the failing op.
        path: ConfigPath,
        /// Why it failed.
        reason: String,
    },

    /// The store directory could not be read or written.
    #[error(transparent)]
    Persist(PersistError),
}

impl StoreError {
    /// Flatten into the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Tree(e) => match e {
                TreeError::InvalidComponent(_) => ErrorKind::InvalidComponent,
                TreeError::PathConflict { .. } => ErrorKind::PathConflict,
                TreeError::NotFound(_) | TreeError::ValueNotFound { .. } => ErrorKind::NotFound,
                TreeError::AlreadyExists(_) => ErrorKind::AlreadyExists,
                TreeError::AlreadyActive(_) => ErrorKind::AlreadyActive,
                TreeError::AlreadyInactive(_) => ErrorKind::AlreadyInactive,
                TreeError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            },
            StoreError::NoSession => ErrorKind::NoSession,
            StoreError::SessionBusy => ErrorKind::SessionBusy,
            StoreError::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            StoreError::CommitFailed { .. } => ErrorKind::CommitFailed,
            StoreError::Persist(_) => ErrorKind::Storage,
        }
    }
}

impl From<PathError> for StoreError {
    fn from(e: PathError) -> Self {
        StoreError::Tree(TreeError::InvalidComponent(e))
    }
}

impl From<PersistError> for StoreError {
    fn from(e: PersistError) -> Self {
        match e {
            PersistError::Lock(LockError::AlreadyLocked) => StoreError::SessionBusy,
            other => StoreError::Persist(other),
        }
    }
}

impl From<CommitError> for StoreError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::ValidationFailed { path, reason, .. } => {
                StoreError::ValidationFailed { path, reason }
            }
            CommitError::ApplyFailed {
                index,
                path,
                reason,
            } => StoreError::CommitFailed {
                index,
                path,
                reason,
            },
            other @ CommitError::InvalidTransition { .. } => StoreError::CommitFailed {
                index: 0,
                path: ConfigPath::root(),
                reason: other.to_string(),
            },
        }
    }
}

/// An open edit session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: Uuid,
    /// When the session was opened.
    pub started_at: DateTime<Utc>,
}

impl Session {
    fn open() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

/// Active tree, working tree, and session.
#[derive(Debug)]
pub struct Store {
    active: ConfigTree,
    working: ConfigTree,
    session: Option<Session>,
    schema: Box<dyn Schema>,
}

impl Store {
    /// An empty store.
    pub fn new(schema: Box<dyn Schema>) -> Self {
        Self::from_parts(ConfigTree::new(), None, None, schema)
    }

    /// Reassemble a store from saved state.
    ///
    /// Without a session the working tree is a copy of `active`.
    pub fn from_parts(
        active: ConfigTree,
        working: Option<ConfigTree>,
        session: Option<Session>,
        schema: Box<dyn Schema>,
    ) -> Self {
        let working = match (&session, working) {
            (Some(_), Some(working)) => working,
            _ => active.clone(),
        };
        Self {
            active,
            working,
            session,
            schema,
        }
    }

    /// The last committed tree.
    pub fn active(&self) -> &ConfigTree {
        &self.active
    }

    /// The tree being edited.
    pub fn working(&self) -> &ConfigTree {
        &self.working
    }

    /// The open session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// True while a session is open.
    pub fn in_session(&self) -> bool {
        self.session.is_some()
    }

    /// The schema collaborator.
    pub fn schema(&self) -> &dyn Schema {
        self.schema.as_ref()
    }

    /// Values at `path` in the working tree.
    pub fn get(&self, path: &ConfigPath) -> Option<&[String]> {
        self.working.get(path)
    }

    /// True if the working tree differs from the active tree.
    pub fn has_changes(&self) -> bool {
        self.working != self.active
    }

    /// Open a session explicitly.
    ///
    /// # Errors
    ///
    /// [`StoreError::SessionBusy`] if one is already open.
    pub fn begin_session(&mut self) -> Result<&Session, StoreError> {
        if self.session.is_some() {
            return Err(StoreError::SessionBusy);
        }
        Ok(self.open_session())
    }

    fn open_session(&mut self) -> &Session {
        let session = self.session.get_or_insert_with(|| {
            let session = Session::open();
            tracing::debug!(session = %session.id, "session opened");
            session
        });
        session
    }

    /// Split raw arguments into a path and an optional trailing value.
    pub fn resolve(&self, args: PathArgs) -> Result<(ConfigPath, Option<String>), StoreError> {
        let schema = self.schema.as_ref();
        Ok(args.split_value(|head| schema.takes_value(head))?)
    }

    /// Record the outcome of a working-tree mutation, opening a session
    /// on success.
    fn finish_edit(
        &mut self,
        op: &str,
        path: &ConfigPath,
        result: Result<(), TreeError>,
    ) -> Result<(), StoreError> {
        if let Err(e) = result {
            tracing::debug!(op, path = %path, error = %e, "edit rejected");
            return Err(e.into());
        }
        self.open_session();
        tracing::debug!(op, path = %path, "edit applied");
        Ok(())
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// `set` from raw arguments.
    pub fn set(&mut self, args: PathArgs) -> Result<(), StoreError> {
        let (path, value) = self.resolve(args)?;
        self.set_path(&path, value.as_deref())
    }

    /// Create `path` and set or append `value`.
    ///
    /// # Errors
    ///
    /// - Tree errors from [`ConfigTree::validate_set`]
    /// - [`StoreError::ValidationFailed`] if the schema rejects the edit
    pub fn set_path(&mut self, path: &ConfigPath, value: Option<&str>) -> Result<(), StoreError> {
        self.validate_set_path(path, value)?;
        let schema = self.schema.as_ref();
        let flags_for = |p: &ConfigPath| -> NodeFlags { schema.flags_for(p) };
        let result = self.working.set(path, value, &flags_for);
        self.finish_edit("set", path, result)
    }

    /// Check that [`Store::set_path`] would succeed.
    pub fn validate_set_path(&self, path: &ConfigPath, value: Option<&str>) -> Result<(), StoreError> {
        self.working.validate_set(path, value)?;
        self.schema
            .validate_set(path, value)
            .map_err(|reason| StoreError::ValidationFailed {
                path: path.clone(),
                reason,
            })
    }

    /// `delete` from raw arguments.
    pub fn delete(&mut self, args: PathArgs) -> Result<(), StoreError> {
        let (path, value) = self.resolve(args)?;
        self.delete_path(&path, value.as_deref())
    }

    /// Remove a subtree, or one value of a leaf.
    pub fn delete_path(&mut self, path: &ConfigPath, value: Option<&str>) -> Result<(), StoreError> {
        let result = self.working.delete(path, value);
        self.finish_edit("delete", path, result)
    }

    /// Rename the last component of `path`.
    pub fn rename(&mut self, path: &ConfigPath, new_name: &str) -> Result<(), StoreError> {
        let result = self.working.rename(path, new_name);
        self.finish_edit("rename", path, result)
    }

    /// Deep-copy `src` to `dst`.
    pub fn copy(&mut self, src: &ConfigPath, dst: &ConfigPath) -> Result<(), StoreError> {
        let result = self.working.copy(src, dst);
        self.finish_edit("copy", src, result)
    }

    /// Move `path` under `new_parent`.
    pub fn move_to(&mut self, path: &ConfigPath, new_parent: &ConfigPath) -> Result<(), StoreError> {
        let result = self.working.move_to(path, new_parent);
        self.finish_edit("move", path, result)
    }

    /// Attach or clear a comment.
    pub fn comment(&mut self, path: &ConfigPath, text: Option<&str>) -> Result<(), StoreError> {
        let result = self.working.comment(path, text);
        self.finish_edit("comment", path, result)
    }

    /// Mark a node deactivated.
    pub fn deactivate(&mut self, path: &ConfigPath) -> Result<(), StoreError> {
        let result = self.working.mark_deactivated(path);
        self.finish_edit("deactivate", path, result)
    }

    /// Clear a node's deactivated flag.
    pub fn activate(&mut self, path: &ConfigPath) -> Result<(), StoreError> {
        let result = self.working.unmark_deactivated(path);
        self.finish_edit("activate", path, result)
    }

    // =========================================================================
    // Session end
    // =========================================================================

    /// Drop all pending edits and close the session.
    ///
    /// # Errors
    ///
    /// [`StoreError::NoSession`] if no session is open.
    pub fn discard(&mut self) -> Result<(), StoreError> {
        let session = self.session.take().ok_or(StoreError::NoSession)?;
        self.working = self.active.clone();
        tracing::debug!(session = %session.id, "session discarded");
        Ok(())
    }

    /// The plan a commit would apply right now.
    pub fn pending(&self) -> CommitPlan {
        CommitPlan::between(&self.active, &self.working)
    }

    /// Reconcile working against active.
    ///
    /// Without a session there is nothing to commit and an empty report is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ValidationFailed`] if the schema rejects a change
    /// - [`StoreError::CommitFailed`] if a change fails to apply
    ///
    /// Either way both trees and the session are left as they were.
    pub fn commit(&mut self) -> Result<CommitReport, StoreError> {
        let Some(session) = &self.session else {
            return Ok(CommitReport::empty());
        };
        let session_id = session.id;

        let (next, report) = CommitEngine::new(self.schema.as_ref())
            .run(&self.active, &self.working)
            .inspect_err(|e| tracing::warn!(session = %session_id, error = %e, "commit aborted"))?;

        self.active = next;
        self.working = self.active.clone();
        self.session = None;
        tracing::info!(
            session = %session_id,
            applied = report.applied,
            digest = %report.digest,
            "commit complete"
        );
        Ok(report)
    }
}
