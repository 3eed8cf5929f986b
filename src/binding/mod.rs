//! binding
//!
//! Stable handle API for embedding the store.
//!
//! # Architecture
//!
//! A [`Handle`] owns one [`Store`]. There is no process-wide instance:
//! callers create handles explicitly and pass them to every call. Each
//! call returns a [`Status`] carrying a stable code and, on failure, a
//! diagnostic string. Nothing is printed.
//!
//! Raw path arguments are turned into a length-checked [`PathArgs`] once,
//! at the top of each call, before the store sees them.
//!
//! # Versioning
//!
//! [`API_VERSION`] identifies this operation set. Any change to the
//! signatures or the meaning of a [`StatusCode`] bumps it.
//!
//! # Example
//!
//! ```
//! use cstore::binding::{Handle, StatusCode};
//! use cstore::core::schema::OpenSchema;
//!
//! let mut handle = Handle::init(Box::new(OpenSchema));
//! assert!(!handle.in_session());
//!
//! let status = handle.set_path(&["interfaces", "eth0"]);
//! assert_eq!(status.code, StatusCode::Success);
//! assert!(handle.in_session());
//!
//! let status = handle.delete_path(&["missing"]);
//! assert_eq!(status.code, StatusCode::ApplyFailed);
//! assert_eq!(status.diagnostic.as_deref(), Some("delete failed: missing"));
//! handle.free();
//! ```

use serde::Serialize;

use crate::core::path::PathArgs;
use crate::core::schema::Schema;
use crate::store::{Store, StoreError};

/// Version of the handle API.
pub const API_VERSION: u32 = 1;

/// Outcome class of a handle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum StatusCode {
    Success = 0,
    /// The path or value was rejected before the tree was touched.
    ValidationFailed = 1,
    /// The operation was attempted and failed.
    ApplyFailed = 2,
}

impl StatusCode {
    /// The stable numeric code.
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Result of a handle call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Outcome class.
    pub code: StatusCode,
    /// Diagnostic text, present on failure.
    pub diagnostic: Option<String>,
}

impl Status {
    fn success() -> Self {
        Self {
            code: StatusCode::Success,
            diagnostic: None,
        }
    }

    fn failure(code: StatusCode, diagnostic: String) -> Self {
        tracing::debug!(code = code.as_u32(), %diagnostic, "binding call failed");
        Self {
            code,
            diagnostic: Some(diagnostic),
        }
    }

    /// True for [`StatusCode::Success`].
    pub fn is_success(&self) -> bool {
        self.code == StatusCode::Success
    }
}

/// An owned store instance behind the handle API.
#[derive(Debug)]
pub struct Handle {
    store: Store,
}

impl Handle {
    /// Create a handle with an empty store.
    pub fn init(schema: Box<dyn Schema>) -> Self {
        Self {
            store: Store::new(schema),
        }
    }

    /// Release the handle.
    pub fn free(self) {
        drop(self);
    }

    /// True while an edit session is open.
    pub fn in_session(&self) -> bool {
        self.store.in_session()
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Set a path given as raw components (the last may be a value).
    ///
    /// Validation failures return `ValidationFailed` with
    /// `invalid set path: <path>`; failures while applying return
    /// `ApplyFailed` with `set config path failed: <path>`.
    pub fn set_path<S: AsRef<str>>(&mut self, path: &[S]) -> Status {
        let shown = display_words(path);
        let invalid = |reason: String| {
            Status::failure(
                StatusCode::ValidationFailed,
                format!("invalid set path: {shown}: {reason}"),
            )
        };

        let args = match PathArgs::new(path) {
            Ok(args) => args,
            Err(e) => return invalid(e.to_string()),
        };
        let (target, value) = match self.store.resolve(args) {
            Ok(resolved) => resolved,
            Err(e) => return invalid(e.to_string()),
        };
        if let Err(e) = self.store.validate_set_path(&target, value.as_deref()) {
            return invalid(e.to_string());
        }
        match self.store.set_path(&target, value.as_deref()) {
            Ok(()) => Status::success(),
            Err(e) => Status::failure(
                StatusCode::ApplyFailed,
                format!("set config path failed: {shown}: {e}"),
            ),
        }
    }

    /// Delete a path given as raw components (the last may be a value).
    ///
    /// Failures return `ApplyFailed` with `delete failed: <path>`.
    pub fn delete_path<S: AsRef<str>>(&mut self, path: &[S]) -> Status {
        let shown = display_words(path);
        let result = PathArgs::new(path)
            .map_err(StoreError::from)
            .and_then(|args| self.store.delete(args));
        match result {
            Ok(()) => Status::success(),
            Err(e) => {
                tracing::debug!(error = %e, "delete rejected");
                Status::failure(StatusCode::ApplyFailed, format!("delete failed: {shown}"))
            }
        }
    }
}

fn display_words<S: AsRef<str>>(words: &[S]) -> String {
    match PathArgs::new(words) {
        Ok(args) => args.to_string(),
        Err(_) => words
            .iter()
            .map(|w| w.as_ref())
            .collect::<Vec<_>>()
            .join(" "),
    }
}
