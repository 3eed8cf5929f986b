//! core::paths
//!
//! Centralized path routing for the store directory.
//!
//! # Storage Layout
//!
//! Everything lives under a single store directory:
//! - `active.json` - committed tree
//! - `working.json` - working tree, present only while a session is open
//! - `session.json` - session marker
//! - `lock` - exclusive lock file
//!
//! No code outside this module joins file names onto the store directory.
//!
//! # Example
//!
//! ```
//! use cstore::core::paths::StorePaths;
//! use std::path::PathBuf;
//!
//! let paths = StorePaths::new("/var/lib/cstore");
//! assert_eq!(paths.active_path(), PathBuf::from("/var/lib/cstore/active.json"));
//! ```

use std::path::{Path, PathBuf};

/// Path routing for one store directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    /// Route paths under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Committed tree.
    pub fn active_path(&self) -> PathBuf {
        self.root.join("active.json")
    }

    /// Working tree of the open session.
    pub fn working_path(&self) -> PathBuf {
        self.root.join("working.json")
    }

    /// Session marker.
    pub fn session_path(&self) -> PathBuf {
        self.root.join("session.json")
    }

    /// Lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join("lock")
    }

    /// Temporary sibling used for atomic replacement of `target`.
    pub fn tmp_path(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        target.with_file_name(name)
    }

    /// Create the store directory if needed.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }
}
