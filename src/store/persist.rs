//! store::persist
//!
//! Store state on disk, for processes that live for a single command.
//!
//! # Architecture
//!
//! A [`StoreDir`] holds the exclusive [`StoreLock`] for its whole life.
//! The CLI opens it, loads a [`Store`], runs one operation, saves, and
//! drops it:
//!
//! ```text
//! open (lock) -> load -> operate -> save -> drop (unlock)
//! ```
//!
//! Files are JSON and are replaced atomically (temp file, fsync, rename).
//! `working.json` and `session.json` exist only while a session is open.
//!
//! # Invariants
//!
//! - No file is read or written without the lock held
//! - A crash mid-save never leaves a torn file

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::{Session, Store};
use crate::core::lock::{LockError, StoreLock};
use crate::core::paths::StorePaths;
use crate::core::schema::Schema;
use crate::core::tree::ConfigTree;

/// Errors from reading or writing the store directory.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The store lock could not be taken.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Filesystem failure.
    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file exists but does not decode.
    #[error("corrupt store file '{path}': {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// A locked store directory.
#[derive(Debug)]
pub struct StoreDir {
    paths: StorePaths,
    _lock: StoreLock,
}

impl StoreDir {
    /// Lock `root`, creating it if needed.
    ///
    /// # Errors
    ///
    /// [`PersistError::Lock`] if another process holds the store.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let paths = StorePaths::new(root);
        let lock = StoreLock::acquire(&paths)?;
        Ok(Self { paths, _lock: lock })
    }

    /// Path routing for this directory.
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Load the saved store. A fresh directory yields an empty store.
    ///
    /// # Errors
    ///
    /// [`PersistError::Corrupt`] if a file does not decode, or decodes to a
    /// tree with malformed node keys or more than
    /// [`MAX_DEPTH`](crate::core::path::MAX_DEPTH) levels.
    pub fn load(&self, schema: Box<dyn Schema>) -> Result<Store, PersistError> {
        let active: ConfigTree = read_json(&self.paths.active_path())?.unwrap_or_default();
        let session: Option<Session> = read_json(&self.paths.session_path())?;
        let working: Option<ConfigTree> = match session {
            Some(_) => read_json(&self.paths.working_path())?,
            None => None,
        };
        tracing::debug!(
            dir = %self.paths.root().display(),
            nodes = active.len(),
            session = session.is_some(),
            "store loaded"
        );
        Ok(Store::from_parts(active, working, session, schema))
    }

    /// Save `store`, removing session files when no session is open.
    pub fn save(&self, store: &Store) -> Result<(), PersistError> {
        write_json_atomic(&self.paths.active_path(), store.active())?;
        match store.session() {
            Some(session) => {
                write_json_atomic(&self.paths.working_path(), store.working())?;
                write_json_atomic(&self.paths.session_path(), session)?;
            }
            None => {
                remove_if_exists(&self.paths.session_path())?;
                remove_if_exists(&self.paths.working_path())?;
            }
        }
        tracing::debug!(dir = %self.paths.root().display(), "store saved");
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(PersistError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| PersistError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    let contents = serde_json::to_string_pretty(value).map_err(|e| PersistError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let temp_path = StorePaths::tmp_path(path);
    let mut file = fs::File::create(&temp_path).map_err(io_err(&temp_path))?;
    file.write_all(contents.as_bytes())
        .map_err(io_err(&temp_path))?;
    file.sync_all().map_err(io_err(&temp_path))?;
    fs::rename(&temp_path, path).map_err(io_err(path))?;
    Ok(())
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PersistError {
    let path = path.to_path_buf();
    move |source| PersistError::Io { path, source }
}

fn remove_if_exists(path: &Path) -> Result<(), PersistError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PersistError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
