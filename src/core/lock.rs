//! core::lock
//!
//! Exclusive store lock.
//!
//! # Architecture
//!
//! Only one process may read-modify-write a store directory at a time.
//! The CLI takes this lock before loading state and holds it until the
//! command has written its results back.
//!
//! # Invariants
//!
//! - Acquisition is non-blocking (fails fast if locked)
//! - The lock is released on drop

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::StorePaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("store is locked by another cstore process")]
    AlreadyLocked,

    /// Failed to create the lock file or its directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on a store directory.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    /// Some while the lock is held.
    file: Option<File>,
}

impl StoreLock {
    /// Acquire the lock for `paths`, creating the store directory if needed.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another holder exists
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be taken
    pub fn acquire(paths: &StorePaths) -> Result<Self, LockError> {
        paths.ensure_dirs().map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", paths.root().display(), e))
        })?;

        let path = paths.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "store lock acquired");
                Ok(Self {
                    path,
                    file: Some(file),
                })
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(LockError::AlreadyLocked)
            }
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// True while this guard holds the lock.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release early. Calling this twice is fine.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
