//! core::ops::lock
//!
//! Exclusive repository lock for specstack mutations.
//!
//! # Architecture
//!
//! Every mutating operation is a load-mutate-save of the dependency
//! document. The lock serializes those cycles between processes working on
//! the same repository, so two concurrent `create` calls cannot both read the
//! old document and lose one of the new entries.
//!
//! # Storage
//!
//! - `<work_dir>/.specstack/lock` - Lock file with OS-level exclusive lock
//!
//! # Invariants
//!
//! - Held for the whole load-mutate-save cycle
//! - Released on drop (RAII)
//! - Acquisition is non-blocking (fails fast if locked)
//!
//! # Example
//!
//! ```ignore
//! use specstack::core::ops::lock::RepoLock;
//! use specstack::core::paths::ToolPaths;
//!
//! let paths = ToolPaths::new(repo_root);
//! let lock = RepoLock::acquire(&paths)?;
//! // load, mutate, save
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::ToolPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("repository is locked by another specstack process")]
    AlreadyLocked,

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on one repository's specstack state.
///
/// Released when dropped, even if the operation panics.
#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
    file: File,
}

impl RepoLock {
    /// Attempt to acquire the repository lock.
    ///
    /// Uses OS-level file locking via `fs2`. Non-blocking: if another
    /// process holds the lock this returns [`LockError::AlreadyLocked`]
    /// immediately.
    pub fn acquire(paths: &ToolPaths) -> Result<Self, LockError> {
        let tool_dir = paths.tool_dir();
        fs::create_dir_all(&tool_dir).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", tool_dir.display(), e))
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
                tracing::debug!(path = %path.display(), "acquired repository lock");
                Ok(Self { path, file })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        tracing::debug!(path = %self.path.display(), "released repository lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_paths(dir: &Path) -> ToolPaths {
        ToolPaths::new(dir.to_path_buf())
    }

    #[test]
    fn lock_acquire_creates_lock_file() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());
        assert!(!paths.tool_dir().exists());

        let _lock = RepoLock::acquire(&paths).expect("acquire lock");
        assert!(paths.tool_dir().exists());
        assert!(paths.lock_path().exists());
    }

    #[test]
    fn lock_prevents_second_acquire() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        let _lock1 = RepoLock::acquire(&paths).expect("first acquire");
        let result = RepoLock::acquire(&paths);
        assert!(matches!(result, Err(LockError::AlreadyLocked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        let lock = RepoLock::acquire(&paths).expect("first acquire");
        drop(lock);

        RepoLock::acquire(&paths).expect("second acquire");
    }

    #[test]
    fn separate_repositories_lock_independently() {
        let a = TempDir::new().expect("create temp dir");
        let b = TempDir::new().expect("create temp dir");

        let _la = RepoLock::acquire(&test_paths(a.path())).expect("lock a");
        RepoLock::acquire(&test_paths(b.path())).expect("lock b");
    }
}
