//! Advisory file locks guarding snapshot collection files.
//!
//! Readers take a shared lock, the delete path takes an exclusive one, so a
//! reload never observes a half-rewritten collection from another process.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

/// Advisory lock errors for collection files.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock timed out after {waited:?} at {}", .path.display())]
    Timeout { path: PathBuf, waited: Duration },
    /// `shared` is set when the failing lock was taken for a read.
    #[error("lock file error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        shared: bool,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    /// Machine-readable code associated with this lock error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io { shared: true, .. } => ErrorCode::CollectionReadFailed,
            Self::Io { shared: false, .. } => ErrorCode::CollectionWriteFailed,
        }
    }
}

#[derive(Clone, Copy)]
enum LockKind {
    Shared,
    Exclusive,
}

#[derive(Debug)]
struct FileGuard {
    file: File,
    path: PathBuf,
}

impl FileGuard {
    fn acquire(path: &Path, timeout: Duration, kind: LockKind) -> Result<Self, LockError> {
        let io_err = |source: io::Error| LockError::Io {
            path: path.to_path_buf(),
            shared: matches!(kind, LockKind::Shared),
            source,
        };
        let parent = path.parent().ok_or_else(|| {
            io_err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "lock path has no parent",
            ))
        })?;
        fs::create_dir_all(parent).map_err(io_err)?;

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)
                .map_err(io_err)?;

            let contended = match kind {
                LockKind::Shared => file.try_lock_shared().is_err(),
                LockKind::Exclusive => file.try_lock_exclusive().is_err(),
            };

            if !contended {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Shared lock held while reading a collection.
#[derive(Debug)]
pub struct CollectionReadLock {
    guard: FileGuard,
}

impl CollectionReadLock {
    /// Acquire a shared advisory lock on `path`.
    ///
    /// # Errors
    ///
    /// Times out if a writer holds the lock for longer than `timeout`.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Ok(Self {
            guard: FileGuard::acquire(path, timeout, LockKind::Shared)?,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.guard.path
    }
}

/// Exclusive lock held while rewriting a collection.
#[derive(Debug)]
pub struct CollectionWriteLock {
    guard: FileGuard,
}

impl CollectionWriteLock {
    /// Acquire an exclusive advisory lock on `path`.
    ///
    /// # Errors
    ///
    /// Times out if any other holder keeps the lock for longer than `timeout`.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Ok(Self {
            guard: FileGuard::acquire(path, timeout, LockKind::Exclusive)?,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.guard.path
    }
}
