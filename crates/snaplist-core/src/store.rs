//! File-backed snapshot collections.
//!
//! This is the loader and mutation layer the CLI plugs into the list
//! controller. Each project/kind pair is one JSON array:
//!
//! ```text
//! <data_dir>/<project_id>/reports.json
//! <data_dir>/<project_id>/test-suites.json
//! ```
//!
//! A missing file is an empty collection. Deletes rewrite the file
//! atomically (temp file + rename) under an exclusive advisory lock.

use crate::actions::ActionRequest;
use crate::error::ErrorCode;
use crate::lock::{CollectionReadLock, CollectionWriteLock, LockError};
use crate::model::{Snapshot, SnapshotKind};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from reading or mutating a collection file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid project id '{0}'")]
    InvalidProjectId(String),

    #[error("snapshot '{snapshot_id}' not found")]
    NotFound { snapshot_id: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidProjectId(_) => ErrorCode::InvalidProjectId,
            Self::NotFound { .. } => ErrorCode::SnapshotNotFound,
            Self::Read { .. } => ErrorCode::CollectionReadFailed,
            Self::Corrupt { .. } => ErrorCode::CollectionCorrupt,
            Self::Write { .. } => ErrorCode::CollectionWriteFailed,
            Self::Lock(err) => err.code(),
        }
    }
}

/// Snapshot collections rooted at a data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
    lock_timeout: Duration,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the JSON file holding `project_id`'s `kind` collection.
    ///
    /// # Errors
    ///
    /// Rejects project ids that are empty or would escape the data directory.
    pub fn collection_path(
        &self,
        project_id: &str,
        kind: SnapshotKind,
    ) -> Result<PathBuf, StoreError> {
        Ok(self
            .project_dir(project_id)?
            .join(format!("{}.json", kind.as_str())))
    }

    fn project_dir(&self, project_id: &str) -> Result<PathBuf, StoreError> {
        let invalid = project_id.trim().is_empty()
            || project_id == "."
            || project_id == ".."
            || project_id.contains(['/', '\\']);
        if invalid {
            return Err(StoreError::InvalidProjectId(project_id.to_string()));
        }
        Ok(self.root.join(project_id))
    }

    fn lock_path(&self, project_id: &str, kind: SnapshotKind) -> Result<PathBuf, StoreError> {
        Ok(self
            .project_dir(project_id)?
            .join(format!(".{}.lock", kind.as_str())))
    }

    /// Load the whole collection, in file order.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or malformed files and on lock timeouts.
    pub fn load(&self, project_id: &str, kind: SnapshotKind) -> Result<Vec<Snapshot>, StoreError> {
        let path = self.collection_path(project_id, kind)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let _lock = CollectionReadLock::acquire(&self.lock_path(project_id, kind)?, self.lock_timeout)?;
        read_collection(&path)
    }

    /// Replace the whole collection.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written or the lock cannot be taken.
    pub fn save(
        &self,
        project_id: &str,
        kind: SnapshotKind,
        snapshots: &[Snapshot],
    ) -> Result<(), StoreError> {
        let path = self.collection_path(project_id, kind)?;
        let _lock =
            CollectionWriteLock::acquire(&self.lock_path(project_id, kind)?, self.lock_timeout)?;
        write_collection(&path, snapshots)
    }

    /// Remove one snapshot and return the collection that remains.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no snapshot has that id.
    pub fn delete(
        &self,
        project_id: &str,
        kind: SnapshotKind,
        snapshot_id: &str,
    ) -> Result<Vec<Snapshot>, StoreError> {
        let path = self.collection_path(project_id, kind)?;
        let _lock =
            CollectionWriteLock::acquire(&self.lock_path(project_id, kind)?, self.lock_timeout)?;

        let mut snapshots = if path.exists() {
            read_collection(&path)?
        } else {
            Vec::new()
        };
        let before = snapshots.len();
        snapshots.retain(|snapshot| snapshot.id != snapshot_id);
        if snapshots.len() == before {
            return Err(StoreError::NotFound {
                snapshot_id: snapshot_id.to_string(),
            });
        }

        write_collection(&path, &snapshots)?;
        tracing::info!(project_id, kind = %kind, snapshot_id, "deleted snapshot");
        Ok(snapshots)
    }

    /// Carry out a submitted action and return the fresh collection.
    ///
    /// # Errors
    ///
    /// Propagates the load or delete failure.
    pub fn execute(
        &self,
        project_id: &str,
        kind: SnapshotKind,
        request: &ActionRequest,
    ) -> Result<Vec<Snapshot>, StoreError> {
        match request {
            ActionRequest::ReloadSnapshots => {
                tracing::info!(project_id, kind = %kind, "reloading snapshots");
                self.load(project_id, kind)
            }
            ActionRequest::DeleteSnapshot { snapshot_id } => {
                self.delete(project_id, kind, snapshot_id)
            }
        }
    }
}

fn read_collection(path: &Path) -> Result<Vec<Snapshot>, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_collection(path: &Path, snapshots: &[Snapshot]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let content = serde_json::to_string_pretty(snapshots)
        .map_err(|err| write_err(io::Error::new(io::ErrorKind::InvalidData, err)))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)
}
