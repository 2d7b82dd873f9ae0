//! Local persistent preferences.
//!
//! Only one key is used by the list view, [`SHOW_FULL_JSON_METADATA`], which
//! holds the metadata-collapse toggle. It is process-wide, not per project.

use crate::error::ErrorCode;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata-collapse display preference (`true` = collapsed).
pub const SHOW_FULL_JSON_METADATA: &str = "show-full-json-metadata";

/// Errors raised while persisting preferences.
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("failed to write preferences to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PrefsError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::PreferenceWriteFailed
    }
}

/// Key/value preference storage.
pub trait PreferenceStore {
    fn get_bool(&self, key: &str) -> Option<bool>;

    /// # Errors
    ///
    /// Returns [`PrefsError`] if the value could not be persisted.
    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PrefsError>;
}

/// Preferences that live only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, Value>,
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), Value::Bool(value));
        Ok(())
    }
}

/// Preferences stored as a JSON object on disk.
///
/// An unreadable or corrupt file is treated as empty; the next write
/// replaces it.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl FilePreferences {
    /// `~/.config/snaplist/preferences.json`, or `None` without a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("snaplist").join("preferences.json"))
    }

    /// Load preferences from `path`.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        let values = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!("ignoring corrupt preferences at {}: {err}", path.display());
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                tracing::warn!("cannot read preferences at {}: {err}", path.display());
                BTreeMap::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            values,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), PrefsError> {
        let write_err = |source| PrefsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content).map_err(write_err)
    }
}

impl PreferenceStore for FilePreferences {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), Value::Bool(value));
        self.persist()
    }
}
