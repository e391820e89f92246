//! JSON checkpoint file
//!
//! The document is `{state, items, pagesFetched, configHash, savedAt}`. Writes
//! go to a sibling temporary file which is then renamed over the target, so an
//! interrupted write leaves the previous checkpoint intact.

use crate::records::Record;
use crate::state::Session;
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A checkpoint read back from disk
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub state: Session,
    #[serde(default)]
    pub items: Vec<Record>,
    #[serde(default)]
    pub pages_fetched: u64,
    #[serde(default)]
    pub config_hash: Option<String>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// A checkpoint about to be written, borrowing live state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointSnapshot<'a> {
    pub state: &'a Session,
    pub items: &'a [Record],
    pub pages_fetched: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<&'a str>,
    pub saved_at: DateTime<Utc>,
}

/// Checkpoint stored as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl CheckpointStore for JsonFileStore {
    fn load_checkpoint(&self) -> StorageResult<Option<Checkpoint>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })
    }

    fn save_checkpoint(&self, snapshot: &CheckpointSnapshot<'_>) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp).map_err(|e| self.io_error(e))?;
            file.write_all(&json).map_err(|e| self.io_error(e))?;
            file.sync_all().map_err(|e| self.io_error(e))?;
        }
        fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn clear_checkpoint(&self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
