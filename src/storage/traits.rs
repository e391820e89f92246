//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::storage::{Checkpoint, CheckpointSnapshot};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt checkpoint at {path}: {message}")]
    Corrupt { path: String, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A place checkpoints are written to and read back from
///
/// Implementations must make `save_checkpoint` atomic: a reader never sees a
/// half-written snapshot.
pub trait CheckpointStore {
    /// Reads the last snapshot
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - No checkpoint has been written yet
    /// * `Ok(Some(_))` - The last complete snapshot
    /// * `Err(StorageError::Corrupt)` - A file exists but cannot be decoded
    fn load_checkpoint(&self) -> StorageResult<Option<Checkpoint>>;

    /// Replaces the stored snapshot
    fn save_checkpoint(&self, snapshot: &CheckpointSnapshot<'_>) -> StorageResult<()>;

    /// Removes any stored snapshot
    fn clear_checkpoint(&self) -> StorageResult<()>;

    /// Where the snapshot lives, for log messages
    fn location(&self) -> &Path;
}
