//! Storage module for persisting harvest progress
//!
//! This module handles checkpoint persistence, including:
//! - Atomic JSON snapshots of traversal state and collected records
//! - Tolerant loading (missing or corrupt checkpoints start a fresh session)
//! - Non-fatal saves (a failed write is logged and the run continues)

mod checkpoint;
mod traits;

pub use checkpoint::{Checkpoint, CheckpointSnapshot, JsonFileStore};
pub use traits::{CheckpointStore, StorageError, StorageResult};

use crate::records::Record;
use crate::state::Session;
use chrono::Utc;
use std::path::Path;

/// Opens the JSON checkpoint store at `path`
///
/// Nothing is read or created until the first load or save.
pub fn open_checkpoints(path: &Path) -> CheckpointManager<JsonFileStore> {
    CheckpointManager::new(JsonFileStore::new(path))
}

/// Saves and restores harvest snapshots
///
/// Wraps a [`CheckpointStore`] with the policy the harvest loop needs: load
/// failures degrade to "no checkpoint" and save failures never stop a run.
#[derive(Debug, Clone)]
pub struct CheckpointManager<S> {
    store: S,
    config_hash: Option<String>,
}

impl<S: CheckpointStore> CheckpointManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config_hash: None,
        }
    }

    /// Stamps every snapshot with the hash of the config that produced it
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn config_hash(&self) -> Option<&str> {
        self.config_hash.as_deref()
    }

    pub fn location(&self) -> &Path {
        self.store.location()
    }

    /// Writes a snapshot; returns whether it reached disk
    pub fn save(&self, session: &Session, records: &[Record], pages_fetched: u64) -> bool {
        match self.try_save(session, records, pages_fetched) {
            Ok(()) => {
                tracing::debug!(
                    "Checkpoint saved to {} ({} records, {} pages)",
                    self.location().display(),
                    records.len(),
                    pages_fetched
                );
                true
            }
            Err(e) => {
                tracing::warn!("Failed to save checkpoint: {}", e);
                false
            }
        }
    }

    pub fn try_save(
        &self,
        session: &Session,
        records: &[Record],
        pages_fetched: u64,
    ) -> StorageResult<()> {
        self.store.save_checkpoint(&CheckpointSnapshot {
            state: session,
            items: records,
            pages_fetched,
            config_hash: self.config_hash.as_deref(),
            saved_at: Utc::now(),
        })
    }

    /// Reads the last snapshot, treating unreadable ones as absent
    pub fn load(&self) -> Option<Checkpoint> {
        match self.store.load_checkpoint() {
            Ok(Some(checkpoint)) => {
                if let (Some(saved), Some(current)) =
                    (checkpoint.config_hash.as_deref(), self.config_hash.as_deref())
                {
                    if saved != current {
                        tracing::warn!(
                            "Checkpoint {} was written with a different config; resuming anyway",
                            self.location().display()
                        );
                    }
                }
                Some(checkpoint)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable checkpoint: {}", e);
                None
            }
        }
    }

    pub fn try_load(&self) -> StorageResult<Option<Checkpoint>> {
        self.store.load_checkpoint()
    }

    /// Deletes the stored snapshot, for `--fresh` runs
    pub fn clear(&self) -> StorageResult<()> {
        self.store.clear_checkpoint()
    }
}
