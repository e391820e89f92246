//! Output error types and shared data structures
//!
//! This module defines the error type for output operations and the summary
//! document written next to the exported records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to format CSV output: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Per-exam totals, written as `summary_<EXAM>.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamSummary {
    pub exam: String,
    pub total_collected: usize,
    /// Subject name to record count; every session subject is present
    pub subjects: BTreeMap<String, usize>,
}

impl ExamSummary {
    /// Subjects that produced no records
    pub fn empty_subjects(&self) -> Vec<&str> {
        self.subjects
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
