//! Output module for exporting harvested questions
//!
//! This module handles:
//! - Writing the full record list as JSON and CSV
//! - Writing one JSON file per subject
//! - Writing the per-exam summary
//! - Displaying run statistics

mod csv_export;
mod files;
pub mod stats;
mod traits;

pub use csv_export::{write_records_csv, CSV_HEADER};
pub use files::{build_summary, safe_file_name, write_json, write_subject_files};
pub use stats::{print_report, report_from_checkpoint};
pub use traits::{ExamSummary, OutputError, OutputResult};

use crate::records::DedupStore;
use std::fs;
use std::path::{Path, PathBuf};

/// Paths written by [`write_outputs`]
#[derive(Debug, Clone)]
pub struct OutputFiles {
    pub directory: PathBuf,
    pub records_json: PathBuf,
    pub records_csv: PathBuf,
    pub subject_files: Vec<PathBuf>,
    pub summary: PathBuf,
}

/// Writes every export for `exam` under `<root>/<exam>/`
///
/// # Arguments
///
/// * `root` - Output root directory
/// * `exam` - Exam identifier, used in file names
/// * `store` - The deduplicated records
/// * `subjects` - Session subjects; each gets a file even with no records
///
/// # Returns
///
/// * `Ok(OutputFiles)` - Every file was written
/// * `Err(OutputError)` - A directory or file could not be written
pub fn write_outputs(
    root: &Path,
    exam: &str,
    store: &DedupStore,
    subjects: &[String],
) -> OutputResult<OutputFiles> {
    let safe_exam = safe_file_name(exam);
    let directory = root.join(&safe_exam);
    fs::create_dir_all(&directory)?;

    let records_json = directory.join(format!("exam_{}.json", safe_exam));
    write_json(store.records(), &records_json)?;

    let records_csv = directory.join(format!("exam_{}.csv", safe_exam));
    write_records_csv(store.records(), &records_csv)?;
    tracing::info!(
        "Wrote {} records to {} and {}",
        store.len(),
        records_json.display(),
        records_csv.display()
    );

    let by_subject = store.group_by_subject(subjects);
    let subject_files = write_subject_files(&by_subject, &directory.join("subjects"))?;

    let summary_path = directory.join(format!("summary_{}.json", safe_exam));
    let summary = build_summary(exam, &by_subject);
    write_json(&summary, &summary_path)?;
    tracing::info!(
        "Wrote {} subject files and {}",
        subject_files.len(),
        summary_path.display()
    );

    let empty = summary.empty_subjects();
    if !empty.is_empty() {
        tracing::debug!("Subjects with no records: {}", empty.join(", "));
    }

    Ok(OutputFiles {
        directory,
        records_json,
        records_csv,
        subject_files,
        summary: summary_path,
    })
}
