//! JSON exports: full record list, per-subject files and the summary

use crate::output::traits::{ExamSummary, OutputResult};
use crate::records::Record;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File-system-safe form of a subject or exam name
///
/// Every character outside `[A-Za-z0-9_-]` becomes `_`.
///
/// ```
/// use exam_harvest::output::safe_file_name;
///
/// assert_eq!(safe_file_name("Further Mathematics"), "Further_Mathematics");
/// assert_eq!(safe_file_name("lit-in-english"), "lit-in-english");
/// ```
pub fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Pretty-printed JSON to `path`
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// One `<safe-name>.json` per subject; returns the written paths
pub fn write_subject_files(
    by_subject: &BTreeMap<String, Vec<Record>>,
    dir: &Path,
) -> OutputResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(by_subject.len());
    for (subject, records) in by_subject {
        let path = dir.join(format!("{}.json", safe_file_name(subject)));
        write_json(records, &path)?;
        written.push(path);
    }
    Ok(written)
}

/// Counts per subject from a grouping
pub fn build_summary(exam: &str, by_subject: &BTreeMap<String, Vec<Record>>) -> ExamSummary {
    let subjects: BTreeMap<String, usize> = by_subject
        .iter()
        .map(|(subject, records)| (subject.clone(), records.len()))
        .collect();
    ExamSummary {
        exam: exam.to_string(),
        total_collected: subjects.values().sum(),
        subjects,
    }
}
