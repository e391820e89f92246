//! Flat CSV export of collected records

use crate::output::traits::OutputResult;
use crate::records::Record;
use std::path::Path;

/// Column order of the CSV export
pub const CSV_HEADER: [&str; 9] = [
    "source_id",
    "exam",
    "source_year",
    "source_subject",
    "question",
    "options",
    "answer",
    "explanation",
    "fetched_page",
];

/// Writes one row per record; options are embedded as compact JSON
pub fn write_records_csv(records: &[Record], path: &Path) -> OutputResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADER)?;

    for record in records {
        let options = record.options_json().unwrap_or_default();
        let fetched_page = record.fetched_page.to_string();
        writer.write_record([
            single_line(record.source_id.as_deref().unwrap_or("")),
            single_line(&record.exam),
            single_line(&record.year),
            single_line(&record.subject),
            single_line(&record.question),
            single_line(&options),
            single_line(record.answer.as_deref().unwrap_or("")),
            single_line(record.explanation.as_deref().unwrap_or("")),
            fetched_page,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Line breaks inside a field become single spaces
fn single_line(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_break = false;
    for c in value.chars() {
        if c == '\r' || c == '\n' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }
    out
}
