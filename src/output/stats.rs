//! Statistics from a harvest checkpoint
//!
//! This module provides functionality for rebuilding a run report from a
//! saved checkpoint and displaying it.

use crate::crawler::HarvestReport;
use crate::records::DedupStore;
use crate::storage::Checkpoint;

/// Rebuilds a report from a saved checkpoint
///
/// Rounds are not recorded in checkpoints and are reported as zero.
pub fn report_from_checkpoint(checkpoint: &Checkpoint) -> HarvestReport {
    let store = DedupStore::from_records(checkpoint.items.iter().cloned());
    HarvestReport::from_session(&checkpoint.state, &store, 0, checkpoint.pages_fetched)
}

/// Prints a report to stdout
pub fn print_report(report: &HarvestReport) {
    println!("=== Harvest Statistics: {} ===\n", report.exam);

    println!("Overview:");
    println!("  Total records: {}", report.total_records);
    println!("  Pages fetched: {}", report.pages_fetched);
    if report.rounds > 0 {
        println!("  Rounds: {}", report.rounds);
    }
    println!("  Quota per subject: {}", report.quota);
    println!(
        "  Status: {}",
        if report.done { "complete" } else { "in progress" }
    );
    println!();

    println!("Subjects ({}):", report.per_subject.len());
    // Sort by count (descending), then name
    let mut counts: Vec<_> = report.per_subject.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    for (subject, count) in counts {
        let percentage = if report.quota > 0 {
            (*count as f64 / report.quota as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}% of quota)", subject, count, percentage);
    }
    println!();

    println!(
        "At quota: {}, exhausted: {}",
        report.subjects_at_quota(),
        report.exhausted_subjects
    );
}
