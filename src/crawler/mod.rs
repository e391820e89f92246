//! Crawler module for harvesting questions from the catalog
//!
//! This module contains the core harvest logic, including:
//! - Catalog discovery (exams, years, subjects)
//! - Subject slug resolution
//! - The per-subject traversal step
//! - Round coordination, quotas and checkpoints

mod coordinator;
mod discovery;
mod resolver;
mod traversal;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{derive_quota, session_quota, Coordinator, HarvestReport};
pub use discovery::{list_exams, list_subjects, list_years};
pub use resolver::{slug_variants, Resolution, SubjectResolver};
pub use traversal::{step, StepOutcome, TraversalSettings};

use crate::config::{CollectionConfig, Config};
use crate::output::{write_outputs, OutputFiles};
use crate::records::DedupStore;
use crate::remote::CatalogApi;
use crate::state::Session;
use crate::storage::{open_checkpoints, Checkpoint};
use crate::HarvestError;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Per-run switches that do not belong in the config file
#[derive(Debug, Clone, Default)]
pub struct HarvestOptions {
    /// Ignore any existing checkpoint
    pub fresh: bool,
    /// Hash of the config file, recorded in checkpoints
    pub config_hash: Option<String>,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    pub report: HarvestReport,
    pub files: OutputFiles,
}

/// Runs a complete harvest
///
/// This is the main entry point for a collection run. It will:
/// 1. Confirm the exam is offered by the catalog
/// 2. Resume from the checkpoint, or bootstrap a fresh session
/// 3. Run rounds until the harvest settles
/// 4. Write the output files
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `api` - The catalog client
/// * `options` - Run switches
///
/// # Returns
///
/// * `Ok(HarvestOutcome)` - Report and written files
/// * `Err(HarvestError)` - The exam is unknown, no years or subjects exist, no
///   quota is configured, or outputs could not be written
pub async fn run_harvest(
    config: &Config,
    api: Arc<dyn CatalogApi>,
    options: HarvestOptions,
) -> Result<HarvestOutcome, HarvestError> {
    let exam = config.collection.exam.clone();

    let exams = list_exams(api.as_ref()).await;
    tracing::info!("Available exams from API: {}", exams.join(", "));
    if !exams.iter().any(|e| *e == exam) {
        return Err(HarvestError::ExamNotFound {
            exam,
            available: exams,
        });
    }

    let checkpoint_path = config.checkpoint_path();
    let mut checkpoints = open_checkpoints(Path::new(&checkpoint_path));
    if let Some(hash) = &options.config_hash {
        checkpoints = checkpoints.with_config_hash(hash.clone());
    }

    let checkpoint = if options.fresh {
        tracing::info!("Starting fresh (discarding {})", checkpoint_path);
        if let Err(e) = checkpoints.clear() {
            tracing::warn!("Could not remove old checkpoint: {}", e);
        }
        None
    } else {
        checkpoints
            .load()
            .filter(|cp| usable_checkpoint(cp, &exam))
    };

    let (mut session, store, pages_fetched, resumed) = match checkpoint {
        Some(checkpoint) => {
            let store = DedupStore::from_records(checkpoint.items);
            let mut session = checkpoint.state;
            session.ensure_pointers();
            if let Some(configured) = &config.collection.subjects {
                let added = session.add_subjects(configured.iter().cloned());
                if !added.is_empty() {
                    tracing::info!("Added subjects from config: {}", added.join(", "));
                    session.done = false;
                }
            }
            tracing::info!(
                "Resuming from checkpoint: {} subjects, {} years, {} records",
                session.subjects.len(),
                session.years.len(),
                store.len()
            );
            (session, store, checkpoint.pages_fetched, true)
        }
        None => {
            let session = build_session(api.as_ref(), &config.collection).await;
            (session, DedupStore::new(), 0, false)
        }
    };

    if session.years.is_empty() {
        return Err(HarvestError::NoYears { exam });
    }
    if session.subjects.is_empty() {
        return Err(HarvestError::NoSubjects { exam });
    }

    session.quota = session_quota(config, &session)?;
    if !resumed {
        checkpoints.save(&session, store.records(), pages_fetched);
        tracing::info!("Initial checkpoint saved to {}", checkpoint_path);
    }

    let mut coordinator = Coordinator::new(api, config, session, store, checkpoints, pages_fetched)?;
    let report = coordinator.run().await;

    let files = write_outputs(
        Path::new(&config.output.directory),
        &exam,
        coordinator.store(),
        &coordinator.session().subjects,
    )?;

    Ok(HarvestOutcome { report, files })
}

/// A checkpoint is only resumed for the exam it was written for
fn usable_checkpoint(checkpoint: &Checkpoint, exam: &str) -> bool {
    if checkpoint.state.exam != exam {
        tracing::warn!(
            "Ignoring checkpoint for exam \"{}\" (configured exam is \"{}\")",
            checkpoint.state.exam,
            exam
        );
        return false;
    }
    true
}

/// Builds a fresh session from config lists, discovery, or fallbacks
pub async fn build_session(api: &dyn CatalogApi, collection: &CollectionConfig) -> Session {
    let exam = collection.exam.as_str();
    let polite_delay = Duration::from_millis(collection.polite_delay_ms);

    let years = match &collection.years {
        Some(years) => years.clone(),
        None => {
            let discovered = list_years(api, exam).await;
            if discovered.is_empty() {
                tracing::warn!(
                    "No years discovered for {}, using fallback range ({} years)",
                    exam,
                    collection.fallback_years.len()
                );
                collection.fallback_years.clone()
            } else {
                tracing::info!("Discovered years: {}", discovered.join(", "));
                discovered
            }
        }
    };

    let years = match collection.years_back {
        Some(count) => {
            let window = recent_years(&years, count);
            if window.is_empty() {
                tracing::warn!(
                    "No four-digit years left after applying years-back = {}, using fallback range",
                    count
                );
                recent_years(&collection.fallback_years, count)
            } else {
                window
            }
        }
        None => years,
    };

    let subjects = match &collection.subjects {
        Some(subjects) => dedup_preserving_order(subjects),
        None => {
            let mut discovered = BTreeSet::new();
            for year in &years {
                discovered.extend(list_subjects(api, exam, year).await);
                if !polite_delay.is_zero() {
                    tokio::time::sleep(polite_delay).await;
                }
            }
            if discovered.is_empty() {
                tracing::warn!("No subjects discovered for {}, using fallback subjects", exam);
                collection.fallback_subjects.clone()
            } else {
                tracing::info!("Discovered {} subjects", discovered.len());
                discovered.into_iter().collect()
            }
        }
    };

    Session::new(exam, years, subjects)
}

/// The `count` most recent four-digit years, newest first
pub fn recent_years(years: &[String], count: usize) -> Vec<String> {
    let mut numeric: Vec<(u32, &String)> = years
        .iter()
        .filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|y| y.parse().ok().map(|n| (n, y)))
        .collect();
    numeric.sort_by(|a, b| b.0.cmp(&a.0));
    numeric.dedup_by_key(|(n, _)| *n);
    numeric
        .into_iter()
        .take(count)
        .map(|(_, y)| y.clone())
        .collect()
}

fn dedup_preserving_order(items: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}
