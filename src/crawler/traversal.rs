//! Per-subject traversal step
//!
//! One step moves a single subject's pointer forward by exactly one remote
//! page request (or none, when it discovers the subject is exhausted):
//!
//! | Pointer | Resolver result | Transition |
//! |---------|-----------------|------------|
//! | past the last year | not called | mark exhausted |
//! | on a year | empty | next year, page 1 |
//! | on a year | records | insert up to quota, next page |
//! | on a year | records, last page (`honor-pagination`) | insert up to quota, next year |

use crate::crawler::SubjectResolver;
use crate::records::{DedupStore, RecordContext};
use crate::remote::CatalogApi;
use crate::state::{PointerState, Session};
use std::time::Duration;

/// Knobs that stay fixed for a whole harvest
#[derive(Debug, Clone)]
pub struct TraversalSettings {
    pub exam: String,
    /// Per-subject quota
    pub quota: u32,
    /// Pause after every step that hit the API
    pub polite_delay: Duration,
    pub honor_pagination: bool,
}

/// What a single step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The pointer ran off the year list; no request was made
    Exhausted,
    /// The page was empty; the pointer moved to the next year
    AdvancedYear,
    /// The page had questions; `inserted` of them were new
    Collected { inserted: u32 },
}

impl StepOutcome {
    /// Whether this step issued a question listing request
    pub fn fetched(&self) -> bool {
        !matches!(self, Self::Exhausted)
    }

    pub fn inserted(&self) -> u32 {
        match self {
            Self::Collected { inserted } => *inserted,
            _ => 0,
        }
    }
}

/// Advances `subject` by one step
pub async fn step(
    api: &dyn CatalogApi,
    resolver: &mut SubjectResolver,
    store: &mut DedupStore,
    session: &mut Session,
    subject: &str,
    settings: &TraversalSettings,
) -> StepOutcome {
    let (year, page) = {
        let pointer = session.pointers.entry(subject.to_string()).or_default();
        match pointer.state() {
            PointerState::Exhausted => return StepOutcome::Exhausted,
            PointerState::Active if pointer.is_past_end(session.years.len()) => {
                pointer.mark_exhausted();
                tracing::debug!(
                    "{} is now {} after {} years",
                    subject,
                    pointer.state(),
                    session.years.len()
                );
                return StepOutcome::Exhausted;
            }
            PointerState::Active => (session.years[pointer.year_index].clone(), pointer.page),
        }
    };

    let resolution = resolver
        .resolve(api, &settings.exam, &year, subject, page)
        .await;

    let pointer = session.pointers.entry(subject.to_string()).or_default();
    let outcome = if resolution.is_empty() {
        tracing::debug!("{} {} page {}: no questions, moving to next year", subject, year, page);
        pointer.advance_year();
        StepOutcome::AdvancedYear
    } else {
        let ctx = RecordContext {
            exam: &settings.exam,
            year: &year,
            subject,
            page,
            variant: resolution.matched_variant.as_deref().unwrap_or(subject),
        };

        let mut inserted = 0;
        for raw in &resolution.records {
            if pointer.has_reached(settings.quota) {
                break;
            }
            if store.submit(&ctx, raw) {
                pointer.record_insert();
                inserted += 1;
            }
        }

        tracing::debug!(
            "{} {} page {}: {} items, {} new, {}/{} collected",
            subject,
            year,
            page,
            resolution.records.len(),
            inserted,
            pointer.collected,
            settings.quota
        );

        if settings.honor_pagination && resolution.last_page {
            pointer.advance_year();
        } else {
            pointer.advance_page();
        }
        StepOutcome::Collected { inserted }
    };

    if !settings.polite_delay.is_zero() {
        tokio::time::sleep(settings.polite_delay).await;
    }
    outcome
}
