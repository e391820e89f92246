//! Harvest coordinator - the round loop
//!
//! This module contains the quota controller that drives every subject's
//! traversal, including:
//! - Deriving the per-subject quota
//! - Running rounds until nothing new turns up or every subject is settled
//! - Periodic, end-of-round and final checkpoint saves
//! - Building the run report

use crate::config::Config;
use crate::crawler::traversal::{step, StepOutcome, TraversalSettings};
use crate::crawler::SubjectResolver;
use crate::records::DedupStore;
use crate::remote::CatalogApi;
use crate::state::Session;
use crate::storage::{CheckpointManager, CheckpointStore};
use crate::{ConfigError, ConfigResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-subject quota for `subject_count` subjects
///
/// An explicit per-subject target wins; otherwise the global target is split
/// evenly, rounding up.
pub fn derive_quota(config: &Config, subject_count: usize) -> ConfigResult<u32> {
    let collection = &config.collection;
    if let Some(per_subject) = collection.per_subject_target {
        return Ok(per_subject);
    }
    let target = collection.target.ok_or(ConfigError::NoQuota)?;
    let count = u32::try_from(subject_count.max(1)).unwrap_or(u32::MAX);
    Ok(target.div_ceil(count))
}

/// Quota for `session`, never below what it already holds
///
/// A resumed session keeps its saved quota when the derived one is lower
/// (more subjects under the same global target), so no subject ends up with
/// more records than its quota.
pub fn session_quota(config: &Config, session: &Session) -> ConfigResult<u32> {
    let derived = derive_quota(config, session.subjects.len())?;
    let floor = session.quota.max(session.max_collected());
    if derived < floor {
        tracing::warn!(
            "Derived quota {} for {} subjects is below the saved quota {}; keeping {}",
            derived,
            session.subjects.len(),
            floor,
            floor
        );
        return Ok(floor);
    }
    Ok(derived)
}

/// Summary of a harvest, printed at the end of a run and by `--stats`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestReport {
    pub exam: String,
    pub quota: u32,
    pub rounds: u32,
    pub pages_fetched: u64,
    pub total_records: usize,
    pub per_subject: BTreeMap<String, usize>,
    pub exhausted_subjects: usize,
    pub done: bool,
}

impl HarvestReport {
    /// Builds a report from a session and its records
    pub fn from_session(session: &Session, store: &DedupStore, rounds: u32, pages_fetched: u64) -> Self {
        let per_subject = session
            .subjects
            .iter()
            .map(|s| (s.clone(), store.count_for(s)))
            .collect();
        Self {
            exam: session.exam.clone(),
            quota: session.quota,
            rounds,
            pages_fetched,
            total_records: store.len(),
            per_subject,
            exhausted_subjects: session.exhausted_count(),
            done: session.done,
        }
    }

    /// Subjects that reached the quota
    pub fn subjects_at_quota(&self) -> usize {
        self.per_subject
            .values()
            .filter(|&&count| self.quota > 0 && count >= self.quota as usize)
            .count()
    }
}

/// Main harvest coordinator structure
pub struct Coordinator<S> {
    api: Arc<dyn CatalogApi>,
    session: Session,
    store: DedupStore,
    resolver: SubjectResolver,
    checkpoints: CheckpointManager<S>,
    settings: TraversalSettings,
    checkpoint_pages: u64,
    max_pages_per_round: u32,
    pages_fetched: u64,
    rounds: u32,
}

impl<S: CheckpointStore> Coordinator<S> {
    /// Creates a coordinator over a bootstrapped or resumed session
    ///
    /// # Arguments
    ///
    /// * `api` - The catalog to fetch questions from
    /// * `config` - The validated configuration
    /// * `session` - Traversal state; pointers are initialized for any subject lacking one
    /// * `store` - Previously collected records, if resuming
    /// * `checkpoints` - Where snapshots are written
    /// * `pages_fetched` - Page counter carried over from a checkpoint
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ConfigError::NoQuota)` - Neither target is configured
    pub fn new(
        api: Arc<dyn CatalogApi>,
        config: &Config,
        mut session: Session,
        store: DedupStore,
        checkpoints: CheckpointManager<S>,
        pages_fetched: u64,
    ) -> ConfigResult<Self> {
        let collection = &config.collection;
        session.ensure_pointers();
        session.quota = session_quota(config, &session)?;

        let settings = TraversalSettings {
            exam: session.exam.clone(),
            quota: session.quota,
            polite_delay: Duration::from_millis(collection.polite_delay_ms),
            honor_pagination: collection.honor_pagination,
        };

        Ok(Self {
            api,
            session,
            store,
            resolver: SubjectResolver::new(Duration::from_millis(collection.variant_delay_ms)),
            checkpoints,
            settings,
            checkpoint_pages: collection.checkpoint_pages.max(1),
            max_pages_per_round: collection.max_pages_per_round.max(1),
            pages_fetched,
            rounds: 0,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    pub fn quota(&self) -> u32 {
        self.settings.quota
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Snapshot of the current state
    pub fn save_checkpoint(&self) -> bool {
        self.checkpoints
            .save(&self.session, self.store.records(), self.pages_fetched)
    }

    pub fn report(&self) -> HarvestReport {
        HarvestReport::from_session(&self.session, &self.store, self.rounds, self.pages_fetched)
    }

    /// Runs rounds until the harvest settles
    ///
    /// A round steps every subject that is neither exhausted nor at quota.
    /// The loop stops after a round that inserted nothing new, or once every
    /// subject is settled. The session is then marked done and saved.
    pub async fn run(&mut self) -> HarvestReport {
        if self.session.done {
            tracing::info!(
                "Checkpoint for {} is already complete ({} records); skipping traversal",
                self.session.exam,
                self.store.len()
            );
            return self.report();
        }

        tracing::info!(
            "Harvesting {}: {} subjects, {} years, quota {} per subject",
            self.session.exam,
            self.session.subjects.len(),
            self.session.years.len(),
            self.settings.quota
        );

        let start_time = Instant::now();
        loop {
            self.rounds += 1;
            tracing::info!(
                "Round {}: {} records collected so far",
                self.rounds,
                self.store.len()
            );

            let inserted = self.run_round().await;
            self.save_checkpoint();

            if inserted == 0 {
                tracing::info!("No new questions in round {}, stopping", self.rounds);
                break;
            }
            if self.session.all_settled(self.settings.quota) {
                tracing::info!("Every subject reached its quota or was exhausted");
                break;
            }
        }

        self.session.done = true;
        self.save_checkpoint();

        tracing::info!(
            "Harvest finished: {} records in {} rounds, {} pages fetched in {:?}",
            self.store.len(),
            self.rounds,
            self.pages_fetched,
            start_time.elapsed()
        );
        self.report()
    }

    /// One pass over every subject; returns how many records were new
    async fn run_round(&mut self) -> u64 {
        let mut inserted_total = 0u64;
        let subjects = self.session.subjects.clone();

        for subject in &subjects {
            let mut steps = 0u32;
            while self.wants_more(subject) {
                if steps >= self.max_pages_per_round {
                    tracing::debug!(
                        "{} hit the per-round cap of {} pages; continuing next round",
                        subject,
                        self.max_pages_per_round
                    );
                    break;
                }

                let outcome = step(
                    self.api.as_ref(),
                    &mut self.resolver,
                    &mut self.store,
                    &mut self.session,
                    subject,
                    &self.settings,
                )
                .await;

                if outcome.fetched() {
                    steps += 1;
                    self.pages_fetched += 1;
                    if self.pages_fetched % self.checkpoint_pages == 0 {
                        self.save_checkpoint();
                        tracing::info!("Checkpoint saved at {} pages", self.pages_fetched);
                    }
                }
                inserted_total += u64::from(outcome.inserted());

                if outcome == StepOutcome::Exhausted {
                    break;
                }
            }
        }

        inserted_total
    }

    fn wants_more(&self, subject: &str) -> bool {
        self.session
            .pointer(subject)
            .map_or(true, |p| p.wants_more(self.settings.quota))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectionConfig;
    use crate::crawler::testing::{question, ScriptedApi, ScriptedReply};
    use crate::remote::Endpoint;
    use crate::storage::{open_checkpoints, JsonFileStore};
    use serde_json::Value;
    use tempfile::TempDir;

    fn config(per_subject: Option<u32>, target: Option<u32>) -> Config {
        let mut collection = CollectionConfig::new("JAMB");
        collection.per_subject_target = per_subject;
        collection.target = target;
        collection.polite_delay_ms = 0;
        collection.variant_delay_ms = 0;
        Config {
            api: Default::default(),
            collection,
            retry: Default::default(),
            output: Default::default(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn coordinator(
        api: &Arc<ScriptedApi>,
        config: &Config,
        session: Session,
        dir: &TempDir,
    ) -> Coordinator<JsonFileStore> {
        Coordinator::new(
            api.clone(),
            config,
            session,
            DedupStore::new(),
            open_checkpoints(&dir.path().join("checkpoint.json")),
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_derive_quota() {
        assert_eq!(derive_quota(&config(Some(7), Some(100)), 3).unwrap(), 7);
        assert_eq!(derive_quota(&config(None, Some(100)), 3).unwrap(), 34);
        assert_eq!(derive_quota(&config(None, Some(10)), 0).unwrap(), 10);
        assert!(matches!(
            derive_quota(&config(None, None), 3),
            Err(ConfigError::NoQuota)
        ));
    }

    #[test]
    fn test_session_quota_never_drops_below_saved_state() {
        let mut session = Session::new("JAMB", Vec::new(), strings(&["a", "b", "c"]));
        assert_eq!(session_quota(&config(None, Some(10)), &session).unwrap(), 4);

        session.quota = 5;
        assert_eq!(session_quota(&config(None, Some(10)), &session).unwrap(), 5);

        session.quota = 0;
        session.pointer_mut("a").unwrap().collected = 6;
        assert_eq!(session_quota(&config(None, Some(10)), &session).unwrap(), 6);

        assert_eq!(session_quota(&config(Some(20), None), &session).unwrap(), 20);
    }

    #[tokio::test]
    async fn test_two_distinct_questions_fill_quota_without_touching_older_years() {
        let api = Arc::new(ScriptedApi::new());
        api.on(Endpoint::Questions, |body| {
            if body["exam_year_id"] == "2023" && body["page"] == 1 {
                ScriptedReply::questions(vec![question("What is 1 + 1?"), question("What is 2 * 3?")])
            } else {
                ScriptedReply::empty_page()
            }
        });
        let dir = TempDir::new().unwrap();
        let session = Session::new("JAMB", strings(&["2023", "2022"]), strings(&["mathematics"]));
        let mut coordinator = coordinator(&api, &config(Some(2), None), session, &dir);

        let report = coordinator.run().await;

        assert_eq!(report.total_records, 2);
        let pointer = coordinator.session().pointer("mathematics").unwrap();
        assert_eq!(pointer.collected, 2);
        assert!(!pointer.exhausted);
        assert!(api
            .question_calls()
            .iter()
            .all(|body| body["exam_year_id"] == "2023"));
        assert_eq!(api.question_calls().len(), 1);
        assert!(report.done);
    }

    #[tokio::test]
    async fn test_always_empty_catalog_stops_after_one_round() {
        let api = Arc::new(ScriptedApi::new());
        api.on(Endpoint::Questions, |_| ScriptedReply::empty_page());
        let dir = TempDir::new().unwrap();
        let session = Session::new("JAMB", strings(&["2023", "2022"]), strings(&["physics", "chemistry"]));
        let mut coordinator = coordinator(&api, &config(Some(5), None), session, &dir);

        let report = coordinator.run().await;

        assert_eq!(report.rounds, 1);
        assert_eq!(report.total_records, 0);
        assert_eq!(report.exhausted_subjects, 2);
        // one request per (subject, year)
        assert_eq!(api.question_calls().len(), 4);
    }

    #[tokio::test]
    async fn test_exhausted_subject_is_never_queried_again() {
        let api = Arc::new(ScriptedApi::new());
        api.on(Endpoint::Questions, |body| {
            let page = body["page"].as_u64().unwrap();
            if body["subject"] == "english" && body["exam_year_id"] == "2023" && page <= 3 {
                let items = (0..2).map(|i| question(&format!("english {} {}", page, i))).collect();
                ScriptedReply::questions(items)
            } else {
                ScriptedReply::empty_page()
            }
        });
        let dir = TempDir::new().unwrap();
        let session = Session::new("JAMB", strings(&["2023", "2022"]), strings(&["biology", "english"]));
        let mut config = config(Some(100), None);
        config.collection.max_pages_per_round = 2;
        let mut coordinator = coordinator(&api, &config, session, &dir);

        let report = coordinator.run().await;

        let biology_calls = api
            .question_calls()
            .iter()
            .filter(|body| body["subject"] == "biology")
            .count();
        assert_eq!(biology_calls, 2);
        assert!(coordinator.session().pointer("biology").unwrap().exhausted);
        assert_eq!(report.per_subject["english"], 6);
        assert!(report.rounds >= 2);
    }

    #[tokio::test]
    async fn test_collected_never_exceeds_quota() {
        let api = Arc::new(ScriptedApi::new());
        api.on(Endpoint::Questions, |body| {
            let page = body["page"].as_u64().unwrap();
            let subject = body["subject"].as_str().unwrap().to_string();
            let items: Vec<Value> = (0..4)
                .map(|i| question(&format!("{} {} {}", subject, page, i)))
                .collect();
            ScriptedReply::questions(items)
        });
        let dir = TempDir::new().unwrap();
        let session = Session::new("JAMB", strings(&["2023"]), strings(&["a", "b", "c"]));
        let mut coordinator = coordinator(&api, &config(None, Some(10)), session, &dir);

        let report = coordinator.run().await;

        assert_eq!(report.quota, 4);
        for pointer in coordinator.session().pointers.values() {
            assert!(pointer.collected <= 4);
        }
        assert_eq!(report.total_records, 12);
        assert_eq!(report.subjects_at_quota(), 3);
    }

    #[tokio::test]
    async fn test_checkpoints_written_periodically_and_at_end() {
        let api = Arc::new(ScriptedApi::new());
        api.on(Endpoint::Questions, |body| {
            let page = body["page"].as_u64().unwrap();
            if page <= 5 {
                ScriptedReply::questions(vec![question(&format!("Q{}", page))])
            } else {
                ScriptedReply::empty_page()
            }
        });
        let dir = TempDir::new().unwrap();
        let session = Session::new("JAMB", strings(&["2023"]), strings(&["physics"]));
        let mut config = config(Some(50), None);
        config.collection.checkpoint_pages = 2;
        let mut coordinator = coordinator(&api, &config, session, &dir);

        coordinator.run().await;

        let saved = open_checkpoints(&dir.path().join("checkpoint.json"))
            .load()
            .unwrap();
        assert!(saved.state.done);
        assert_eq!(saved.items.len(), 5);
        assert_eq!(saved.pages_fetched, 6);
        assert_eq!(saved.state.quota, 50);
    }

    #[tokio::test]
    async fn test_done_session_is_not_traversed() {
        let api = Arc::new(ScriptedApi::new());
        let dir = TempDir::new().unwrap();
        let mut session = Session::new("JAMB", strings(&["2023"]), strings(&["physics"]));
        session.done = true;
        let mut coordinator = coordinator(&api, &config(Some(5), None), session, &dir);

        let report = coordinator.run().await;

        assert!(report.done);
        assert_eq!(report.rounds, 0);
        assert!(api.calls().is_empty());
    }
}
