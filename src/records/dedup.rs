use crate::records::normalize::dedup_key;
use crate::records::{Record, RecordContext};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// First-write-wins store of unique records
///
/// Records keep their insertion order so exports are stable between runs of
/// the same checkpoint.
#[derive(Debug, Default, Clone)]
pub struct DedupStore {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store from previously collected records
    ///
    /// Later duplicates in `records` are dropped, as they would have been on
    /// first collection.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Maps `raw` with `ctx` and inserts it; returns whether it was new
    pub fn submit(&mut self, ctx: &RecordContext<'_>, raw: &Value) -> bool {
        self.insert(Record::from_raw(raw, ctx))
    }

    /// Inserts an already-mapped record; returns whether it was new
    pub fn insert(&mut self, record: Record) -> bool {
        let key = dedup_key(&record.subject, &record.question);
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.records.len());
        self.records.push(record);
        true
    }

    pub fn contains(&self, subject: &str, question: &str) -> bool {
        self.index.contains_key(&dedup_key(subject, question))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Unique records attributed to `subject`
    pub fn count_for(&self, subject: &str) -> usize {
        self.records.iter().filter(|r| r.subject == subject).count()
    }

    /// Groups records by subject
    ///
    /// Every name in `subjects` gets an entry, even with no records; records
    /// whose subject is not listed still get their own entry.
    pub fn group_by_subject(&self, subjects: &[String]) -> BTreeMap<String, Vec<Record>> {
        let mut groups: BTreeMap<String, Vec<Record>> = subjects
            .iter()
            .map(|s| (s.clone(), Vec::new()))
            .collect();
        for record in &self.records {
            groups
                .entry(record.subject.clone())
                .or_default()
                .push(record.clone());
        }
        groups
    }
}
