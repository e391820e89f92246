use crate::state::SubjectPointer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Traversal state for one exam
///
/// This is the part of a checkpoint that says where every subject stands.
/// Subjects are kept in a stable order so rounds visit them the same way
/// before and after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub exam: String,

    /// Candidate years, in traversal order
    #[serde(default)]
    pub years: Vec<String>,

    /// Canonical subject names
    #[serde(default)]
    pub subjects: Vec<String>,

    /// One pointer per subject
    #[serde(default, rename = "ptr")]
    pub pointers: BTreeMap<String, SubjectPointer>,

    /// Per-subject quota in force when this snapshot was taken
    #[serde(default)]
    pub quota: u32,

    /// Set by the final save of a completed run
    #[serde(default)]
    pub done: bool,
}

impl Session {
    /// A fresh session with every subject at year 0, page 1
    pub fn new(exam: impl Into<String>, years: Vec<String>, subjects: Vec<String>) -> Self {
        let mut session = Self {
            exam: exam.into(),
            years,
            subjects,
            pointers: BTreeMap::new(),
            quota: 0,
            done: false,
        };
        session.ensure_pointers();
        session
    }

    /// Initializes pointers for subjects that lack one; returns how many
    pub fn ensure_pointers(&mut self) -> usize {
        let mut added = 0;
        for subject in &self.subjects {
            if !self.pointers.contains_key(subject) {
                self.pointers.insert(subject.clone(), SubjectPointer::new());
                added += 1;
            }
        }
        added
    }

    /// Appends subjects not yet tracked and gives them pointers
    pub fn add_subjects<I, S>(&mut self, subjects: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = Vec::new();
        for subject in subjects {
            let subject = subject.into();
            if !self.subjects.contains(&subject) {
                self.subjects.push(subject.clone());
                added.push(subject);
            }
        }
        self.ensure_pointers();
        added
    }

    pub fn pointer(&self, subject: &str) -> Option<&SubjectPointer> {
        self.pointers.get(subject)
    }

    pub fn pointer_mut(&mut self, subject: &str) -> Option<&mut SubjectPointer> {
        self.pointers.get_mut(subject)
    }

    /// True when every subject met `quota` or is exhausted
    pub fn all_settled(&self, quota: u32) -> bool {
        self.subjects.iter().all(|s| {
            self.pointers
                .get(s)
                .map_or(true, |p| p.exhausted || p.has_reached(quota))
        })
    }

    /// Highest collected counter across subjects
    pub fn max_collected(&self) -> u32 {
        self.pointers.values().map(|p| p.collected).max().unwrap_or(0)
    }

    pub fn exhausted_count(&self) -> usize {
        self.pointers.values().filter(|p| p.exhausted).count()
    }
}
