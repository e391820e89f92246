//! Per-subject traversal pointer
//!
//! A pointer walks `years[year_index]` page by page. It only ever moves
//! forward: pages within a year, then to the next year at page 1, then into
//! the terminal exhausted state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a subject pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerState {
    /// More (year, page) positions remain to be fetched
    Active,

    /// Every configured year has been walked; terminal
    Exhausted,
}

impl fmt::Display for PointerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Position and progress of one subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPointer {
    /// Index into the session's year list
    #[serde(default)]
    pub year_index: usize,

    /// 1-based page within the current year
    #[serde(default = "first_page")]
    pub page: u32,

    /// Unique records attributed to this subject
    #[serde(default)]
    pub collected: u32,

    /// Terminal once set
    #[serde(default)]
    pub exhausted: bool,
}

fn first_page() -> u32 {
    1
}

impl SubjectPointer {
    /// A pointer at the first page of the first year
    pub fn new() -> Self {
        Self {
            year_index: 0,
            page: 1,
            collected: 0,
            exhausted: false,
        }
    }

    pub fn state(&self) -> PointerState {
        if self.exhausted {
            PointerState::Exhausted
        } else {
            PointerState::Active
        }
    }

    /// True when no year remains at the current index
    pub fn is_past_end(&self, year_count: usize) -> bool {
        self.year_index >= year_count
    }

    pub fn has_reached(&self, quota: u32) -> bool {
        self.collected >= quota
    }

    /// Whether this subject should be stepped again this round
    pub fn wants_more(&self, quota: u32) -> bool {
        !self.exhausted && !self.has_reached(quota)
    }

    /// Moves to the next page of the current year
    pub fn advance_page(&mut self) {
        self.page += 1;
    }

    /// Moves to page 1 of the next year
    pub fn advance_year(&mut self) {
        self.year_index += 1;
        self.page = 1;
    }

    /// Enters the terminal state
    pub fn mark_exhausted(&mut self) {
        self.exhausted = true;
    }

    /// Counts one newly inserted record
    pub fn record_insert(&mut self) {
        self.collected += 1;
    }
}

impl Default for SubjectPointer {
    fn default() -> Self {
        Self::new()
    }
}
