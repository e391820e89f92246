//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `SubjectPointer`: where one subject stands (year, page, collected, exhausted)
//! - `PointerState`: the pointer's lifecycle state (active or exhausted)
//! - `Session`: years, subjects and every subject's pointer for one exam

mod pointer;
mod session;

// Re-export main types
pub use pointer::{PointerState, SubjectPointer};
pub use session::Session;
