//! Collected records and their deduplication
//!
//! - `Record`: the canonical question shape, mapped once from raw API items
//! - `DedupStore`: first-write-wins store keyed on subject + normalized text
//! - `normalize_text` / `dedup_key`: the key derivation

mod dedup;
mod normalize;
mod record;

pub use dedup::DedupStore;
pub use normalize::{dedup_key, normalize_text, MAX_KEY_CHARS};
pub use record::{Record, RecordContext};
