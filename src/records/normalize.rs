//! Content normalization for deduplication keys

/// Longest normalized question text kept in a key, in characters
pub const MAX_KEY_CHARS: usize = 1000;

/// Collapses whitespace runs, trims, folds case, truncates to [`MAX_KEY_CHARS`]
///
/// # Examples
///
/// ```
/// use exam_harvest::records::normalize_text;
///
/// assert_eq!(normalize_text("  What IS\n\tthis? "), "what is this?");
/// ```
pub fn normalize_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase().chars().take(MAX_KEY_CHARS).collect()
}

/// Deduplication key: `subject::normalize(question)`
pub fn dedup_key(subject: &str, question: &str) -> String {
    format!("{}::{}", subject, normalize_text(question))
}
