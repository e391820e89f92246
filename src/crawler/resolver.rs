//! Subject name resolution
//!
//! The catalog is inconsistent about how it spells subjects in question
//! listings: "Further Mathematics" may only answer as `further-mathematics`.
//! The resolver tries a fixed, ordered set of slug variants for each request
//! and remembers which one worked per subject.

use crate::remote::{CatalogApi, Endpoint, Envelope};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Ordered, deduplicated slug variants of a subject name
///
/// 1. the name unchanged
/// 2. lower-cased
/// 3. whitespace runs replaced by `-`
/// 4. whitespace runs replaced by `_`
/// 5. punctuation removed (keeps word characters, whitespace and `-`)
/// 6. runs of whitespace, `.` and `_` replaced by `-`
///
/// Variants 3 to 6 are lower-cased too.
///
/// ```
/// use exam_harvest::crawler::slug_variants;
///
/// assert_eq!(
///     slug_variants("Further Mathematics"),
///     vec![
///         "Further Mathematics",
///         "further mathematics",
///         "further-mathematics",
///         "further_mathematics",
///     ]
/// );
/// ```
pub fn slug_variants(name: &str) -> Vec<String> {
    let candidates = [
        name.to_string(),
        name.to_lowercase(),
        collapse_runs(name, char::is_whitespace, '-').to_lowercase(),
        collapse_runs(name, char::is_whitespace, '_').to_lowercase(),
        name.chars()
            .filter(|c| is_word_char(*c) || c.is_whitespace() || *c == '-')
            .collect::<String>()
            .to_lowercase(),
        collapse_runs(name, |c| c.is_whitespace() || c == '.' || c == '_', '-').to_lowercase(),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replaces every maximal run of characters matching `is_sep` with `replacement`
fn collapse_runs(input: &str, is_sep: impl Fn(char) -> bool, replacement: char) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars() {
        if is_sep(c) {
            if !in_run {
                out.push(replacement);
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Outcome of resolving one (year, subject, page) request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Raw question items; empty when no variant produced any
    pub records: Vec<Value>,
    /// The variant that produced `records`
    pub matched_variant: Option<String>,
    /// The server reported this page as its last one
    pub last_page: bool,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Tries slug variants until one returns questions
#[derive(Debug, Clone)]
pub struct SubjectResolver {
    variant_delay: Duration,
    remembered: HashMap<String, String>,
}

impl SubjectResolver {
    pub fn new(variant_delay: Duration) -> Self {
        Self {
            variant_delay,
            remembered: HashMap::new(),
        }
    }

    /// The variant that last worked for `subject`
    pub fn remembered(&self, subject: &str) -> Option<&str> {
        self.remembered.get(subject).map(String::as_str)
    }

    /// Variants in the order they will be tried: the remembered one first
    pub fn candidates(&self, subject: &str) -> Vec<String> {
        let mut variants = slug_variants(subject);
        if let Some(known) = self.remembered(subject) {
            if let Some(pos) = variants.iter().position(|v| v == known) {
                let preferred = variants.remove(pos);
                variants.insert(0, preferred);
            }
        }
        variants
    }

    /// Fetches `page` of `subject` for `exam`/`year`
    ///
    /// Errors never escape: "not found" answers are skipped quietly and
    /// anything else is logged before moving to the next variant. An empty
    /// result says nothing about whether the subject is exhausted.
    pub async fn resolve(
        &mut self,
        api: &dyn CatalogApi,
        exam: &str,
        year: &str,
        subject: &str,
        page: u32,
    ) -> Resolution {
        for (attempt, variant) in self.candidates(subject).into_iter().enumerate() {
            if attempt > 0 && !self.variant_delay.is_zero() {
                tokio::time::sleep(self.variant_delay).await;
            }

            let body = json!({
                "exam": exam,
                "exam_year_id": year,
                "subject": variant,
                "page": page,
            });

            let response = match api.call(Endpoint::Questions, &body).await {
                Ok(response) => response,
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    tracing::warn!(
                        "Variant \"{}\" failed for {}/{}/{} page {}: {}",
                        variant,
                        exam,
                        year,
                        subject,
                        page,
                        e
                    );
                    continue;
                }
            };

            let envelope = Envelope::from_response(Endpoint::Questions, &response);
            if envelope.is_empty() {
                continue;
            }

            if variant != subject && self.remembered(subject) != Some(variant.as_str()) {
                tracing::info!(
                    "Subject variant matched: \"{}\" -> \"{}\" ({} page {})",
                    subject,
                    variant,
                    year,
                    page
                );
            }
            self.remembered.insert(subject.to_string(), variant.clone());

            let last_page = envelope.is_last_page();
            return Resolution {
                records: envelope.items,
                matched_variant: Some(variant),
                last_page,
            };
        }

        Resolution::default()
    }
}
