use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a raw item was fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContext<'a> {
    pub exam: &'a str,
    pub year: &'a str,
    /// Canonical subject name, never the resolved slug
    pub subject: &'a str,
    pub page: u32,
    /// Slug variant that produced this page
    pub variant: &'a str,
}

/// One collected exam question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Catalog identifier, when the API provides one
    #[serde(default)]
    pub source_id: Option<String>,
    pub exam: String,
    pub year: String,
    pub subject: String,
    pub question: String,
    /// Options exactly as returned (list or keyed object)
    #[serde(default)]
    pub options: Option<Value>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    pub fetched_page: u32,
    pub subject_variant: String,
}

impl Record {
    /// Maps one raw catalog item into the canonical shape
    ///
    /// Field fallbacks: `question_text` then `question`; `correct_answer` then
    /// `answer`. Scalars are stringified; missing text becomes empty.
    pub fn from_raw(raw: &Value, ctx: &RecordContext<'_>) -> Self {
        Self {
            source_id: scalar_field(raw, &["id", "question_id"]),
            exam: ctx.exam.to_string(),
            year: ctx.year.to_string(),
            subject: ctx.subject.to_string(),
            question: scalar_field(raw, &["question_text", "question"]).unwrap_or_default(),
            options: raw
                .get("options")
                .filter(|v| !v.is_null())
                .cloned(),
            answer: scalar_field(raw, &["correct_answer", "answer"]),
            explanation: scalar_field(raw, &["explanation"]),
            fetched_page: ctx.page,
            subject_variant: ctx.variant.to_string(),
        }
    }

    /// Options serialized as compact JSON, for flat exports
    pub fn options_json(&self) -> Option<String> {
        self.options.as_ref().map(Value::to_string)
    }
}

/// First present, non-null scalar among `keys`, as a string
fn scalar_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}
