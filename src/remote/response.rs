//! Response normalization
//!
//! The catalog returns its payload under `data`, under a mode-specific key,
//! or as the bare body. [`Envelope`] probes those shapes once, at the client
//! boundary, so discovery and resolution only ever see a flat item list.

use crate::remote::Endpoint;
use serde_json::{Map, Value};

/// Key used when a success body is not valid JSON
pub const RAW_TEXT_KEY: &str = "rawText";

/// A successful response body, parsed as JSON
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub body: Value,
}

impl ParsedResponse {
    /// Parses raw body text; unparseable text is wrapped as `{"rawText": ...}`
    pub fn from_text(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self { body: Value::Null };
        }
        let body = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(_) => {
                let mut wrapped = Map::new();
                wrapped.insert(RAW_TEXT_KEY.to_string(), Value::String(text.to_string()));
                Value::Object(wrapped)
            }
        };
        Self { body }
    }

    pub fn from_value(body: Value) -> Self {
        Self { body }
    }

    /// True when the body was not JSON and got wrapped
    pub fn is_raw_text(&self) -> bool {
        self.body
            .as_object()
            .map_or(false, |o| o.len() == 1 && o.contains_key(RAW_TEXT_KEY))
    }
}

/// The canonical shape every response is mapped into
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    /// The list payload (exams, years, subjects or questions)
    pub items: Vec<Value>,
    /// Page number the server says it returned
    pub current_page: Option<u64>,
    /// Total pages the server says exist
    pub total_pages: Option<u64>,
    /// Whether any probed location held a list, even an empty one
    pub has_list: bool,
}

impl Envelope {
    /// Maps a response into the canonical envelope for `endpoint`
    pub fn from_response(endpoint: Endpoint, response: &ParsedResponse) -> Self {
        let body = &response.body;
        let list = candidate_paths(endpoint)
            .iter()
            .find_map(|path| lookup(body, path).and_then(Value::as_array));
        let has_list = list.is_some();
        let items = list.cloned().unwrap_or_default();

        let pagination = body
            .get("data")
            .and_then(|d| d.get("pagination"))
            .or_else(|| body.get("pagination"));

        Self {
            items,
            current_page: pagination.and_then(|p| as_u64(p.get("current_page"))),
            total_pages: pagination.and_then(|p| as_u64(p.get("total_pages"))),
            has_list,
        }
    }

    /// Whether the server reported this page as its last one
    pub fn is_last_page(&self) -> bool {
        match (self.current_page, self.total_pages) {
            (Some(current), Some(total)) => current >= total,
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

const EXAM_PATHS: &[&[&str]] = &[&["data"], &["exams"], &[]];
const YEAR_PATHS: &[&[&str]] = &[&["data"], &["exam_years"], &["years"], &[]];
const SUBJECT_PATHS: &[&[&str]] = &[&["data"], &["subjects"], &[]];
const QUESTION_PATHS: &[&[&str]] = &[&["data", "questions"], &["questions"], &["data"], &[]];

/// Places to look for the list payload, most specific first
fn candidate_paths(endpoint: Endpoint) -> &'static [&'static [&'static str]] {
    match endpoint {
        Endpoint::Exams => EXAM_PATHS,
        Endpoint::Years => YEAR_PATHS,
        Endpoint::Subjects => SUBJECT_PATHS,
        Endpoint::Questions => QUESTION_PATHS,
    }
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Pagination fields arrive as numbers or numeric strings
fn as_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
