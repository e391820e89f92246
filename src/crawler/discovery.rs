//! Catalog discovery
//!
//! Lists exams, years and subjects through the metadata modes of the catalog
//! API. Every operation degrades to an empty list: the session bootstrap
//! decides what an empty answer means.

use crate::remote::{CatalogApi, Endpoint, Envelope, ParsedResponse};
use serde_json::{json, Value};

/// Object fields that may carry an exam name
const EXAM_FIELDS: &[&str] = &["name", "exam", "title", "code"];

/// Object fields that may carry a year
const YEAR_FIELDS: &[&str] = &["year", "exam_year", "exam_year_id", "name"];

/// Object fields that may carry a subject name
const SUBJECT_FIELDS: &[&str] = &["name", "subject", "title"];

/// Exams the catalog offers
pub async fn list_exams(api: &dyn CatalogApi) -> Vec<String> {
    discover(api, Endpoint::Exams, json!({}), EXAM_FIELDS).await
}

/// Years available for `exam`, in the order the catalog returns them
pub async fn list_years(api: &dyn CatalogApi, exam: &str) -> Vec<String> {
    discover(api, Endpoint::Years, json!({ "exam": exam }), YEAR_FIELDS).await
}

/// Subjects offered for `exam` in `year`
pub async fn list_subjects(api: &dyn CatalogApi, exam: &str, year: &str) -> Vec<String> {
    discover(
        api,
        Endpoint::Subjects,
        json!({ "exam": exam, "exam_year_id": year }),
        SUBJECT_FIELDS,
    )
    .await
}

async fn discover(
    api: &dyn CatalogApi,
    endpoint: Endpoint,
    body: Value,
    fields: &[&str],
) -> Vec<String> {
    let response = match api.call(endpoint, &body).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Discovery via {} failed: {}", endpoint.label(), e);
            return Vec::new();
        }
    };

    if response.is_raw_text() {
        tracing::warn!(
            "Discovery via {} returned a non-JSON body; treating as empty",
            endpoint.label()
        );
        return Vec::new();
    }

    let envelope = Envelope::from_response(endpoint, &response);
    if unexpected_shape(&response, &envelope) {
        tracing::warn!(
            "Discovery via {} returned no list in an unexpected shape; treating as empty",
            endpoint.label()
        );
        return Vec::new();
    }

    let names: Vec<String> = envelope
        .items
        .iter()
        .filter_map(|item| item_name(item, fields))
        .collect();

    if names.len() < envelope.items.len() {
        tracing::debug!(
            "Skipped {} unrecognized entries from {}",
            envelope.items.len() - names.len(),
            endpoint.label()
        );
    }
    names
}

/// A non-null body with no list anywhere we look for one
fn unexpected_shape(response: &ParsedResponse, envelope: &Envelope) -> bool {
    !envelope.has_list && !response.body.is_null()
}

/// Name of one listed entry: a string, a number, or an object field
fn item_name(item: &Value, fields: &[&str]) -> Option<String> {
    match item {
        Value::String(s) => non_blank(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => fields.iter().find_map(|field| match map.get(*field)? {
            Value::String(s) => non_blank(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }),
        _ => None,
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
