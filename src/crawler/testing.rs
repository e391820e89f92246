//! Scripted catalog used by crawler unit tests

use crate::remote::{CatalogApi, Endpoint, ParsedResponse};
use crate::{ApiError, ApiResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// What a scripted endpoint answers with
pub enum ScriptedReply {
    Ok(ParsedResponse),
    Err(ApiError),
}

impl ScriptedReply {
    pub fn json(body: Value) -> Self {
        Self::Ok(ParsedResponse::from_value(body))
    }

    pub fn text(body: &str) -> Self {
        Self::Ok(ParsedResponse::from_text(body))
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::Err(ApiError::Status {
            endpoint: "scripted".to_string(),
            status,
            body: body.to_string(),
        })
    }

    /// A question page in the `data.questions` shape
    pub fn questions(items: Vec<Value>) -> Self {
        Self::json(json!({ "data": { "questions": items } }))
    }

    pub fn empty_page() -> Self {
        Self::questions(Vec::new())
    }
}

type Handler = Box<dyn Fn(&Value) -> ScriptedReply + Send + Sync>;

/// A `CatalogApi` that answers from per-endpoint closures and logs calls
///
/// Endpoints without a handler answer 404.
#[derive(Default)]
pub struct ScriptedApi {
    handlers: Mutex<HashMap<Endpoint, Handler>>,
    calls: Mutex<Vec<(Endpoint, Value)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, endpoint: Endpoint, handler: F)
    where
        F: Fn(&Value) -> ScriptedReply + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap()
            .insert(endpoint, Box::new(handler));
    }

    /// Scripts exam discovery to list `exams`
    pub fn with_exams(self, exams: &[&str]) -> Self {
        let list: Vec<Value> = exams.iter().map(|e| json!(e)).collect();
        self.on(Endpoint::Exams, move |_| ScriptedReply::json(json!({ "data": list.clone() })));
        self
    }

    pub fn calls(&self) -> Vec<(Endpoint, Value)> {
        self.calls.lock().unwrap().clone()
    }

    /// Bodies of every question listing call, in order
    pub fn question_calls(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(endpoint, _)| *endpoint == Endpoint::Questions)
            .map(|(_, body)| body)
            .collect()
    }
}

#[async_trait]
impl CatalogApi for ScriptedApi {
    async fn call(&self, endpoint: Endpoint, body: &Value) -> ApiResult<ParsedResponse> {
        self.calls.lock().unwrap().push((endpoint, body.clone()));
        let reply = match self.handlers.lock().unwrap().get(&endpoint) {
            Some(handler) => handler(body),
            None => ScriptedReply::status(404, "not found"),
        };
        match reply {
            ScriptedReply::Ok(response) => Ok(response),
            ScriptedReply::Err(e) => Err(e),
        }
    }
}

/// A raw question item with the given text
pub fn question(text: &str) -> Value {
    json!({ "question": text, "options": ["A", "B", "C", "D"], "answer": "A" })
}
