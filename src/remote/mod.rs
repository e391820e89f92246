//! Remote catalog client
//!
//! This module contains everything that talks to the catalog API:
//! - [`Endpoint`] selects the metadata mode or the question listing
//! - [`RetryPolicy`] retries transient network failures with linear backoff
//! - [`Envelope`] normalizes the API's several response shapes
//! - [`HttpCatalogClient`] is the reqwest-backed [`CatalogApi`] implementation

mod client;
mod response;
mod retry;

pub use client::{build_http_client, HttpCatalogClient};
pub use response::{Envelope, ParsedResponse};
pub use retry::RetryPolicy;

use crate::ApiResult;
use async_trait::async_trait;
use serde_json::Value;

/// Which flavour of the single catalog endpoint to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `?get=exam`, body `{}`
    Exams,
    /// `?get=exam_year_id`, body `{exam}`
    Years,
    /// `?get=subject`, body `{exam, exam_year_id}`
    Subjects,
    /// No selector, body `{exam, exam_year_id, subject, page}`
    Questions,
}

impl Endpoint {
    /// Value of the `get` query parameter, if any
    pub fn selector(&self) -> Option<&'static str> {
        match self {
            Self::Exams => Some("exam"),
            Self::Years => Some("exam_year_id"),
            Self::Subjects => Some("subject"),
            Self::Questions => None,
        }
    }

    /// Short label used in logs and errors
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exams => "get=exam",
            Self::Years => "get=exam_year_id",
            Self::Subjects => "get=subject",
            Self::Questions => "questions",
        }
    }
}

/// The catalog API as the rest of the crate sees it
///
/// `HttpCatalogClient` is the production implementation; tests drive the
/// crawler through scripted implementations of this trait.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Issues one logical call, retries included
    async fn call(&self, endpoint: Endpoint, body: &Value) -> ApiResult<ParsedResponse>;
}
