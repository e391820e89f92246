//! HTTP implementation of the catalog API
//!
//! Every call is a POST with a bearer credential and a JSON body. Metadata
//! modes add `?get=<mode>` to the base URL. Error classification:
//!
//! | Condition | Result |
//! |-----------|--------|
//! | 2xx, JSON body | `ParsedResponse` with the parsed value |
//! | 2xx, other body | `ParsedResponse` wrapping `{"rawText": ...}` |
//! | non-2xx | `ApiError::Status`, not retried |
//! | connect/timeout/reset | `ApiError::Network`, retried by the policy |

use crate::config::Config;
use crate::remote::{CatalogApi, Endpoint, ParsedResponse, RetryPolicy};
use crate::{ApiError, ApiResult, ConfigError};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Builds the shared HTTP client
///
/// The client only carries a connect timeout; a slow answer is waited for.
pub fn build_http_client(connect_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("exam-harvest/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(connect_timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed catalog client
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: Url,
    api_key: String,
    retry: RetryPolicy,
}

impl HttpCatalogClient {
    /// Creates a client against `base_url` with an explicit retry policy
    pub fn new(
        client: Client,
        base_url: Url,
        api_key: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key: api_key.into(),
            retry,
        }
    }

    /// Creates a client from the validated configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.api.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
        let client = build_http_client(Duration::from_secs(config.api.connect_timeout_secs))
            .map_err(|e| ConfigError::Validation(format!("Cannot build HTTP client: {}", e)))?;
        Ok(Self::new(
            client,
            base_url,
            config.api_key(),
            RetryPolicy::from_config(&config.retry),
        ))
    }

    /// URL for an endpoint, with the `get` selector when needed
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Url {
        let mut url = self.base_url.clone();
        if let Some(selector) = endpoint.selector() {
            url.query_pairs_mut().append_pair("get", selector);
        }
        url
    }

    /// One attempt, no retry
    async fn send_once(&self, endpoint: Endpoint, url: &Url, body: &Value) -> ApiResult<ParsedResponse> {
        let label = endpoint.label();
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(body)
            .send()
            .await
            .map_err(|e| classify_transport_error(label, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify_transport_error(label, e))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: label.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(ParsedResponse::from_text(&text))
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn call(&self, endpoint: Endpoint, body: &Value) -> ApiResult<ParsedResponse> {
        let url = self.endpoint_url(endpoint);
        tracing::debug!(endpoint = endpoint.label(), %body, "POST {}", url);
        self.retry
            .run(endpoint.label(), || self.send_once(endpoint, &url, body))
            .await
    }
}

/// Maps reqwest failures onto the transient/non-transient split
fn classify_transport_error(endpoint: &str, e: reqwest::Error) -> ApiError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        ApiError::Network {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        }
    } else {
        ApiError::Request {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        }
    }
}
