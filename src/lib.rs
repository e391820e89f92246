//! Exam-Harvest: a resumable, quota-bounded exam question collector
//!
//! This crate walks a paginated catalog API exam → year → subject → page,
//! deduplicates the questions it finds, and checkpoints its traversal state so
//! an interrupted run picks up where it stopped.

pub mod config;
pub mod crawler;
pub mod output;
pub mod records;
pub mod remote;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Exam-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Exam \"{exam}\" is not available from the API (available: {})", available.join(", "))]
    ExamNotFound { exam: String, available: Vec<String> },

    #[error("No years available for exam \"{exam}\", cannot continue")]
    NoYears { exam: String },

    #[error("No subjects available for exam \"{exam}\" after discovery")]
    NoSubjects { exam: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing API key. Set api-key in the config or {var} in the environment")]
    MissingCredential { var: String },

    #[error("Set either per-subject-target or target in [collection]")]
    NoQuota,
}

/// Errors raised by the catalog API client
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (reset, refused, DNS, timeout)
    #[error("Network failure calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    /// The request could not be built or the body could not be read
    #[error("Request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },
}

impl ApiError {
    /// Network-level failures are the only ones worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Request { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("connection reset")
                    || lower.contains("econnreset")
                    || lower.contains("fetch failed")
            }
            Self::Status { .. } => false,
        }
    }

    /// True for 404s and bodies that say the resource does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Status { status, body, .. } => {
                *status == 404 || body.to_lowercase().contains("not found")
            }
            Self::Network { message, .. } | Self::Request { message, .. } => {
                message.to_lowercase().contains("not found")
            }
        }
    }
}

/// Result type alias for Exam-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for catalog API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_harvest, Coordinator, HarvestReport};
pub use records::{DedupStore, Record};
pub use remote::{CatalogApi, Endpoint, HttpCatalogClient};
pub use state::{PointerState, Session, SubjectPointer};
