//! Configuration module for Exam-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The loaded [`Config`] is built once at start-up and passed by reference to
//! every component.
//!
//! # Example
//!
//! ```no_run
//! use exam_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Collecting {}", config.collection.exam);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, CollectionConfig, Config, OutputConfig, RetryConfig, CREDENTIAL_ENV_VAR,
    DEFAULT_BASE_URL,
};

// Re-export parser functions
pub use parser::{
    apply_credential, compute_config_hash, hash_content, load_config, load_config_with_hash,
    parse_config,
};
pub use validation::validate;
