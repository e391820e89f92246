use crate::config::types::{
    ApiConfig, CollectionConfig, Config, OutputConfig, RetryConfig, CREDENTIAL_ENV_VAR,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_collection_config(&config.collection)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the endpoint and credential
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        return Err(ConfigError::MissingCredential {
            var: CREDENTIAL_ENV_VAR.to_string(),
        });
    }

    Ok(())
}

/// Validates exam, quota and cadence settings
fn validate_collection_config(config: &CollectionConfig) -> Result<(), ConfigError> {
    if config.exam.trim().is_empty() {
        return Err(ConfigError::Validation("exam cannot be empty".to_string()));
    }

    match (config.per_subject_target, config.target) {
        (None, None) => return Err(ConfigError::NoQuota),
        (Some(0), _) => {
            return Err(ConfigError::Validation(
                "per-subject-target must be >= 1".to_string(),
            ))
        }
        (None, Some(0)) => {
            return Err(ConfigError::Validation("target must be >= 1".to_string()))
        }
        _ => {}
    }

    if config.checkpoint_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint-pages must be >= 1, got {}",
            config.checkpoint_pages
        )));
    }

    if config.max_pages_per_round < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages-per-round must be >= 1, got {}",
            config.max_pages_per_round
        )));
    }

    if config.years_back == Some(0) {
        return Err(ConfigError::Validation(
            "years-back must be >= 1 when set".to_string(),
        ));
    }

    if let Some(years) = &config.years {
        if years.is_empty() {
            return Err(ConfigError::Validation(
                "years, when set, must list at least one year".to_string(),
            ));
        }
    }

    if let Some(subjects) = &config.subjects {
        if subjects.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "subjects cannot contain empty names".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates retry settings
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_path.as_deref() == Some("") {
        return Err(ConfigError::Validation(
            "checkpoint-path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}
