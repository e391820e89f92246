use crate::config::types::{Config, CREDENTIAL_ENV_VAR};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// The credential is taken from `api-key` when present, otherwise from the
/// `MYQUEST_KEY` environment variable. The returned configuration is fully
/// validated.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use exam_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Exam: {}", config.collection.exam);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_credential(&mut config, std::env::var(CREDENTIAL_ENV_VAR).ok());
    validate(&config)?;
    Ok(config)
}

/// Parses TOML content without touching the environment or validating
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Fills in the credential from the environment when the file has none
pub fn apply_credential(config: &mut Config, env_value: Option<String>) {
    let has_key = config
        .api
        .api_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty());
    if !has_key {
        config.api.api_key = env_value.filter(|k| !k.trim().is_empty());
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Checkpoints record this hash so a resumed run can tell that the
/// configuration changed underneath it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

/// Hex-encoded SHA-256 of a configuration string
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
