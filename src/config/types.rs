use serde::{Deserialize, Serialize};

/// Default catalog endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.myquest.com.ng/api/questions";

/// Environment variable consulted when the config has no api-key
pub const CREDENTIAL_ENV_VAR: &str = "MYQUEST_KEY";

/// Main configuration structure for Exam-Harvest
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    pub collection: CollectionConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Catalog API connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApiConfig {
    /// POST endpoint for both metadata and question listing
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer credential; falls back to `MYQUEST_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Connect timeout for each request (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// What to collect and how politely
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CollectionConfig {
    /// Exam identifier as the catalog spells it (e.g. "JAMB")
    pub exam: String,

    /// Unique questions to collect per subject
    #[serde(default)]
    pub per_subject_target: Option<u32>,

    /// Global target, divided evenly across subjects when no per-subject target is set
    #[serde(default)]
    pub target: Option<u32>,

    /// Delay after every page fetch (milliseconds)
    #[serde(default = "default_polite_delay")]
    pub polite_delay_ms: u64,

    /// Delay between subject slug variant attempts (milliseconds)
    #[serde(default = "default_variant_delay")]
    pub variant_delay_ms: u64,

    /// Save a checkpoint every N page fetches
    #[serde(default = "default_checkpoint_pages")]
    pub checkpoint_pages: u64,

    /// Upper bound on steps per subject within one round
    #[serde(default = "default_max_pages_per_round")]
    pub max_pages_per_round: u32,

    /// Keep only the most recent N four-digit years
    #[serde(default)]
    pub years_back: Option<usize>,

    /// Advance to the next year when the API reports the last page
    #[serde(default)]
    pub honor_pagination: bool,

    /// Explicit year list; skips year discovery
    #[serde(default)]
    pub years: Option<Vec<String>>,

    /// Explicit subject list; skips subject discovery
    #[serde(default)]
    pub subjects: Option<Vec<String>>,

    /// Years used when discovery returns nothing
    #[serde(default = "default_fallback_years")]
    pub fallback_years: Vec<String>,

    /// Subjects used when discovery returns nothing
    #[serde(default = "default_fallback_subjects")]
    pub fallback_subjects: Vec<String>,
}

/// Retry behavior of the remote client
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Total attempts per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff step: attempt N waits N * step (milliseconds)
    #[serde(default = "default_backoff_step")]
    pub backoff_step_ms: u64,
}

/// Output locations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory; files land in `<directory>/<exam>/`
    #[serde(default = "default_output_dir")]
    pub directory: String,

    /// Checkpoint file; defaults to `checkpoint_<exam>.json`
    #[serde(default)]
    pub checkpoint_path: Option<String>,
}

impl Config {
    /// Resolved checkpoint location for this exam
    pub fn checkpoint_path(&self) -> String {
        self.output
            .checkpoint_path
            .clone()
            .unwrap_or_else(|| format!("checkpoint_{}.json", self.collection.exam))
    }

    /// The bearer credential, empty if none was resolved
    pub fn api_key(&self) -> &str {
        self.api.api_key.as_deref().unwrap_or("")
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            checkpoint_path: None,
        }
    }
}

impl CollectionConfig {
    /// A collection config for `exam` with every optional knob at its default
    pub fn new(exam: impl Into<String>) -> Self {
        Self {
            exam: exam.into(),
            per_subject_target: None,
            target: None,
            polite_delay_ms: default_polite_delay(),
            variant_delay_ms: default_variant_delay(),
            checkpoint_pages: default_checkpoint_pages(),
            max_pages_per_round: default_max_pages_per_round(),
            years_back: None,
            honor_pagination: false,
            years: None,
            subjects: None,
            fallback_years: default_fallback_years(),
            fallback_subjects: default_fallback_subjects(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_polite_delay() -> u64 {
    150
}

fn default_variant_delay() -> u64 {
    80
}

fn default_checkpoint_pages() -> u64 {
    40
}

fn default_max_pages_per_round() -> u32 {
    500
}

fn default_max_attempts() -> u32 {
    4
}

fn default_backoff_step() -> u64 {
    300
}

fn default_output_dir() -> String {
    "outputs".to_string()
}

fn default_fallback_years() -> Vec<String> {
    (2000..=2024).rev().map(|y| y.to_string()).collect()
}

fn default_fallback_subjects() -> Vec<String> {
    ["mathematics", "english", "physics", "chemistry", "biology"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
