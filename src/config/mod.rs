//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Transport retry configuration (serializable version)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per request
    pub max_attempts: u32,
    /// Initial delay between retries (in milliseconds)
    pub initial_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Retry behavior for connection-level faults while paging results.
///
/// The delay is fixed, not exponential: the fault model is a flaky stream
/// that usually recovers on the next attempt, and the same pagination
/// offset is re-requested every time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsRetryConfig {
    /// Fixed delay between attempts (in milliseconds)
    pub fixed_delay_ms: u64,
    /// Attempts per pagination offset before the run is failed
    pub max_attempts_per_offset: u32,
}

impl Default for ResultsRetryConfig {
    fn default() -> Self {
        Self {
            fixed_delay_ms: 2000,
            max_attempts_per_offset: 1000,
        }
    }
}

impl ResultsRetryConfig {
    pub fn fixed_delay(&self) -> Duration {
        Duration::from_millis(self.fixed_delay_ms)
    }
}

/// Output file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Base name prefix for the generated report files
    pub prefix: String,
    /// Directory the report files are written to
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: "cxone_vulnerabilities_full_history".to_string(),
            directory: PathBuf::from("."),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tenant name used in the authentication realm path
    pub tenant: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// AST API base URL (regional, e.g. https://eu.ast.checkmarx.net)
    pub api_base_url: String,
    /// IAM base URL (regional, e.g. https://eu.iam.checkmarx.net)
    pub iam_base_url: String,
    /// Pagination page size for all listing endpoints
    pub page_size: u32,
    /// Connection timeout (in seconds)
    pub connect_timeout_seconds: u64,
    /// Per-request read timeout (in seconds)
    pub request_timeout_seconds: u64,
    pub retry: RetryConfig,
    pub results_retry: ResultsRetryConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tenant: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            api_base_url: "https://eu.ast.checkmarx.net".to_string(),
            iam_base_url: "https://eu.iam.checkmarx.net".to_string(),
            page_size: 4000,
            connect_timeout_seconds: 5,
            request_timeout_seconds: 30,
            retry: RetryConfig::default(),
            results_retry: ResultsRetryConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        // Add local config and environment variables last (highest priority)
        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("CXONE").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate the configuration before any network call is made
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.tenant.trim().is_empty() {
            return Err(ConfigLoadError::Validation("tenant must not be empty".into()));
        }
        if self.client_id.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "client_id must not be empty".into(),
            ));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "client_secret must not be empty".into(),
            ));
        }
        for (name, url) in [
            ("api_base_url", &self.api_base_url),
            ("iam_base_url", &self.iam_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigLoadError::Validation(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }
        if self.page_size == 0 {
            return Err(ConfigLoadError::Validation(
                "page_size must be greater than zero".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigLoadError::Validation(
                "retry.max_attempts must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Token endpoint for the client-credentials exchange
    pub fn auth_url(&self) -> String {
        format!(
            "{}/auth/realms/{}/protocol/openid-connect/token",
            self.iam_base_url.trim_end_matches('/'),
            self.tenant
        )
    }

    pub fn projects_url(&self) -> String {
        format!("{}/api/projects", self.api_base_url.trim_end_matches('/'))
    }

    pub fn scans_url(&self) -> String {
        format!("{}/api/scans", self.api_base_url.trim_end_matches('/'))
    }

    pub fn results_url(&self) -> String {
        format!("{}/api/results", self.api_base_url.trim_end_matches('/'))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Error type for configuration loading and validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
