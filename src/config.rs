//! Client configuration files
//!
//! A [`ClientConfig`] describes one remote service in YAML (or JSON, which
//! YAML parses too) and converts into an [`HttpClientConfig`].
//!
//! ```yaml
//! label: gorest
//! base_url: https://gorest.local
//! timeout_seconds: 10
//! retry:
//!   max_retries: 2
//!   backoff:
//!     type: constant
//!     initial_ms: 250
//! log:
//!   enabled: true
//!   body_size: 512
//! headers:
//!   Authorization: Bearer token
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, PacingConfig, ResponseErrorStrategy, RetryStrategy};
use crate::types::{BackoffType, StringMap};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Service client configuration loaded from a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service label for logs and error messages
    #[serde(default = "default_label")]
    pub label: String,

    /// Base URL that relative request URLs are joined to
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Decode `{"error": {...}}` bodies of failed responses
    #[serde(default)]
    pub error_envelope: bool,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: StringMap,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Request logging
    #[serde(default)]
    pub log: LogConfig,

    /// TLS settings
    #[serde(default)]
    pub tls: TlsConfig,

    /// Request pacing quota
    #[serde(default)]
    pub pacing: Option<PacingConfig>,
}

fn default_label() -> String {
    "default".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            base_url: None,
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            retry: RetryConfig::default(),
            error_envelope: false,
            headers: StringMap::new(),
            user_agent: None,
            log: LogConfig::default(),
            tls: TlsConfig::default(),
            pacing: None,
        }
    }
}

// ============================================================================
// Retry Config
// ============================================================================

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// HTTP status codes to retry on
    #[serde(default = "default_retry_statuses")]
    pub statuses: Vec<u16>,

    /// Delay between attempts
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            statuses: default_retry_statuses(),
            backoff: BackoffConfig::default(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_statuses() -> Vec<u16> {
    crate::http::DEFAULT_RETRY_STATUSES.to_vec()
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::default(),
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

// ============================================================================
// Logging and TLS
// ============================================================================

/// Request logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log every attempt as curl line, status and body
    #[serde(default)]
    pub enabled: bool,

    /// Logged body bytes (0 = whole body)
    #[serde(default)]
    pub body_size: usize,
}

/// TLS configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    /// PEM file with CA certificates to trust
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
}

// ============================================================================
// Loading and Conversion
// ============================================================================

impl ClientConfig {
    /// Parse a config from YAML or JSON text
    pub fn parse(content: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde accepts but the client cannot use
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(Error::config("timeout_seconds must be greater than 0"));
        }
        if self.retry.backoff.initial_ms > self.retry.backoff.max_ms {
            return Err(Error::config(format!(
                "retry.backoff.initial_ms ({}) exceeds max_ms ({})",
                self.retry.backoff.initial_ms, self.retry.backoff.max_ms
            )));
        }
        if let Some(pacing) = &self.pacing {
            if pacing.requests_per_second == 0 {
                return Err(Error::config(
                    "pacing.requests_per_second must be greater than 0",
                ));
            }
        }
        Ok(())
    }

    /// Convert into a client configuration
    pub fn into_http_config(self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .label(self.label)
            .timeout(Duration::from_secs(self.timeout_seconds))
            .connect_timeout(Duration::from_secs(self.connect_timeout_seconds))
            .max_retries(self.retry.max_retries)
            .backoff(
                self.retry.backoff.backoff_type,
                Duration::from_millis(self.retry.backoff.initial_ms),
                Duration::from_millis(self.retry.backoff.max_ms),
            )
            .retry_strategy(RetryStrategy::Statuses(self.retry.statuses))
            .log_requests(self.log.enabled)
            .log_body_size(self.log.body_size);

        if let Some(url) = self.base_url {
            builder = builder.base_url(url);
        }
        if self.error_envelope {
            builder = builder.error_strategy(ResponseErrorStrategy::Envelope);
        }
        for (key, value) in self.headers {
            builder = builder.header(key, value);
        }
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(pacing) = self.pacing {
            builder = builder.pacing(pacing);
        }
        if let Some(path) = self.tls.ca_cert {
            builder = builder.ca_cert(path);
        }

        builder.build()
    }
}

/// Load a client config file
pub fn load_config(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    ClientConfig::parse(&content)
        .with_context(|| format!("Invalid config {}", path.display()))
}
