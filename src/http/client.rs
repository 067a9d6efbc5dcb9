//! HTTP client with retry and request logging
//!
//! Provides the single-request executor used by every higher layer:
//! - Automatic retries driven by a [`RetryStrategy`] with configurable backoff
//! - Optional request pacing shared across concurrent callers
//! - Full-body buffering, so responses can be logged and inspected
//! - curl-style request logs with truncated bodies
//! - A typed JSON call wrapper

use super::curl::{body_snippet, build_curl};
use super::pacing::{PacingConfig, RequestPacer};
use super::response::HttpResponse;
use super::strategy::{ResponseErrorStrategy, RetryStrategy};
use super::tls;
use crate::error::{Error, Result};
use crate::types::{BackoffType, Method};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Service label used in logs and error messages
    pub label: String,
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Which responses are retried
    pub retry_strategy: RetryStrategy,
    /// How the final response is turned into an error
    pub error_strategy: ResponseErrorStrategy,
    /// Request pacing
    pub pacing: Option<PacingConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
    /// Log every attempt as a curl line plus status and body
    pub log_requests: bool,
    /// How many body bytes are logged (0 = whole body)
    pub log_body_size: usize,
    /// PEM CA bundle to trust
    pub ca_cert: Option<PathBuf>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            label: "default".to_string(),
            base_url: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            retry_strategy: RetryStrategy::default(),
            error_strategy: ResponseErrorStrategy::default(),
            pacing: None,
            default_headers: HashMap::new(),
            user_agent: format!("pagereq/{}", env!("CARGO_PKG_VERSION")),
            log_requests: false,
            log_body_size: 0,
            ca_cert: None,
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the service label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set the retry strategy
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.config.retry_strategy = strategy;
        self
    }

    /// Set the response error strategy
    pub fn error_strategy(mut self, strategy: ResponseErrorStrategy) -> Self {
        self.config.error_strategy = strategy;
        self
    }

    /// Pace requests
    pub fn pacing(mut self, config: PacingConfig) -> Self {
        self.config.pacing = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Enable or disable request logging
    pub fn log_requests(mut self, enabled: bool) -> Self {
        self.config.log_requests = enabled;
        self
    }

    /// Limit logged body size
    pub fn log_body_size(mut self, size: usize) -> Self {
        self.config.log_body_size = size;
        self
    }

    /// Trust the CA bundle at `path`
    pub fn ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ca_cert = Some(path.into());
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: HashMap<String, String>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
    /// Override max retries for this request
    pub max_retries: Option<u32>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set max retries
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

// Request resolved against the client config, shared by every attempt.
struct Prepared {
    url: Url,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
}

/// HTTP client with retry and request logging
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    pacer: Option<RequestPacer>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent);

        if let Some(ref path) = config.ca_cert {
            builder = tls::secure_client(builder, path)?;
        }

        let client = builder.build()?;
        let pacer = config.pacing.map(RequestPacer::new);

        Ok(Self {
            client,
            config,
            pacer,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Service label
    pub fn label(&self) -> &str {
        &self.config.label
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Check if request pacing is enabled
    pub fn has_pacer(&self) -> bool {
        self.pacer.is_some()
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.request(Method::GET, url, RequestConfig::default())
            .await
    }

    /// Make a GET request with config
    pub async fn get_with_config(&self, url: &str, config: RequestConfig) -> Result<HttpResponse> {
        self.request(Method::GET, url, config).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, body: Value) -> Result<HttpResponse> {
        self.request(Method::POST, url, RequestConfig::default().json(body))
            .await
    }

    /// Make a generic request
    ///
    /// Each attempt reads the whole body. Responses matched by the retry
    /// strategy are retried until `max_retries` is spent, then the error
    /// strategy decides whether the last response is an error. Transport
    /// failures are retried the same way.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<HttpResponse> {
        let prepared = self.prepare(url, &config)?;
        let max_retries = config.max_retries.unwrap_or(self.config.max_retries);
        let timeout = config.timeout.unwrap_or(self.config.timeout);
        let label = &self.config.label;

        let curl = self.config.log_requests.then(|| {
            build_curl(
                method,
                prepared.url.as_str(),
                &prepared.headers,
                prepared.body.as_deref(),
                self.config.log_body_size,
            )
        });

        let mut attempt = 0;

        loop {
            // Wait for pacer
            if let Some(ref pacer) = self.pacer {
                pacer.until_ready().await;
            }

            let mut req = self
                .client
                .request(method.into(), prepared.url.clone())
                .timeout(timeout);
            for (key, value) in &prepared.headers {
                req = req.header(key.as_str(), value.as_str());
            }
            if let Some(ref body) = prepared.body {
                req = req.body(body.clone());
            }

            let started = Instant::now();
            match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    let headers = response.headers().clone();
                    let final_url = response.url().clone();

                    let body = match response.bytes().await {
                        Ok(body) => body,
                        Err(e) => {
                            if let Some(ref curl) = curl {
                                self.log_attempt(curl, status.as_u16(), &[], started.elapsed());
                            }
                            return Err(Error::decode(format!(
                                "Http Response ({}) read error: {e}. Service: {label}",
                                prepared.url
                            )));
                        }
                    };

                    let response = HttpResponse {
                        status,
                        headers,
                        url: final_url,
                        body,
                        elapsed: started.elapsed(),
                    };
                    if let Some(ref curl) = curl {
                        self.log_attempt(curl, status.as_u16(), &response.body, response.elapsed);
                    }

                    if attempt < max_retries && self.config.retry_strategy.should_retry(status) {
                        let delay = self.retry_delay(attempt, &response);
                        warn!(
                            "{} responded {}, attempt {}/{}, retrying in {:?}",
                            label,
                            status.as_u16(),
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    self.config.error_strategy.check(&response)?;

                    debug!("Request succeeded: {} {}", method, prepared.url);
                    return Ok(response);
                }
                Err(e) => {
                    if let Some(ref curl) = curl {
                        warn!(service = %label, "\n    {curl}\n    {e}\n    FAILED");
                    }

                    let error = if e.is_timeout() {
                        Error::Timeout {
                            timeout_ms: timeout.as_millis() as u64,
                        }
                    } else {
                        Error::Http(e)
                    };

                    if error.is_retryable() && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Request to {} failed ({}), attempt {}/{}, retrying in {:?}",
                            label,
                            error,
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(error);
                }
            }
        }
    }

    /// Make a request and parse JSON response
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let response = self.request(method, url, config).await?;
        serde_json::from_slice(&response.body).map_err(|e| {
            Error::decode(format!(
                "Http Response ({}) decode error: {e}. Service: {}",
                response.url, self.config.label
            ))
        })
    }

    /// Make a GET request and parse JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.request_json(Method::GET, url, RequestConfig::default())
            .await
    }

    /// Send a typed body and decode a typed response
    ///
    /// `headers` are added on top of the client's default headers.
    pub async fn send_json<B, T>(
        &self,
        method: Method,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut config = RequestConfig::new();
        for (key, value) in headers {
            config = config.header(key, value);
        }
        if let Some(body) = body {
            let value = serde_json::to_value(body).map_err(|e| {
                Error::encode(
                    self.build_url(url),
                    format!("{e}. Service: {}", self.config.label),
                )
            })?;
            config = config.json(value);
        }
        self.request_json(method, url, config).await
    }

    /// Render a request as the curl command this client would send
    pub fn curl(&self, method: Method, url: &str, config: &RequestConfig) -> Result<String> {
        let prepared = self.prepare(url, config)?;
        Ok(build_curl(
            method,
            prepared.url.as_str(),
            &prepared.headers,
            prepared.body.as_deref(),
            self.config.log_body_size,
        ))
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }

    // 429 responses carry their own delay.
    fn retry_delay(&self, attempt: u32, response: &HttpResponse) -> Duration {
        if response.status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            if let Some(seconds) = extract_retry_after(response) {
                return std::cmp::min(Duration::from_secs(seconds), self.config.max_backoff);
            }
        }
        self.calculate_backoff(attempt)
    }

    fn log_attempt(&self, curl: &str, status: u16, body: &[u8], elapsed: Duration) {
        let snippet = body_snippet(body, self.config.log_body_size);
        if status >= 300 {
            warn!(
                service = %self.config.label,
                "\n    {curl}\n    HTTP Status [{status}] in: {} ms\n    Body: {snippet}",
                elapsed.as_millis()
            );
        } else {
            info!(
                service = %self.config.label,
                "\n    {curl}\n    HTTP Status [{status}] in: {} ms\n    Body: {snippet}",
                elapsed.as_millis()
            );
        }
    }

    fn prepare(&self, url: &str, config: &RequestConfig) -> Result<Prepared> {
        if url.trim().is_empty() && self.config.base_url.is_none() {
            return Err(Error::validation("url"));
        }

        let mut full_url = Url::parse(&self.build_url(url))?;
        if !config.query.is_empty() {
            let mut pairs: Vec<(&String, &String)> = config.query.iter().collect();
            pairs.sort();
            full_url.query_pairs_mut().extend_pairs(pairs);
        }

        let mut headers = self.config.default_headers.clone();
        headers.extend(config.headers.clone());

        let body = match config.body {
            Some(ref value) => {
                let encoded = serde_json::to_vec(value)
                    .map_err(|e| Error::encode(full_url.as_str(), e.to_string()))?;
                if !headers
                    .keys()
                    .any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()))
                {
                    headers.insert("Content-Type".to_string(), "application/json".to_string());
                }
                Some(Bytes::from(encoded))
            }
            None => None,
        };

        Ok(Prepared {
            url: full_url,
            headers,
            body,
        })
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                if path.is_empty() {
                    base.to_string()
                } else {
                    format!("{base}/{path}")
                }
            }
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_pacer", &self.pacer.is_some())
            .finish_non_exhaustive()
    }
}

/// Extract retry-after header value in seconds
fn extract_retry_after(response: &HttpResponse) -> Option<u64> {
    response
        .headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
