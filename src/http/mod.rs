//! HTTP client module
//!
//! The single-request executor everything else is built on.
//!
//! # Features
//!
//! - **Automatic Retries**: Status-driven retry strategy with backoff
//! - **Error Strategies**: Plain status errors or decoded API error envelopes
//! - **Request Logs**: curl reproduction, status, latency and body per attempt
//! - **Private CAs**: Trust a PEM bundle for internal services
//! - **Pacing**: Token bucket shared by concurrent callers

mod client;
mod curl;
mod pacing;
mod response;
mod strategy;
mod tls;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use curl::{body_snippet, build_curl};
pub use pacing::{PacingConfig, RequestPacer};
pub use response::HttpResponse;
pub use strategy::{
    ResponseCheck, ResponseErrorStrategy, RetryCheck, RetryStrategy, DEFAULT_RETRY_STATUSES,
};
pub use tls::{load_ca_bundle, secure_client};
