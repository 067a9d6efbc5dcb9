//! Retry and response-error strategies
//!
//! The client consults a [`RetryStrategy`] after every attempt and a
//! [`ResponseErrorStrategy`] once, on the final response.

use super::response::HttpResponse;
use crate::error::{Error, ErrorDetail, Result};
use crate::types::JsonValue;
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Statuses retried by default
pub const DEFAULT_RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Custom retry predicate
pub type RetryCheck = Arc<dyn Fn(StatusCode) -> bool + Send + Sync>;

/// Custom response check
pub type ResponseCheck = Arc<dyn Fn(&HttpResponse) -> Result<()> + Send + Sync>;

// ============================================================================
// Retry Strategy
// ============================================================================

/// Decides whether a response should be retried
#[derive(Clone)]
pub enum RetryStrategy {
    /// Retry when the status is in the list
    Statuses(Vec<u16>),
    /// Never retry on a response (transport errors still retry)
    Never,
    /// Caller-provided predicate
    Custom(RetryCheck),
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::Statuses(DEFAULT_RETRY_STATUSES.to_vec())
    }
}

impl RetryStrategy {
    /// Wrap a predicate
    pub fn custom(check: impl Fn(StatusCode) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(check))
    }

    /// Whether a response with this status should be retried
    pub fn should_retry(&self, status: StatusCode) -> bool {
        match self {
            Self::Statuses(statuses) => statuses.contains(&status.as_u16()),
            Self::Never => false,
            Self::Custom(check) => check(status),
        }
    }
}

impl fmt::Debug for RetryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Statuses(statuses) => f.debug_tuple("Statuses").field(statuses).finish(),
            Self::Never => f.write_str("Never"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// ============================================================================
// Response Error Strategy
// ============================================================================

/// Turns a final response into an error
#[derive(Clone, Default)]
pub enum ResponseErrorStrategy {
    /// Any status >= 400 is an [`Error::HttpStatus`]
    #[default]
    Status,
    /// Decode the service's JSON error envelope into [`Error::Api`],
    /// falling back to `Status` when the body has no envelope
    Envelope,
    /// Caller-provided check
    Custom(ResponseCheck),
}

impl ResponseErrorStrategy {
    /// Wrap a check function
    pub fn custom(check: impl Fn(&HttpResponse) -> Result<()> + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(check))
    }

    /// Check a response
    pub fn check(&self, response: &HttpResponse) -> Result<()> {
        match self {
            Self::Status => status_error(response),
            Self::Envelope => match envelope_error(response) {
                Some(err) => Err(err),
                None => status_error(response),
            },
            Self::Custom(check) => check(response),
        }
    }
}

impl fmt::Debug for ResponseErrorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => f.write_str("Status"),
            Self::Envelope => f.write_str("Envelope"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn status_error(response: &HttpResponse) -> Result<()> {
    if response.status.as_u16() < 400 {
        return Ok(());
    }
    let reason = response.status.canonical_reason().unwrap_or("Unknown");
    Err(Error::http_status(
        response.status.as_u16(),
        format!(
            "{reason}: {} Service: {}",
            response.url.path(),
            response.authority()
        ),
    ))
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    code: Option<JsonValue>,
    #[serde(default)]
    data: Vec<ApiErrorDetailBody>,
}

#[derive(Deserialize)]
struct ApiErrorDetailBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<JsonValue>,
    #[serde(default)]
    name: Option<String>,
}

fn envelope_error(response: &HttpResponse) -> Option<Error> {
    if response.status.as_u16() < 400 {
        return None;
    }
    let envelope: ErrorEnvelope = serde_json::from_slice(&response.body).ok()?;
    let body = envelope.error?;
    Some(Error::Api {
        status: response.status.as_u16(),
        message: body.message,
        code: body.code.and_then(code_string),
        details: body
            .data
            .into_iter()
            .map(|d| ErrorDetail {
                name: d.name,
                code: d.code.and_then(code_string),
                message: d.message,
            })
            .collect(),
    })
}

// Services send codes both as strings and as numbers.
fn code_string(code: JsonValue) -> Option<String> {
    match code {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
