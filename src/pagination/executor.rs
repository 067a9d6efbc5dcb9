//! Page executors
//!
//! A [`PageExecutor`] fetches exactly one page. The coordinator calls it
//! concurrently, each time with its own copy of the request.

use super::types::{JsonEnvelope, Page, PageMeta, PageRequest};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::types::{JsonValue, Method};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Fetches one page for a request
#[async_trait]
pub trait PageExecutor<R: PageRequest>: Send + Sync + 'static {
    /// Item type on each page
    type Item: Send + 'static;

    /// Fetch the page `request` points at
    async fn execute(&self, request: R) -> Result<Page<Self::Item>>;
}

// ============================================================================
// Closure Executor
// ============================================================================

/// Executor backed by an async closure
#[derive(Clone)]
pub struct FnExecutor<F> {
    f: F,
}

/// Wrap an async closure as a [`PageExecutor`]
pub fn executor_fn<F>(f: F) -> FnExecutor<F> {
    FnExecutor { f }
}

#[async_trait]
impl<R, T, F, Fut> PageExecutor<R> for FnExecutor<F>
where
    R: PageRequest,
    T: Send + 'static,
    F: Fn(R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>>> + Send + 'static,
{
    type Item = T;

    async fn execute(&self, request: R) -> Result<Page<T>> {
        (self.f)(request).await
    }
}

impl<F> std::fmt::Debug for FnExecutor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnExecutor").finish_non_exhaustive()
    }
}

// ============================================================================
// JSON Executor
// ============================================================================

/// Where the request form goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormTransport {
    /// JSON request body
    #[default]
    Body,
    /// Query string; top-level scalar fields only, nested values as JSON
    Query,
}

/// Executor for endpoints answering with a `{data, meta}` JSON envelope
///
/// Missing `data` is an empty page. Missing `meta` falls back to the
/// request's page and limit with a zero total, which ends pagination.
pub struct JsonPageExecutor<T> {
    client: Arc<HttpClient>,
    method: Method,
    url: String,
    transport: FormTransport,
    _item: PhantomData<fn() -> T>,
}

impl<T> JsonPageExecutor<T> {
    /// Create an executor for `method url`
    pub fn new(client: Arc<HttpClient>, method: Method, url: impl Into<String>) -> Self {
        Self {
            client,
            method,
            url: url.into(),
            transport: FormTransport::default(),
            _item: PhantomData,
        }
    }

    /// Choose where the request form is sent
    #[must_use]
    pub fn with_transport(mut self, transport: FormTransport) -> Self {
        self.transport = transport;
        self
    }

    /// The client requests go through
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    fn request_config(&self, form: JsonValue) -> Result<RequestConfig> {
        match self.transport {
            FormTransport::Body => Ok(RequestConfig::new().json(form)),
            FormTransport::Query => {
                let JsonValue::Object(fields) = form else {
                    return Err(Error::encode(
                        &self.url,
                        "query transport needs a form that serializes to an object",
                    ));
                };
                let mut config = RequestConfig::new();
                for (key, value) in fields {
                    match value {
                        JsonValue::Null => {}
                        JsonValue::String(s) => config = config.query(key, s),
                        other => config = config.query(key, other.to_string()),
                    }
                }
                Ok(config)
            }
        }
    }
}

impl<T> std::fmt::Debug for JsonPageExecutor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonPageExecutor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R, T> PageExecutor<R> for JsonPageExecutor<T>
where
    R: PageRequest + Serialize,
    T: DeserializeOwned + Send + 'static,
{
    type Item = T;

    async fn execute(&self, request: R) -> Result<Page<T>> {
        let form = serde_json::to_value(&request).map_err(|e| {
            Error::encode(
                &self.url,
                format!("{e}. Service: {}", self.client.label()),
            )
        })?;
        let config = self.request_config(form)?;

        let envelope: JsonEnvelope<Vec<T>> = self
            .client
            .request_json(self.method, &self.url, config)
            .await?;

        let meta = envelope
            .meta
            .unwrap_or_else(|| PageMeta::new(request.page(), request.limit(), 0));
        let items = envelope.data.unwrap_or_default();
        debug!(
            "Fetched page {} ({} items) from {}",
            meta.page,
            items.len(),
            self.url
        );

        Ok(Page { items, meta })
    }
}
