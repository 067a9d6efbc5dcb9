// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # pagereq
//!
//! Parallel paginated fetching over HTTP with JSON envelopes.
//!
//! ## Features
//!
//! - **Parallel Pagination**: Fetch the first page, then every remaining page
//!   with bounded concurrency, assembled in sequential order
//! - **HTTP Client**: Retries with backoff, request pacing, curl-style request
//!   logging and custom CA bundles
//! - **Error Envelopes**: Decode `{"error": {...}}` bodies into typed errors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagereq::{fetch_all_pages, HttpClient, JsonPageExecutor, Method, PageParams, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Arc::new(HttpClient::new()?);
//!     let executor = Arc::new(JsonPageExecutor::<serde_json::Value>::new(
//!         client,
//!         Method::POST,
//!         "https://gorest.local/posts/search",
//!     ));
//!
//!     let all = fetch_all_pages(PageParams::new(1, 100).with_parallel(8), executor).await?;
//!     println!("{} posts", all.items.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │        fetch_all_pages(request, executor)                │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────────┬─────────────┴──────┬──────────────────────┐
//! │   Planner    │    Coordinator     │      Assembler       │
//! ├──────────────┼────────────────────┼──────────────────────┤
//! │ last page    │ semaphore gate     │ slot per page        │
//! │ remaining    │ fan-in channel     │ sequential order     │
//! │              │ first error wins   │                      │
//! └──────────────┴────────────────────┴──────────────────────┘
//!                              │
//! ┌──────────────────────────────────────────────────────────┐
//! │  HttpClient: retry, backoff, pacing, curl logging, TLS   │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry, pacing and request logging
pub mod http;

/// Parallel pagination
pub mod pagination;

/// Client configuration files
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{load_config, ClientConfig};
pub use http::{HttpClient, HttpClientConfig, RequestConfig};
pub use pagination::{
    fetch_all_pages, fetch_all_pages_with, FetchOptions, JsonPageExecutor, Page, PageExecutor,
    PageMeta, PageParams, PageRequest, PagedItems,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
