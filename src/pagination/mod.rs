//! Pagination module
//!
//! Fetches every page of a paged resource with bounded parallelism.
//!
//! # Overview
//!
//! The first page is fetched on its own. Its metadata (`page`, `limit`,
//! `total`) tells the planner which pages remain; those are fetched by at
//! most `parallel_count` concurrent tasks and assembled by page number, so
//! the result matches a sequential page-by-page fetch.
//!
//! ```rust,ignore
//! use pagereq::pagination::{fetch_all_pages, JsonPageExecutor, PageParams};
//!
//! let executor = Arc::new(JsonPageExecutor::<Post>::new(client, Method::POST, "/posts/search"));
//! let all = fetch_all_pages(PageParams::new(1, 100).with_parallel(8), executor).await?;
//! ```

mod assembler;
mod coordinator;
mod executor;
mod planner;
mod types;

pub use assembler::ResultBuffer;
pub use coordinator::{fetch_all, fetch_all_pages, fetch_all_pages_with, FetchOptions, OnPageError};
pub use executor::{executor_fn, FnExecutor, FormTransport, JsonPageExecutor, PageExecutor};
pub use planner::{plan, FetchPlan};
pub use types::{JsonEnvelope, Page, PageMeta, PageParams, PageRequest, PageResult, PagedItems};
