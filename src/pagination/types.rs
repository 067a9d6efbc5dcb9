//! Pagination types and traits
//!
//! Defines the page metadata envelope, page results and the capability
//! trait a request form implements to be fetched page by page.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Pagination metadata returned with every page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Page number (1-based; 0 means "not set")
    #[serde(default)]
    pub page: u32,
    /// Page size
    #[serde(default)]
    pub limit: u32,
    /// Total number of items across all pages
    #[serde(default)]
    pub total: u64,
}

impl PageMeta {
    /// Create metadata
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self { page, limit, total }
    }

    /// Treat an unset page as the first page
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            ..self
        }
    }

    /// Last page implied by `total` and `limit` (0 when `limit` is 0)
    pub fn last_page(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

/// One page of items
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Metadata the service sent with the page
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(items: Vec<T>, meta: PageMeta) -> Self {
        Self { items, meta }
    }
}

/// Outcome of fetching one page
pub type PageResult<T> = Result<Page<T>>;

/// Every item of a paged resource, in page order
#[derive(Debug, Clone, PartialEq)]
pub struct PagedItems<T> {
    /// Items from the first requested page to the last page
    pub items: Vec<T>,
    /// Normalized metadata of the first page
    pub meta: PageMeta,
}

/// Capabilities a request form needs for paginated fetching
///
/// Each concurrent fetch gets its own clone with only the page changed.
pub trait PageRequest: Clone + Send + Sync + 'static {
    /// Current page
    fn page(&self) -> u32;

    /// Set the page to request
    fn set_page(&mut self, page: u32);

    /// Page size
    fn limit(&self) -> u32;

    /// Set the page size
    fn set_limit(&mut self, limit: u32);

    /// How many pages may be fetched at once (0 = first page only)
    fn parallel_count(&self) -> usize;
}

/// Page parameters to embed in request forms
///
/// Serializes as `{"page": .., "limit": ..}`; the parallel count stays
/// on the client side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    /// Page of pagination
    #[serde(default)]
    pub page: u32,
    /// Limit for pagination
    #[serde(default)]
    pub limit: u32,
    /// Parallel requests
    #[serde(skip)]
    pub parallel_count: usize,
}

impl PageParams {
    /// Create page parameters without parallel fetching
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            parallel_count: 0,
        }
    }

    /// Allow up to `count` pages in flight
    #[must_use]
    pub fn with_parallel(mut self, count: usize) -> Self {
        self.parallel_count = count;
        self
    }
}

impl PageRequest for PageParams {
    fn page(&self) -> u32 {
        self.page
    }

    fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    fn limit(&self) -> u32 {
        self.limit
    }

    fn set_limit(&mut self, limit: u32) {
        self.limit = limit;
    }

    fn parallel_count(&self) -> usize {
        self.parallel_count
    }
}

/// JSON envelope the paged services answer with
#[derive(Debug, Clone, Deserialize)]
pub struct JsonEnvelope<T> {
    /// Informational message
    #[serde(default)]
    pub message: Option<String>,
    /// Payload
    pub data: Option<T>,
    /// Pagination metadata
    pub meta: Option<PageMeta>,
}
