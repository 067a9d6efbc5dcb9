//! Pagination planner
//!
//! Works out which pages are still missing after the first response.

use super::types::PageMeta;
use crate::error::{Error, Result};
use std::ops::RangeInclusive;

/// Pages left to fetch after the first one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
    first_page: u32,
    last_page: u32,
    limit: u32,
}

impl FetchPlan {
    /// First (already fetched) page
    pub fn first_page(&self) -> u32 {
        self.first_page
    }

    /// Last page of the resource
    pub fn last_page(&self) -> u32 {
        self.last_page
    }

    /// Page size every slot is sized for
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of pages still to fetch
    pub fn remaining(&self) -> usize {
        self.last_page.saturating_sub(self.first_page) as usize
    }

    /// Nothing left to fetch
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Pages to fetch, ascending
    pub fn pages(&self) -> RangeInclusive<u32> {
        if self.is_empty() {
            #[allow(clippy::reversed_empty_ranges)]
            return 1..=0;
        }
        (self.first_page + 1)..=self.last_page
    }

    /// Slots needed to hold the first page and every remaining page
    pub fn slot_count(&self) -> usize {
        self.remaining() + 1
    }

    /// Buffer offset of a page's slot, if the page belongs to the plan
    pub fn offset_of(&self, page: u32) -> Option<usize> {
        if page < self.first_page || page > self.first_page.max(self.last_page) {
            return None;
        }
        Some((page - self.first_page) as usize * self.limit as usize)
    }
}

/// Plan the remaining pages from the first page's metadata
///
/// An unset page counts as page 1. A zero limit, or a first page at or past
/// the last page, gives an empty plan. Fails when the last page does not fit
/// a page number.
pub fn plan(meta: &PageMeta) -> Result<FetchPlan> {
    let meta = meta.normalized();
    let last_page = u32::try_from(meta.last_page()).map_err(|_| {
        Error::capacity(format!(
            "{} items at {} per page exceed the last addressable page",
            meta.total, meta.limit
        ))
    })?;

    Ok(FetchPlan {
        first_page: meta.page,
        last_page,
        limit: meta.limit,
    })
}
