//! Ordered result assembly
//!
//! Pages arrive in any order. Each one is copied into a fixed-size slot at
//! `(page - first_page) * limit`, so the final order never depends on
//! arrival order.

use super::planner::FetchPlan;
use crate::error::{Error, Result};

/// Pre-sized buffer with one slot per planned page
#[derive(Debug)]
pub struct ResultBuffer<T> {
    plan: FetchPlan,
    items: Vec<Option<T>>,
    filled: Vec<bool>,
}

impl<T> ResultBuffer<T> {
    /// Allocate slots for the first page and every remaining page
    ///
    /// Page metadata comes from the remote service, so an allocation that
    /// cannot be served is an error rather than an abort.
    pub fn new(plan: &FetchPlan) -> Result<Self> {
        let slots = plan.slot_count();
        let len = slots.checked_mul(plan.limit() as usize).ok_or_else(|| {
            Error::capacity(format!(
                "{slots} pages of {} items overflow the result buffer",
                plan.limit()
            ))
        })?;

        let mut items = Vec::new();
        items.try_reserve_exact(len).map_err(|e| {
            Error::capacity(format!("cannot allocate {len} result slots: {e}"))
        })?;
        items.resize_with(len, || None);

        let mut filled = Vec::new();
        filled.try_reserve_exact(slots).map_err(|e| {
            Error::capacity(format!("cannot allocate {slots} page slots: {e}"))
        })?;
        filled.resize(slots, false);

        Ok(Self {
            plan: *plan,
            items,
            filled,
        })
    }

    /// Copy a page's items into its slot
    ///
    /// Fails for pages outside the plan, pages already placed, and pages
    /// holding more items than the slot size.
    pub fn place(&mut self, page: u32, items: Vec<T>) -> Result<()> {
        let offset = self.plan.offset_of(page).ok_or_else(|| {
            Error::placement(
                page,
                format!(
                    "outside of planned pages {}..={}",
                    self.plan.first_page(),
                    self.plan.last_page().max(self.plan.first_page())
                ),
            )
        })?;

        let limit = self.plan.limit() as usize;
        if items.len() > limit {
            return Err(Error::placement(
                page,
                format!("{} items exceed page size {limit}", items.len()),
            ));
        }

        let slot = (page - self.plan.first_page()) as usize;
        if self.filled[slot] {
            return Err(Error::placement(page, "page already placed"));
        }
        self.filled[slot] = true;

        for (target, item) in self.items[offset..offset + items.len()].iter_mut().zip(items) {
            *target = Some(item);
        }
        Ok(())
    }

    /// Number of pages placed so far
    pub fn pages_placed(&self) -> usize {
        self.filled.iter().filter(|f| **f).count()
    }

    /// Ordered items, without the gaps left by short pages
    pub fn into_items(self) -> Vec<T> {
        self.items.into_iter().flatten().collect()
    }
}
