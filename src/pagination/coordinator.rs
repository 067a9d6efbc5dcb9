//! Bounded parallel page fetching
//!
//! After the first page arrives the remaining pages are fetched by tasks
//! admitted through a semaphore, so at most `concurrency` requests are in
//! flight. Tasks report to one channel; only the collecting loop writes the
//! result buffer. The first failed page ends the call.

use super::assembler::ResultBuffer;
use super::executor::PageExecutor;
use super::planner::{plan, FetchPlan};
use super::types::{Page, PageRequest, PagedItems};
use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What happens to in-flight pages once one page has failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnPageError {
    /// Let admitted pages finish and drop their results; admit nothing new
    #[default]
    Detach,
    /// Abort admitted pages and admit nothing new
    Cancel,
}

/// Options for a paginated fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// In-flight pages after the first failure
    pub on_error: OnPageError,
}

impl FetchOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel in-flight pages on the first failure
    #[must_use]
    pub fn cancel_on_error(mut self) -> Self {
        self.on_error = OnPageError::Cancel;
        self
    }
}

// A page task's report to the collector.
struct PageOutcome<T> {
    page: u32,
    result: Result<Page<T>>,
}

/// Fetch the page `request` points at, then every page after it
///
/// Pages after the first are fetched in parallel when
/// `request.parallel_count()` is above zero; otherwise only the first page
/// is returned. Items come back in page order.
pub async fn fetch_all_pages<R, E>(request: R, executor: Arc<E>) -> Result<PagedItems<E::Item>>
where
    R: PageRequest,
    E: PageExecutor<R>,
{
    fetch_all_pages_with(request, executor, FetchOptions::default()).await
}

/// [`fetch_all_pages`] with explicit options
pub async fn fetch_all_pages_with<R, E>(
    request: R,
    executor: Arc<E>,
    options: FetchOptions,
) -> Result<PagedItems<E::Item>>
where
    R: PageRequest,
    E: PageExecutor<R>,
{
    let concurrency = request.parallel_count();
    let first = executor.execute(request.clone()).await?;
    let meta = first.meta.normalized();

    let items = fetch_all(
        request,
        Page::new(first.items, meta),
        executor,
        concurrency,
        options,
    )
    .await?;

    Ok(PagedItems { items, meta })
}

/// Fetch the pages after `first` and assemble every item in page order
///
/// A `concurrency` of 0 disables parallel fetching and returns the first
/// page's items unchanged. Errors from page fetches are returned as they
/// are; the first one observed wins.
pub async fn fetch_all<R, E>(
    base: R,
    first: Page<E::Item>,
    executor: Arc<E>,
    concurrency: usize,
    options: FetchOptions,
) -> Result<Vec<E::Item>>
where
    R: PageRequest,
    E: PageExecutor<R>,
{
    if concurrency == 0 {
        debug!("Parallel fetching disabled, returning first page only");
        return Ok(first.items);
    }

    let plan = plan(&first.meta)?;
    if plan.is_empty() {
        debug!(
            "Page {} is the last page ({} total), nothing left to fetch",
            plan.first_page(),
            first.meta.total
        );
        return Ok(first.items);
    }

    debug!(
        "Fetching pages {}..={} ({} remaining), up to {} at once",
        plan.first_page() + 1,
        plan.last_page(),
        plan.remaining(),
        concurrency
    );

    let mut buffer = ResultBuffer::new(&plan)?;
    buffer.place(plan.first_page(), first.items)?;

    // More permits than pages would never be used.
    let (tx, rx) = mpsc::channel(plan.remaining());
    let gate = Arc::new(Semaphore::new(concurrency.min(plan.remaining())));
    let cancel = CancellationToken::new();

    tokio::spawn(dispatch(
        plan,
        base,
        executor,
        gate,
        tx,
        cancel.clone(),
    ));

    let result = collect(plan, buffer, rx).await;
    if result.is_err() && options.on_error == OnPageError::Cancel {
        debug!("Cancelling in-flight pages");
        cancel.cancel();
    }
    result
}

// Admits one task per planned page, ascending, while the gate has room.
async fn dispatch<R, E>(
    plan: FetchPlan,
    base: R,
    executor: Arc<E>,
    gate: Arc<Semaphore>,
    tx: mpsc::Sender<PageOutcome<E::Item>>,
    cancel: CancellationToken,
) where
    R: PageRequest,
    E: PageExecutor<R>,
{
    for page in plan.pages() {
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            permit = Arc::clone(&gate).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        // Collector is gone: a page failed or the caller dropped the call.
        if tx.is_closed() {
            debug!("Collection finished, not dispatching page {page} onwards");
            break;
        }

        let mut request = base.clone();
        request.set_page(page);

        let executor = Arc::clone(&executor);
        let tx = tx.clone();
        let cancel = cancel.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("Page {page} cancelled");
                    return;
                }
                result = executor.execute(request) => result,
            };
            // Fails only when the collector already returned.
            let _ = tx.send(PageOutcome { page, result }).await;
            drop(permit);
        });
    }
}

async fn collect<T>(
    plan: FetchPlan,
    mut buffer: ResultBuffer<T>,
    mut rx: mpsc::Receiver<PageOutcome<T>>,
) -> Result<Vec<T>> {
    let expected = plan.remaining();

    for received in 0..expected {
        let Some(outcome) = rx.recv().await else {
            return Err(Error::task(format!(
                "{} of {expected} pages ended without a result",
                expected - received
            )));
        };

        match outcome.result {
            Ok(page) => {
                let number = if page.meta.page == 0 {
                    outcome.page
                } else {
                    page.meta.page
                };
                buffer.place(number, page.items)?;
            }
            Err(e) => {
                warn!(
                    "Page {} failed, dropping {} outstanding page(s): {}",
                    outcome.page,
                    expected - received - 1,
                    e
                );
                return Err(e);
            }
        }
    }

    debug!("Assembled {} pages", buffer.pages_placed());
    Ok(buffer.into_items())
}
