//! Range scanner driving a [`PageSource`] through a [`ConcurrencyGate`].
//!
//! Every boundary mode is built from two traversals:
//!
//! - a forward walk from a start page that stops when the listing stops
//!   advancing (two consecutive pages with the same leading item, where two
//!   empty pages in a row count as the same), when a boundary identifier is
//!   found, or at an optional page ceiling;
//! - a bounded walk over an explicit page range that visits every page once
//!   and reports `visited / total` progress.
//!
//! A scan is sequential: whether page `i + 1` is fetched depends on page `i`.
//! The gate only matters across scans sharing it.

use crate::gate::ConcurrencyGate;
use crate::progress::{ProgressTracker, TrackedProgress};
use crate::request::{Batch, ScanRequest, ScanResult, StopReason};
use crate::slicing::{contains_id, slice_between_ids, slice_since_id, slice_till_id};
use crate::task::ScanTask;
use pagewalk_core::{
    AppConfig, DocumentRequest, DocumentSource, ItemId, Listing, ListingItem, PageSource,
    SourceResult, Timestamp,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default rounding for progress values read through a [`ScanTask`].
const DEFAULT_PROGRESS_DECIMALS: u32 = 2;

/// Retrieves sub-ranges of paginated listings.
///
/// Cloning is cheap; clones share the source, the gate and the tracker.
pub struct RangeScanner<S> {
    source: Arc<S>,
    gate: Arc<ConcurrencyGate>,
    tracker: ProgressTracker,
    progress_decimals: u32,
}

impl<S> Clone for RangeScanner<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            gate: Arc::clone(&self.gate),
            tracker: self.tracker.clone(),
            progress_decimals: self.progress_decimals,
        }
    }
}

impl<S: PageSource + 'static> RangeScanner<S> {
    /// Create a scanner with its own gate (0 = unlimited) and tracker.
    #[must_use]
    pub fn new(source: S, max_concurrent_requests: usize) -> Self {
        Self::with_shared(
            Arc::new(source),
            Arc::new(ConcurrencyGate::new(max_concurrent_requests)),
            ProgressTracker::new(),
        )
    }

    /// Create a scanner from application configuration.
    #[must_use]
    pub fn from_config(source: S, config: &AppConfig) -> Self {
        Self::new(source, config.requests.max_concurrent_requests)
            .with_progress_decimals(config.progress.decimal_places)
    }

    /// Create a scanner sharing a gate and tracker with other scanners.
    #[must_use]
    pub fn with_shared(
        source: Arc<S>,
        gate: Arc<ConcurrencyGate>,
        tracker: ProgressTracker,
    ) -> Self {
        Self {
            source,
            gate,
            tracker,
            progress_decimals: DEFAULT_PROGRESS_DECIMALS,
        }
    }

    /// Set the rounding applied by [`ScanTask::progress`].
    #[must_use]
    pub fn with_progress_decimals(mut self, decimal_places: u32) -> Self {
        self.progress_decimals = decimal_places;
        self
    }

    /// The page source.
    #[must_use]
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// The gate every fetch goes through.
    #[must_use]
    pub fn gate(&self) -> &Arc<ConcurrencyGate> {
        &self.gate
    }

    /// The tracker tracked scans report to.
    #[must_use]
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Current limit on in-flight fetches (0 = unlimited).
    #[must_use]
    pub fn max_concurrent_requests(&self) -> usize {
        self.gate.max_concurrency()
    }

    /// Change the limit on in-flight fetches (0 = unlimited).
    pub fn set_max_concurrent_requests(&self, max: usize) {
        self.gate.set_max_concurrency(max);
    }

    /// Run a scan on the tokio runtime with progress tracking.
    ///
    /// The progress entry exists from this call until the scan stops and is
    /// removed even if the task is aborted.
    pub fn spawn(&self, listing: Listing, request: ScanRequest) -> ScanTask<S::Item> {
        let scanner = self.clone();
        let progress = self.tracker.track();
        let handle = progress.handle();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            scanner.run(&listing, &request, Some(&progress), &token).await
        });

        ScanTask::new(
            handle,
            self.tracker.clone(),
            self.progress_decimals,
            cancel,
            join,
        )
    }

    /// Run a scan inline, without progress tracking.
    pub async fn execute(
        &self,
        listing: &Listing,
        request: &ScanRequest,
        cancel: &CancellationToken,
    ) -> ScanResult<S::Item> {
        self.run(listing, request, None, cancel).await
    }

    /// Run several scans concurrently; results are in job order.
    ///
    /// All fetches share this scanner's gate.
    pub async fn execute_many(
        &self,
        jobs: &[(Listing, ScanRequest)],
        cancel: &CancellationToken,
    ) -> Vec<ScanResult<S::Item>> {
        futures::future::join_all(
            jobs.iter()
                .map(|(listing, request)| self.execute(listing, request, cancel)),
        )
        .await
    }

    /// Items from `from_page` (default 1) up to and including `to_id`.
    pub async fn scan_till_id(
        &self,
        listing: &Listing,
        to_id: impl Into<ItemId>,
        from_page: Option<u32>,
    ) -> ScanResult<S::Item> {
        let request = ScanRequest::TillId {
            to_id: to_id.into(),
            from_page,
        };
        self.execute(listing, &request, &CancellationToken::new()).await
    }

    /// `from_id` and everything after it, searching for it before `to_page`.
    pub async fn scan_since_id(
        &self,
        listing: &Listing,
        from_id: impl Into<ItemId>,
        to_page: Option<u32>,
    ) -> ScanResult<S::Item> {
        let request = ScanRequest::SinceId {
            from_id: from_id.into(),
            to_page,
        };
        self.execute(listing, &request, &CancellationToken::new()).await
    }

    /// Items from `from_id` through `to_id`.
    pub async fn scan_between_ids(
        &self,
        listing: &Listing,
        from_id: impl Into<ItemId>,
        to_id: impl Into<ItemId>,
        from_page: Option<u32>,
        to_page: Option<u32>,
    ) -> ScanResult<S::Item> {
        let request = ScanRequest::BetweenIds {
            from_id: from_id.into(),
            to_id: to_id.into(),
            from_page,
            to_page,
        };
        self.execute(listing, &request, &CancellationToken::new()).await
    }

    /// Pages `1..=to_page`.
    pub async fn scan_till_page(&self, listing: &Listing, to_page: u32) -> ScanResult<S::Item> {
        let request = ScanRequest::TillPage { to_page };
        self.execute(listing, &request, &CancellationToken::new()).await
    }

    /// Pages from `from_page` until the listing stops advancing.
    pub async fn scan_since_page(&self, listing: &Listing, from_page: u32) -> ScanResult<S::Item> {
        let request = ScanRequest::SincePage { from_page };
        self.execute(listing, &request, &CancellationToken::new()).await
    }

    /// Pages `from_page..=to_page`, in either direction.
    pub async fn scan_between_pages(
        &self,
        listing: &Listing,
        from_page: u32,
        to_page: u32,
    ) -> ScanResult<S::Item> {
        let request = ScanRequest::BetweenPages { from_page, to_page };
        self.execute(listing, &request, &CancellationToken::new()).await
    }

    /// A single page.
    pub async fn scan_one_page(&self, listing: &Listing, page: u32) -> ScanResult<S::Item> {
        let request = ScanRequest::OnePage { page };
        self.execute(listing, &request, &CancellationToken::new()).await
    }

    async fn run(
        &self,
        listing: &Listing,
        request: &ScanRequest,
        progress: Option<&TrackedProgress>,
        cancel: &CancellationToken,
    ) -> ScanResult<S::Item> {
        if let Err(error) = request.validate() {
            tracing::error!(listing = %listing, mode = request.mode(), "{}", error);
            return ScanResult::rejected(error);
        }

        info!(listing = %listing, mode = request.mode(), "starting scan");
        let started_at = Timestamp::now();
        let mut walk = Walk::new(cancel, progress);

        let stop = match request {
            ScanRequest::TillId { to_id, from_page } => {
                self.till_id(&mut walk, listing, to_id, start_page(*from_page))
                    .await
            }
            ScanRequest::SinceId { from_id, to_page } => {
                self.since_id(&mut walk, listing, from_id, ceiling(*to_page))
                    .await
            }
            ScanRequest::BetweenIds {
                from_id,
                to_id,
                from_page,
                to_page,
            } => {
                let first = start_page(*from_page);
                let last = ceiling(*to_page);
                match (*from_page, last) {
                    (Some(from), Some(to)) if from >= 1 && to > from => {
                        walk.plan(ProgressPlan::Span {
                            first: from,
                            total: to - from,
                        });
                    }
                    _ => {
                        if progress.is_some() {
                            warn!(
                                listing = %listing,
                                "no page range given, progress can not be calculated"
                            );
                        }
                    }
                }
                self.between_ids(&mut walk, listing, from_id, to_id, first, last)
                    .await
            }
            ScanRequest::TillPage { to_page } => {
                self.page_range(&mut walk, listing, 1, *to_page).await
            }
            ScanRequest::SincePage { from_page } => {
                self.since_page(&mut walk, listing, *from_page).await
            }
            ScanRequest::BetweenPages { from_page, to_page } => {
                self.page_range(&mut walk, listing, *from_page, *to_page)
                    .await
            }
            ScanRequest::OnePage { page } => self.one_page(&mut walk, listing, *page).await,
        };

        let result = walk.finish(stop, started_at);
        info!(
            listing = %listing,
            mode = request.mode(),
            pages = result.pages_visited,
            batches = result.batches.len(),
            items = result.item_count(),
            stop = ?result.stop,
            "scan finished"
        );
        result
    }

    /// Forward walk keeping whole pages until `to_id` is found.
    async fn till_id(
        &self,
        walk: &mut Walk<'_, S::Item>,
        listing: &Listing,
        to_id: &ItemId,
        first: u32,
    ) -> StopReason {
        let mut page = first;
        let mut convergence = Convergence::default();
        loop {
            let Some(batch) = self.visit(walk, listing, page).await else {
                return StopReason::Cancelled;
            };
            if !convergence.advanced(&batch) {
                return StopReason::Converged;
            }
            if contains_id(&batch, to_id) {
                walk.keep(slice_till_id(batch, to_id));
                return StopReason::Truncated;
            }
            walk.keep(batch);
            page = match next_page(page) {
                Some(next) => next,
                None => return StopReason::PageCeiling,
            };
        }
    }

    /// Locate `from_id`, then keep everything from it onwards.
    async fn since_id(
        &self,
        walk: &mut Walk<'_, S::Item>,
        listing: &Listing,
        from_id: &ItemId,
        ceiling: Option<u32>,
    ) -> StopReason {
        let (mut page, located) = match self.locate(walk, listing, from_id, 1, ceiling).await {
            Ok(found) => found,
            Err(stop) => return stop,
        };

        let mut pending = Some(located);
        let mut convergence = Convergence::default();
        loop {
            let batch = match pending.take() {
                Some(batch) => batch,
                None => match self.visit(walk, listing, page).await {
                    Some(batch) => batch,
                    None => return StopReason::Cancelled,
                },
            };
            if !convergence.advanced(&batch) {
                return StopReason::Converged;
            }
            walk.keep(slice_since_id(batch, from_id));
            page = match next_page(page) {
                Some(next) => next,
                None => return StopReason::PageCeiling,
            };
        }
    }

    /// Locate `from_id`, then keep pages until the one holding `to_id`.
    async fn between_ids(
        &self,
        walk: &mut Walk<'_, S::Item>,
        listing: &Listing,
        from_id: &ItemId,
        to_id: &ItemId,
        first: u32,
        ceiling: Option<u32>,
    ) -> StopReason {
        let (mut page, located) = match self.locate(walk, listing, from_id, first, None).await {
            Ok(found) => found,
            Err(stop) => return stop,
        };

        let mut pending = Some(located);
        let mut convergence = Convergence::default();
        loop {
            if reached(ceiling, page) {
                return StopReason::PageCeiling;
            }
            let batch = match pending.take() {
                Some(batch) => batch,
                None => match self.visit(walk, listing, page).await {
                    Some(batch) => batch,
                    None => return StopReason::Cancelled,
                },
            };
            if !convergence.advanced(&batch) {
                return StopReason::Converged;
            }
            if contains_id(&batch, to_id) {
                walk.keep(slice_between_ids(batch, from_id, to_id));
                return StopReason::Truncated;
            }
            // No cut without the end boundary, even on the located page
            walk.keep(batch);
            page = match next_page(page) {
                Some(next) => next,
                None => return StopReason::PageCeiling,
            };
        }
    }

    /// Forward walk keeping whole pages until the listing stops advancing.
    async fn since_page(
        &self,
        walk: &mut Walk<'_, S::Item>,
        listing: &Listing,
        first: u32,
    ) -> StopReason {
        let mut page = first;
        let mut convergence = Convergence::default();
        loop {
            let Some(batch) = self.visit(walk, listing, page).await else {
                return StopReason::Cancelled;
            };
            if !convergence.advanced(&batch) {
                return StopReason::Converged;
            }
            walk.keep(batch);
            page = match next_page(page) {
                Some(next) => next,
                None => return StopReason::PageCeiling,
            };
        }
    }

    /// Forward walk that only looks for the page holding `id`.
    ///
    /// Returns the page number and its batch, or the reason the search
    /// stopped without finding it.
    async fn locate(
        &self,
        walk: &mut Walk<'_, S::Item>,
        listing: &Listing,
        id: &ItemId,
        first: u32,
        ceiling: Option<u32>,
    ) -> Result<(u32, Batch<S::Item>), StopReason> {
        let mut page = first;
        let mut convergence = Convergence::default();
        loop {
            if reached(ceiling, page) {
                debug!(listing = %listing, page, id = %id, "page ceiling reached before locating id");
                return Err(StopReason::PageCeiling);
            }
            let Some(batch) = self.visit(walk, listing, page).await else {
                return Err(StopReason::Cancelled);
            };
            if !convergence.advanced(&batch) {
                debug!(listing = %listing, page, id = %id, "listing ended before locating id");
                return Err(StopReason::Converged);
            }
            if contains_id(&batch, id) {
                debug!(listing = %listing, page, id = %id, "located id");
                return Ok((page, batch));
            }
            page = next_page(page).ok_or(StopReason::PageCeiling)?;
        }
    }

    /// Visit every page between `from` and `to` inclusive, in either direction.
    async fn page_range(
        &self,
        walk: &mut Walk<'_, S::Item>,
        listing: &Listing,
        from: u32,
        to: u32,
    ) -> StopReason {
        let span = from.abs_diff(to);
        walk.plan(ProgressPlan::Count {
            total: span.saturating_add(1),
        });

        for step in 0..=span {
            let page = if from <= to { from + step } else { from - step };
            let Some(batch) = self.visit(walk, listing, page).await else {
                return StopReason::Cancelled;
            };
            walk.keep(batch);
        }
        StopReason::RangeExhausted
    }

    async fn one_page(
        &self,
        walk: &mut Walk<'_, S::Item>,
        listing: &Listing,
        page: u32,
    ) -> StopReason {
        let Some(batch) = self.visit(walk, listing, start_page(Some(page))).await else {
            return StopReason::Cancelled;
        };
        walk.keep(batch);
        StopReason::SinglePage
    }

    /// Fetch one page through the gate.
    ///
    /// A failed fetch is logged and read as an empty batch. Returns `None`
    /// only when the scan was cancelled while waiting.
    async fn visit(
        &self,
        walk: &mut Walk<'_, S::Item>,
        listing: &Listing,
        page: u32,
    ) -> Option<Batch<S::Item>> {
        let permit = tokio::select! {
            biased;
            () = walk.cancel.cancelled() => return None,
            permit = self.gate.acquire() => permit,
        };
        let fetched = tokio::select! {
            biased;
            () = walk.cancel.cancelled() => return None,
            fetched = self.source.fetch_page(listing, page) => fetched,
        };
        drop(permit);

        let batch = match fetched {
            Ok(fetched) => {
                debug!(listing = %listing, page, items = fetched.len(), "fetched page");
                fetched.items
            }
            Err(e) => {
                warn!("Fetch failed for page {} of {}: {}", page, listing, e);
                Vec::new()
            }
        };
        walk.visited(page);
        Some(batch)
    }
}

impl<S: DocumentSource + 'static> RangeScanner<S> {
    /// Fetch a single read-only document through the gate.
    ///
    /// The permit is held for the whole fetch, so documents and scan pages
    /// count against the same limit. Failures are returned to the caller.
    pub async fn fetch_document(&self, request: &DocumentRequest) -> SourceResult<String> {
        let permit = self.gate.acquire().await;
        let fetched = self.source.fetch_document(request).await;
        drop(permit);

        match &fetched {
            Ok(html) => debug!(document = %request, bytes = html.len(), "fetched document"),
            Err(e) => warn!("Fetch failed for {}: {}", request, e),
        }
        fetched
    }
}

/// How progress is derived for the current scan.
#[derive(Debug, Clone, Copy)]
enum ProgressPlan {
    /// `visited / total`, for explicit page ranges.
    Count { total: u32 },
    /// Position of the current page within `[first, first + total)`.
    Span { first: u32, total: u32 },
}

/// Mutable state of one scan.
struct Walk<'a, T> {
    cancel: &'a CancellationToken,
    progress: Option<&'a TrackedProgress>,
    plan: Option<ProgressPlan>,
    batches: Vec<Batch<T>>,
    pages_visited: u32,
}

impl<'a, T> Walk<'a, T> {
    fn new(cancel: &'a CancellationToken, progress: Option<&'a TrackedProgress>) -> Self {
        Self {
            cancel,
            progress,
            plan: None,
            batches: Vec::new(),
            pages_visited: 0,
        }
    }

    fn plan(&mut self, plan: ProgressPlan) {
        self.plan = Some(plan);
    }

    /// Store a batch; batches without items are not part of the result.
    fn keep(&mut self, batch: Batch<T>) {
        if !batch.is_empty() {
            self.batches.push(batch);
        }
    }

    fn visited(&mut self, page: u32) {
        self.pages_visited = self.pages_visited.saturating_add(1);

        let (Some(progress), Some(plan)) = (self.progress, self.plan) else {
            return;
        };
        let (done, total) = match plan {
            ProgressPlan::Count { total } => (self.pages_visited, total),
            ProgressPlan::Span { first, total } => {
                (page.saturating_sub(first).saturating_add(1), total)
            }
        };
        if total > 0 {
            let percent = f64::from(done) / f64::from(total) * 100.0;
            progress.set(percent.min(100.0));
        }
    }

    fn finish(self, stop: StopReason, started_at: Timestamp) -> ScanResult<T> {
        ScanResult {
            batches: self.batches,
            stop,
            pages_visited: self.pages_visited,
            started_at,
            finished_at: Timestamp::now(),
        }
    }
}

/// Detects a listing that stopped advancing by comparing leading items.
///
/// A page without items has no leading item. Before the first page the
/// previous leading item is also "none", so an empty first page or two
/// empty pages in a row stop the walk, while a single empty or failed page
/// between two populated ones does not.
#[derive(Debug, Default)]
struct Convergence {
    last: Option<ItemId>,
}

impl Convergence {
    /// Record `batch`; `false` if its leading item equals the previous one.
    fn advanced<T: ListingItem>(&mut self, batch: &[T]) -> bool {
        let leading = batch.first().map(ListingItem::item_id);
        if leading == self.last {
            return false;
        }
        self.last = leading;
        true
    }
}

/// Optional start page; missing or 0 means page 1.
fn start_page(page: Option<u32>) -> u32 {
    match page {
        Some(page) if page >= 1 => page,
        _ => 1,
    }
}

/// Optional exclusive ceiling; missing or 0 means none.
fn ceiling(page: Option<u32>) -> Option<u32> {
    page.filter(|page| *page >= 1)
}

fn reached(ceiling: Option<u32>, page: u32) -> bool {
    ceiling.is_some_and(|ceiling| page >= ceiling)
}

fn next_page(page: u32) -> Option<u32> {
    page.checked_add(1)
}
