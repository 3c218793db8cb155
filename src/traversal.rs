//! Date-window / page-window traversal of one search.
//!
//! The service caps how many results a single search may enumerate, so a
//! date range is walked in windows of `time_delta` days. Each window is paged
//! through until its reported match count is exhausted; sparse windows make
//! the next one wider, and a rejected request halves the current window and
//! retries it from its first page. A rejection of a one-day window abandons
//! that window; the caller decides whether the traversal goes on.
//!
//! ```text
//!   NEW -> PAGING --(window exhausted)--> WINDOWING -> PAGING | DONE
//!            |  ^
//!            v  |
//!        SHRINK_RETRY
//! ```
//!
//! Requests are strictly sequential: the next request always depends on the
//! count and search id returned by the previous one.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_MAX_REQUESTS;
use crate::data_models::{DateWindow, DocumentRecord, PageRange, SearchRequest};
use crate::error::{Error, Result};
use crate::fetcher::{FetchMode, PageFetcher, PageQuery};
use crate::session::SessionContext;
use crate::sink::ResultSink;

/// Hard stops for one traversal, checked before every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalLimits {
    pub max_requests: u64,
    pub max_elapsed: Option<Duration>,
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            max_elapsed: None,
        }
    }
}

/// How finished pages reach the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// One `emit_batch` per page, as soon as the page arrives.
    #[default]
    Eager,
    /// A single `emit_batch` with everything once traversal stops.
    Buffered,
}

/// The documents of one page, tagged with where they came from.
#[derive(Debug, Clone)]
pub struct Batch {
    pub window: DateWindow,
    pub pages: PageRange,
    pub total_matches: u64,
    pub documents: Vec<DocumentRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct TraversalReport {
    pub batches: usize,
    pub documents: usize,
    pub requests: u64,
    /// One entry per window abandoned at the one-day floor.
    pub fatal: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TraversalState {
    pub window: DateWindow,
    pub time_delta: u64,
    pub pages: PageRange,
    /// `None` until the window's first page answers: assume more pages.
    pub total_matches: Option<u64>,
    pub search_id: Option<String>,
    pub more_pages_to_query: bool,
    pub more_days_to_query: bool,
    pub requests_issued: u64,
}

impl TraversalState {
    fn new(request: &SearchRequest) -> Self {
        let time_delta = 1;
        Self {
            window: DateWindow::clamped(request.start_date, time_delta, request.end_date),
            time_delta,
            pages: PageRange::first(request.page_size),
            total_matches: None,
            search_id: None,
            more_pages_to_query: true,
            more_days_to_query: true,
            requests_issued: 0,
        }
    }

    fn reset_pages(&mut self, page_size: u64) {
        self.pages = PageRange::first(page_size);
        self.total_matches = None;
        self.search_id = None;
        self.more_pages_to_query = true;
    }

    /// Halve the window width and restart it. Returns false at the floor.
    fn shrink(&mut self, page_size: u64, end_date: NaiveDate) -> bool {
        // a window clamped at end_date is narrower than time_delta
        let width = self.time_delta.min(self.window.days() as u64);
        if width <= 1 {
            return false;
        }
        self.time_delta = width.div_ceil(2);
        self.window = DateWindow::clamped(self.window.start, self.time_delta, end_date);
        self.reset_pages(page_size);
        true
    }

    /// Move to the next page, or to the next window once this one is exhausted.
    fn advance(&mut self, page_size: u64, end_date: NaiveDate) {
        let total = self.total_matches.unwrap_or(0);
        if total > 0 && self.pages.end < total {
            self.pages = self.pages.next(page_size);
            return;
        }
        self.more_pages_to_query = false;

        if self.window.end >= end_date {
            self.more_days_to_query = false;
            return;
        }
        if total.saturating_mul(2) < page_size {
            self.time_delta += 1;
        }
        self.slide(page_size, end_date);
    }

    /// Give up on the current window and move to the one after it.
    fn skip(&mut self, page_size: u64, end_date: NaiveDate) {
        self.more_pages_to_query = false;
        if self.window.end >= end_date {
            self.more_days_to_query = false;
            return;
        }
        self.slide(page_size, end_date);
    }

    fn slide(&mut self, page_size: u64, end_date: NaiveDate) {
        match self.window.end.checked_add_days(Days::new(1)) {
            Some(next_start) => {
                self.window = DateWindow::clamped(next_start, self.time_delta, end_date);
                self.reset_pages(page_size);
            }
            None => self.more_days_to_query = false,
        }
    }

    fn finish(&mut self) {
        self.more_pages_to_query = false;
        self.more_days_to_query = false;
    }
}

/// One run of a search. Single pass; build a new one to search again.
pub struct Traversal<'a, F: PageFetcher> {
    fetcher: &'a F,
    session: &'a SessionContext,
    request: SearchRequest,
    limits: TraversalLimits,
    cancel: Option<CancellationToken>,
    started: Option<Instant>,
    state: TraversalState,
    // doc ids already delivered for dates up to `seen_through`
    seen: HashSet<String>,
    seen_through: Option<NaiveDate>,
}

impl<'a, F: PageFetcher> Traversal<'a, F> {
    pub fn new(
        fetcher: &'a F,
        session: &'a SessionContext,
        request: SearchRequest,
    ) -> Result<Self> {
        request.validate()?;
        Ok(Self {
            fetcher,
            session,
            state: TraversalState::new(&request),
            request,
            limits: TraversalLimits::default(),
            cancel: None,
            started: None,
            seen: HashSet::new(),
            seen_through: None,
        })
    }

    pub fn with_limits(mut self, limits: TraversalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn state(&self) -> &TraversalState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        !self.state.more_days_to_query
    }

    /// Fetch pages until one succeeds and return its documents, or `None`
    /// once the whole date range has been covered.
    ///
    /// `Error::QueryTooBroad` abandons only the failing one-day window; calling
    /// again resumes with the next one. Any other error ends the traversal.
    pub async fn next_batch(&mut self) -> Result<Option<Batch>> {
        loop {
            if self.is_done() {
                return Ok(None);
            }
            if let Err(e) = self.check_limits() {
                self.state.finish();
                return Err(e);
            }

            let mode = if self.state.pages.is_first() {
                FetchMode::Search
            } else {
                FetchMode::Range
            };
            self.state.requests_issued += 1;
            log::info!(
                "querying for {} - source_id {} - result_start {} - result_end {} - window {} - {:?}",
                self.request.query,
                self.request.source_id,
                self.state.pages.begin,
                self.state.pages.end,
                self.state.window,
                mode
            );

            let query = PageQuery {
                query: &self.request.query,
                source_id: self.request.source_id,
                window: self.state.window,
                pages: self.state.pages,
                search_id: self.state.search_id.as_deref(),
            };
            let page = match self.fetcher.fetch(self.session, mode, &query).await {
                Ok(page) => page,
                Err(e) => {
                    self.state.finish();
                    return Err(e);
                }
            };

            if !page.is_success() {
                let old_delta = self.state.time_delta;
                if self
                    .state
                    .shrink(self.request.page_size, self.request.end_date)
                {
                    log::warn!(
                        "request failed with status {}, narrowing window from {} to {} days",
                        page.status_code,
                        old_delta,
                        self.state.time_delta
                    );
                    continue;
                }
                let window = self.state.window;
                self.state
                    .skip(self.request.page_size, self.request.end_date);
                self.forget_passed_windows();
                log::error!(
                    "request for one-day window {window} failed with status {}, please submit a more specific search",
                    page.status_code
                );
                return Err(Error::QueryTooBroad {
                    window,
                    status: page.status_code,
                });
            }

            // the window's count comes from its search; range pages keep it
            if mode == FetchMode::Search {
                self.state.search_id = page.search_id;
                self.state.total_matches = Some(page.total_matches);
            }
            let total_matches = self.state.total_matches.unwrap_or(0);
            let mut documents = self.deduplicate(page.documents);
            if self.request.fetch_full_text {
                for doc in documents.iter_mut() {
                    doc.full_text = self.fetcher.full_text(self.session, &doc.doc_id).await;
                }
            }
            let batch = Batch {
                window: self.state.window,
                pages: self.state.pages,
                total_matches,
                documents,
            };

            self.state
                .advance(self.request.page_size, self.request.end_date);
            self.forget_passed_windows();
            return Ok(Some(batch));
        }
    }

    /// Drive the traversal to the end, delivering into `sink`.
    ///
    /// Each abandoned window is reported through `on_fatal`, which decides
    /// whether to go on, and listed in the report. Every other error is
    /// returned after buffered documents are flushed.
    pub async fn run<S>(mut self, sink: &mut S, delivery: Delivery) -> Result<TraversalReport>
    where
        S: ResultSink + ?Sized,
    {
        let mut report = TraversalReport::default();
        let mut buffered = Vec::new();

        let outcome = loop {
            match self.next_batch().await {
                Ok(Some(batch)) => {
                    report.batches += 1;
                    report.documents += batch.documents.len();
                    match delivery {
                        Delivery::Eager => sink
                            .emit_batch(&batch.documents)
                            .await
                            .map_err(Error::Sink)?,
                        Delivery::Buffered => buffered.extend(batch.documents),
                    }
                }
                Ok(None) => break Ok(()),
                Err(e @ Error::QueryTooBroad { .. }) => {
                    let reason = e.to_string();
                    let flow = sink.on_fatal(&reason);
                    report.fatal.push(reason);
                    if flow.is_break() {
                        break Ok(());
                    }
                }
                Err(e) => break Err(e),
            }
        };

        if delivery == Delivery::Buffered {
            sink.emit_batch(&buffered).await.map_err(Error::Sink)?;
        }
        report.requests = self.state.requests_issued;
        outcome?;
        Ok(report)
    }

    /// Run to completion and return every document in delivery order.
    /// Fails on the first error, abandoned windows included.
    pub async fn collect(mut self) -> Result<Vec<DocumentRecord>> {
        let mut documents = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            documents.extend(batch.documents);
        }
        Ok(documents)
    }

    /// Lazily yield batches. An abandoned window is yielded as an error and
    /// the stream moves on; any other error ends it.
    pub fn into_stream(self) -> impl Stream<Item = Result<Batch>> + 'a
    where
        F: 'a,
    {
        futures::stream::unfold(self, |mut traversal| async move {
            match traversal.next_batch().await {
                Ok(Some(batch)) => Some((Ok(batch), traversal)),
                Ok(None) => None,
                Err(e) => Some((Err(e), traversal)),
            }
        })
    }

    fn check_limits(&mut self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(Error::Cancelled);
        }
        if self.state.requests_issued >= self.limits.max_requests {
            return Err(Error::RequestLimitExceeded {
                limit: self.limits.max_requests,
            });
        }
        let started = *self.started.get_or_insert_with(Instant::now);
        if let Some(limit) = self.limits.max_elapsed {
            if started.elapsed() > limit {
                return Err(Error::TimeLimitExceeded { limit });
            }
        }
        Ok(())
    }

    /// Drop documents already delivered. Only matters after a shrink-retry,
    /// where the narrower window re-covers dates of the rejected wider one.
    fn deduplicate(&mut self, documents: Vec<DocumentRecord>) -> Vec<DocumentRecord> {
        let received = documents.len();
        let kept: Vec<DocumentRecord> = documents
            .into_iter()
            .filter(|doc| self.seen.insert(doc.doc_id.clone()))
            .collect();
        if kept.len() < received {
            log::debug!("dropped {} already delivered documents", received - kept.len());
        }
        let window_end = self.state.window.end;
        self.seen_through = Some(self.seen_through.map_or(window_end, |d| d.max(window_end)));
        kept
    }

    fn forget_passed_windows(&mut self) {
        if self
            .seen_through
            .is_some_and(|through| self.state.window.start > through)
        {
            self.seen.clear();
            self.seen_through = None;
        }
    }
}
