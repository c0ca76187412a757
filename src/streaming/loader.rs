//! Sequential paginated loading with incremental batch delivery.
//!
//! One page is in flight at a time because every page token comes from the
//! previous response. Between fetches the accumulated state, progress and
//! estimate are updated before the batch callback runs, so a render
//! triggered from the callback always sees a consistent snapshot.

use crate::{data::records::GeographicPoint, Error, Result};
use async_trait::async_trait;
use instant::Instant;
use log::{debug, error, info, warn};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

/// Opaque cursor for the next page
pub type PageToken = String;

/// One page of raw records as returned by the backend
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<serde_json::Value>,
    pub next: Option<PageToken>,
    /// Total record count across all pages, when the backend reports it
    pub total_count: Option<u64>,
}

/// Source of pages. `None` requests the first page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, token: Option<&str>) -> Result<Page>;
}

#[async_trait]
impl<F: PageFetcher + ?Sized> PageFetcher for Arc<F> {
    async fn fetch_page(&self, token: Option<&str>) -> Result<Page> {
        (**self).fetch_page(token).await
    }
}

/// Identity of one load session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

impl SessionId {
    pub fn next() -> Self {
        Self(NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Shared abandonment signal, checked between page requests
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub enum LoadStatus {
    Loading,
    Complete,
    /// Loading stopped at a failed page; accumulated points are kept
    Failed(Arc<Error>),
    Cancelled,
}

impl LoadStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadStatus::Loading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Fraction in `[0, 1]`
    Fraction(f64),
    Indeterminate,
}

impl Progress {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Progress::Fraction(f) => Some(f * 100.0),
            Progress::Indeterminate => None,
        }
    }
}

/// Accumulated state of one load session
#[derive(Debug, Clone)]
pub struct StreamState {
    pub session: SessionId,
    pub points_loaded: Vec<GeographicPoint>,
    pub total_expected: Option<u64>,
    pub next_page_token: Option<PageToken>,
    /// Time spent waiting on page fetches, excluding batch callbacks
    pub elapsed: Duration,
    pub pages_fetched: u32,
    /// Records consumed so far, including skipped malformed ones
    pub records_received: u64,
    pub skipped_records: u64,
    pub status: LoadStatus,
}

/// Everything in [`StreamState`] except the points themselves
#[derive(Debug, Clone)]
pub struct StreamSummary {
    pub session: SessionId,
    pub points_loaded: usize,
    pub total_expected: Option<u64>,
    pub pages_fetched: u32,
    pub skipped_records: u64,
    pub elapsed: Duration,
    pub progress: Progress,
    pub eta: Option<Duration>,
    pub status: LoadStatus,
}

impl StreamState {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            points_loaded: Vec::new(),
            total_expected: None,
            next_page_token: None,
            elapsed: Duration::ZERO,
            pages_fetched: 0,
            records_received: 0,
            skipped_records: 0,
            status: LoadStatus::Loading,
        }
    }

    /// Accepted points over the backend's total. Skipped records never count,
    /// so a session with malformed rows completes below 1.0; completion is
    /// signalled by `status`, not by this fraction.
    pub fn progress(&self) -> Progress {
        match self.total_expected {
            Some(total) if total > 0 => Progress::Fraction(
                (self.points_loaded.len() as f64 / total as f64).min(1.0),
            ),
            _ => Progress::Indeterminate,
        }
    }

    /// Pages still to fetch, estimated from the mean page size so far
    pub fn remaining_pages(&self) -> Option<u64> {
        if self.status.is_terminal() {
            return Some(0);
        }
        remaining_pages(self.records_received, self.pages_fetched, self.total_expected)
    }

    pub fn eta(&self) -> Option<Duration> {
        if self.status.is_terminal() {
            return Some(Duration::ZERO);
        }
        estimate_remaining(
            self.elapsed,
            self.pages_fetched,
            self.records_received,
            self.total_expected,
        )
    }

    pub fn summary(&self) -> StreamSummary {
        StreamSummary {
            session: self.session,
            points_loaded: self.points_loaded.len(),
            total_expected: self.total_expected,
            pages_fetched: self.pages_fetched,
            skipped_records: self.skipped_records,
            elapsed: self.elapsed,
            progress: self.progress(),
            eta: self.eta(),
            status: self.status.clone(),
        }
    }
}

fn remaining_pages(received: u64, pages_fetched: u32, total: Option<u64>) -> Option<u64> {
    let total = total?;
    if pages_fetched == 0 || received == 0 {
        return None;
    }
    let mean_page = received as f64 / pages_fetched as f64;
    let left = total.saturating_sub(received) as f64;
    // A non-null next token means at least one more page
    Some(((left / mean_page).ceil() as u64).max(1))
}

/// Remaining time as `(elapsed / pages_fetched) * remaining_pages`.
///
/// Averages over every page fetched so far instead of the latest one, so a
/// single slow or short page does not swing the estimate.
pub fn estimate_remaining(
    elapsed: Duration,
    pages_fetched: u32,
    records_received: u64,
    total: Option<u64>,
) -> Option<Duration> {
    let pages_left = remaining_pages(records_received, pages_fetched, total)?;
    let per_page = elapsed.as_secs_f64() / pages_fetched as f64;
    Some(Duration::from_secs_f64(per_page * pages_left as f64))
}

/// Walks a page chain to exhaustion, delivering each decoded batch.
pub struct StreamingLoader<F> {
    fetcher: F,
    initial_token: Option<PageToken>,
    session: SessionId,
}

impl<F: PageFetcher> StreamingLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            initial_token: None,
            session: SessionId::next(),
        }
    }

    pub fn with_initial_token(mut self, token: impl Into<PageToken>) -> Self {
        self.initial_token = Some(token.into());
        self
    }

    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Fetches every page and returns the final state.
    ///
    /// `on_batch` runs once per page, after the state has absorbed the batch.
    /// Failures and cancellation are reported through `StreamState::status`;
    /// a page that completes after cancellation is discarded.
    pub async fn load_all<C>(&self, cancel: &CancellationFlag, mut on_batch: C) -> StreamState
    where
        C: FnMut(&[GeographicPoint], &StreamState),
    {
        let mut state = StreamState::new(self.session);
        let mut token = self.initial_token.clone();
        info!("load session {} started", self.session.value());

        loop {
            if cancel.is_cancelled() {
                state.status = LoadStatus::Cancelled;
                break;
            }

            let page_number = state.pages_fetched + 1;
            debug!("fetching page {page_number} (token {token:?})");
            let fetch_started = Instant::now();
            let fetched = self.fetcher.fetch_page(token.as_deref()).await;
            state.elapsed += fetch_started.elapsed();

            if cancel.is_cancelled() {
                debug!("discarding page {page_number}, session cancelled while in flight");
                state.status = LoadStatus::Cancelled;
                break;
            }

            let page = match fetched {
                Ok(page) => page,
                Err(e) => {
                    error!("page {page_number} fetch failed: {e}");
                    state.status = LoadStatus::Failed(Arc::new(Error::PageFetch {
                        page: page_number,
                        reason: e.to_string(),
                    }));
                    break;
                }
            };

            let start = state.points_loaded.len();
            let record_count = page.records.len() as u64;
            for record in &page.records {
                match GeographicPoint::from_record(record) {
                    Ok(point) => state.points_loaded.push(point),
                    Err(e) => {
                        warn!("skipping record on page {page_number}: {e}");
                        state.skipped_records += 1;
                    }
                }
            }

            state.records_received += record_count;
            state.pages_fetched = page_number;
            if page.total_count.is_some() {
                state.total_expected = page.total_count;
            }

            if page.next.is_some() && page.next == token {
                state.status = LoadStatus::Failed(Arc::new(Error::PageFetch {
                    page: page_number,
                    reason: "next page token repeats the current one".into(),
                }));
                on_batch(&state.points_loaded[start..], &state);
                break;
            }

            state.next_page_token = page.next.clone();
            if state.next_page_token.is_none() {
                state.status = LoadStatus::Complete;
            }

            on_batch(&state.points_loaded[start..], &state);

            match page.next {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        info!(
            "load session {} finished: {} points over {} pages ({} skipped), status {:?}",
            self.session.value(),
            state.points_loaded.len(),
            state.pages_fetched,
            state.skipped_records,
            state.status
        );
        state
    }

    /// Runs [`Self::load_all`] on the current thread. Only suitable for
    /// fetchers that do not depend on a reactor, such as in-memory pages.
    pub fn load_all_blocking<C>(&self, cancel: &CancellationFlag, on_batch: C) -> StreamState
    where
        C: FnMut(&[GeographicPoint], &StreamState),
    {
        futures::executor::block_on(self.load_all(cancel, on_batch))
    }
}
