//! Race-free paginated list engine.
//!
//! One [`PaginatedFetch`] backs one list view. Every trigger (mount, page or size change,
//! filter change, debounced search, refresh) bumps a sequence number at the moment the query
//! changes, and a response is only committed if its sequence number is still the latest. A
//! response that lands between a mutation and the request it schedules is therefore already
//! stale. Stale responses are dropped without touching `records` or `is_loading`.
//!
//! Mutations do not issue requests directly: they mark a flush as scheduled and the flush runs
//! on the next turn of the runtime, so several mutations made back to back produce one request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use radmin_client::ClientError;
use radmin_core::{
    ClientConfig, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE_MS, Filters, ListQuery,
    MAX_PAGE_SIZE, Page, Pagination, clamp_page,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::source::PageSource;

/// Construction inputs for a list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub page_size: u32,
    pub search_debounce: Duration,
    pub filters: Filters,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            filters: Filters::new(),
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            page_size: config.page_size,
            search_debounce: config.search_debounce,
            filters: Filters::new(),
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }
}

/// A failed request as shown to the user. Previously committed records stay in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFailure {
    /// HTTP status, absent for network failures.
    pub status: Option<u16>,
    pub message: String,
}

impl From<&ClientError> for FetchFailure {
    fn from(err: &ClientError) -> Self {
        Self { status: err.status(), message: err.user_message() }
    }
}

/// Observable state of one list view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub records: Vec<Value>,
    pub pagination: Pagination,
    /// True from the moment a request is issued until its response is committed.
    pub is_loading: bool,
    pub last_error: Option<FetchFailure>,
    /// Echo of the search box, updated immediately on every keystroke.
    pub search_term: String,
}

#[derive(Debug)]
struct QueryState {
    page: u32,
    page_size: u32,
    filters: Filters,
    /// Latest raw term, not yet debounced.
    pending_search: String,
    /// Term actually sent upstream; `None` for an empty search.
    applied_search: Option<String>,
    /// Sequence number of the latest query; requests carry the value current when issued.
    seq: u64,
    flush_scheduled: bool,
    /// A reload back to page 1 is outstanding, so the committed page count is outdated.
    reset_pending: bool,
    debounce: Option<JoinHandle<()>>,
}

impl QueryState {
    fn query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            page_size: self.page_size,
            search: self.applied_search.clone(),
            filters: self.filters.clone(),
        }
    }

    fn reset(&mut self) {
        self.page = 1;
        self.reset_pending = true;
    }

    fn cancel_debounce(&mut self) {
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }
}

struct Inner<S: ?Sized> {
    endpoint: String,
    source: Arc<S>,
    search_debounce: Duration,
    state: Mutex<QueryState>,
    view: watch::Sender<PageView>,
}

/// Paginated, filterable, searchable view over one list endpoint.
///
/// Must be created inside a Tokio runtime: construction schedules the initial fetch. Dropping
/// the engine cancels the pending debounce timer, and responses that arrive afterwards are
/// discarded.
pub struct PaginatedFetch<S: PageSource + ?Sized + 'static = dyn PageSource> {
    inner: Arc<Inner<S>>,
}

impl<S: PageSource + ?Sized + 'static> std::fmt::Debug for PaginatedFetch<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedFetch")
            .field("endpoint", &self.inner.endpoint)
            .field("query", &self.query())
            .finish()
    }
}

impl<S: PageSource + ?Sized + 'static> PaginatedFetch<S> {
    /// Mounts a view on `endpoint` and issues the first request for page 1.
    pub fn new(source: Arc<S>, endpoint: impl Into<String>, options: FetchOptions) -> Self {
        let state = QueryState {
            page: 1,
            page_size: options.page_size.clamp(1, MAX_PAGE_SIZE),
            filters: options.filters,
            pending_search: String::new(),
            applied_search: None,
            seq: 0,
            flush_scheduled: false,
            reset_pending: false,
            debounce: None,
        };
        let (view, _) = watch::channel(PageView::default());
        let inner = Arc::new(Inner {
            endpoint: endpoint.into(),
            source,
            search_debounce: options.search_debounce,
            state: Mutex::new(state),
            view,
        });
        inner.schedule(&mut inner.lock());
        Self { inner }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    #[must_use]
    pub fn view(&self) -> PageView {
        self.inner.view.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PageView> {
        self.inner.view.subscribe()
    }

    /// The query the next request would be issued with.
    #[must_use]
    pub fn query(&self) -> ListQuery {
        self.inner.lock().query()
    }

    /// Echoes `term` immediately and applies it once it has been stable for the debounce
    /// interval. A changed term resets the page to 1.
    pub fn handle_search_change(&self, term: impl Into<String>) {
        let term = term.into();
        self.inner.view.send_modify(|view| view.search_term.clone_from(&term));

        let mut state = self.inner.lock();
        state.pending_search = term;
        state.cancel_debounce();
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.search_debounce;
        state.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.apply_search();
            }
        }));
    }

    /// Moves to `page`. Returns `false` (and issues nothing) when the page is outside
    /// `1..=total_pages` or already current, or while a filter, search or size change is
    /// still reloading: the page count shown then belongs to the previous result set.
    pub fn handle_page_change(&self, page: u32) -> bool {
        let mut state = self.inner.lock();
        if state.reset_pending {
            tracing::debug!(page, "page change ignored until the reloaded result set arrives");
            return false;
        }
        let total_pages = self.inner.view.borrow().pagination.total_pages;
        if page < 1 || page > total_pages {
            tracing::debug!(page, total_pages, "page change out of range ignored");
            return false;
        }
        if state.page == page {
            return false;
        }
        state.page = page;
        self.inner.schedule(&mut state);
        true
    }

    /// Changes the page size and returns to page 1. Zero and the current size are ignored.
    pub fn handle_items_per_page_change(&self, page_size: u32) -> bool {
        let page_size = page_size.min(MAX_PAGE_SIZE);
        let mut state = self.inner.lock();
        if page_size == 0 || page_size == state.page_size {
            return false;
        }
        state.page_size = page_size;
        state.reset();
        self.inner.schedule(&mut state);
        true
    }

    /// Replaces the filters. Compared by value, so passing an equal set built from scratch
    /// changes nothing; any real change resets the page to 1.
    pub fn set_filters(&self, filters: Filters) -> bool {
        let mut state = self.inner.lock();
        if filters.canonical_key() == state.filters.canonical_key() {
            return false;
        }
        state.filters = filters;
        state.reset();
        self.inner.schedule(&mut state);
        true
    }

    /// Sets filters and search together without debouncing; one request at most.
    pub fn update(&self, filters: Filters, search: &str) -> bool {
        self.inner.view.send_modify(|view| search.clone_into(&mut view.search_term));
        let applied = normalize_search(search);

        let mut state = self.inner.lock();
        state.cancel_debounce();
        search.clone_into(&mut state.pending_search);
        let changed = filters.canonical_key() != state.filters.canonical_key()
            || applied != state.applied_search;
        if changed {
            state.filters = filters;
            state.applied_search = applied;
            state.reset();
            self.inner.schedule(&mut state);
        }
        changed
    }

    /// Clears every filter and the search term.
    pub fn clear_all(&self) -> bool {
        self.update(Filters::new(), "")
    }

    /// Re-issues the current query without resetting anything.
    pub fn refresh_data(&self) {
        self.inner.schedule(&mut self.inner.lock());
    }

    /// Resolves once no request is outstanding and no flush or debounce is pending.
    pub async fn settled(&self) {
        let mut rx = self.inner.view.subscribe();
        while self.inner.is_busy() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl<S: PageSource + ?Sized + 'static> Drop for PaginatedFetch<S> {
    fn drop(&mut self) {
        self.inner.lock().cancel_debounce();
    }
}

impl<S: PageSource + ?Sized + 'static> Inner<S> {
    fn lock(&self) -> MutexGuard<'_, QueryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_busy(&self) -> bool {
        let pending = {
            let state = self.lock();
            state.flush_scheduled || state.debounce.as_ref().is_some_and(|h| !h.is_finished())
        };
        pending || self.view.borrow().is_loading
    }

    /// Invalidates responses still in flight and arranges for exactly one request to be
    /// issued on the next runtime turn.
    fn schedule(self: &Arc<Self>, state: &mut QueryState) {
        if state.flush_scheduled {
            return;
        }
        state.seq += 1;
        state.flush_scheduled = true;
        let weak = Arc::downgrade(self);
        tokio::spawn(Self::flush(weak));
    }

    async fn flush(weak: Weak<Self>) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let (seq, query) = inner.begin();
        let source = Arc::clone(&inner.source);
        let endpoint = inner.endpoint.clone();
        drop(inner);

        tracing::debug!(%endpoint, seq, page = query.page, "issuing list request");
        let result = source.fetch_page(&endpoint, &query).await;

        if let Some(inner) = weak.upgrade() {
            inner.commit(seq, result);
        }
    }

    fn begin(&self) -> (u64, ListQuery) {
        let mut state = self.lock();
        state.flush_scheduled = false;
        self.view.send_modify(|view| view.is_loading = true);
        (state.seq, state.query())
    }

    fn commit(self: &Arc<Self>, seq: u64, result: Result<Page, ClientError>) {
        let mut state = self.lock();
        if seq != state.seq {
            tracing::debug!(endpoint = %self.endpoint, seq, latest = state.seq, "discarding stale response");
            return;
        }
        state.reset_pending = false;
        match result {
            Ok(page) => {
                let total_pages = page.pagination.total_pages;
                let clamped = clamp_page(state.page, total_pages);
                if state.page > clamped {
                    state.page = clamped;
                    tracing::debug!(page = state.page, total_pages, "result set shrank, clamping page");
                    self.schedule(&mut state);
                    return;
                }
                self.view.send_modify(|view| {
                    view.records = page.records;
                    view.pagination = page.pagination;
                    view.is_loading = false;
                    view.last_error = None;
                });
            },
            Err(ClientError::SessionExpired) => {
                self.view.send_modify(|view| view.is_loading = false);
            },
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "list request failed");
                let failure = FetchFailure::from(&e);
                self.view.send_modify(|view| {
                    view.is_loading = false;
                    view.last_error = Some(failure);
                });
            },
        }
    }

    fn apply_search(self: &Arc<Self>) {
        let mut state = self.lock();
        state.debounce = None;
        let applied = normalize_search(&state.pending_search);
        if applied == state.applied_search {
            // Wake `settled` waiters even though nothing is sent.
            self.view.send_modify(|_| {});
            return;
        }
        state.applied_search = applied;
        state.reset();
        self.schedule(&mut state);
    }
}

fn normalize_search(term: &str) -> Option<String> {
    let term = term.trim();
    (!term.is_empty()).then(|| term.to_owned())
}
