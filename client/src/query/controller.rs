//! Generic paginated-query controller.
//!
//! One controller drives one list view: it debounces raw search input,
//! keys the cache off the sanitised filters, keeps stale data visible
//! while refetching, clamps the page when the collection shrinks, and
//! enforces last-request-wins ordering by aborting the prior in-flight
//! fetch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use pagination::{clamp_page, Page, PageMeta, PageRequest, SearchTerm};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::error::ApiError;
use crate::query::cache::QueryCache;
use crate::query::keys::QueryKeys;

/// Default quiet window before a search commit.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Driven port producing one validated page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page under the given filters.
    async fn fetch_page(
        &self,
        request: PageRequest,
        search: Option<&SearchTerm>,
    ) -> Result<Page<Value>, ApiError>;
}

/// Read-only snapshot of controller state.
#[derive(Debug, Clone)]
pub struct QueryView {
    pub page: u64,
    pub per_page: u64,
    pub items: Vec<Value>,
    pub meta: Option<PageMeta>,
    pub error: Option<ApiError>,
    /// First load in progress, nothing to show yet.
    pub is_loading: bool,
    /// Any fetch in progress, including background refetches.
    pub is_fetching: bool,
}

impl QueryView {
    /// Settled with nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.is_loading && !self.is_fetching && self.items.is_empty()
    }

    /// Decode the raw items into entity records.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when an item does not match the
    /// expected record shape.
    pub fn items_as<T: DeserializeOwned>(&self) -> Result<Vec<T>, ApiError> {
        self.items
            .iter()
            .map(|item| serde_json::from_value(item.clone()))
            .collect::<Result<Vec<T>, _>>()
            .map_err(|error| ApiError::decode(error.to_string()))
    }
}

struct ControllerState {
    page: u64,
    per_page: u64,
    raw_search: Option<String>,
    committed_search: Option<SearchTerm>,
    items: Vec<Value>,
    meta: Option<PageMeta>,
    error: Option<ApiError>,
    loading: bool,
    fetching: bool,
    generation: u64,
    fetch_task: Option<JoinHandle<()>>,
    debounce_task: Option<JoinHandle<()>>,
}

struct Inner {
    fetcher: Arc<dyn PageFetcher>,
    keys: QueryKeys,
    cache: Arc<QueryCache>,
    enabled: Arc<dyn Fn() -> bool + Send + Sync>,
    debounce: Duration,
    state: Mutex<ControllerState>,
    revision: watch::Sender<u64>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn start_fetch(self: &Arc<Self>, force: bool) {
        if !(self.enabled)() {
            debug!("query disabled; fetch suspended");
            return;
        }

        {
            let mut state = self.lock_state();
            let Ok(request) = PageRequest::new(state.page, state.per_page) else {
                return;
            };
            let search = state.committed_search.clone();
            let key = self.keys.list(search.as_ref(), request);

            let mut fresh_hit = false;
            if !force {
                if let Some((page, fresh)) = self.cache.get_page(&key) {
                    // Cached results render immediately; stale ones stay
                    // visible while the refetch runs.
                    state.items = page.items;
                    state.meta = Some(page.meta);
                    state.error = None;
                    state.loading = false;
                    fresh_hit = fresh;
                }
            }

            if fresh_hit {
                state.fetching = false;
            } else {
                state.generation += 1;
                let generation = state.generation;
                state.fetching = true;
                state.loading = state.meta.is_none() && state.items.is_empty();

                // Last request wins: the prior in-flight fetch is aborted
                // so a slow, stale response cannot overwrite newer results.
                if let Some(task) = state.fetch_task.take() {
                    task.abort();
                }

                let inner = Arc::clone(self);
                let handle = tokio::spawn(async move {
                    let result = inner.fetcher.fetch_page(request, search.as_ref()).await;
                    inner.complete(generation, request, search, result);
                });
                state.fetch_task = Some(handle);
            }
        }
        self.bump();
    }

    fn complete(
        self: &Arc<Self>,
        generation: u64,
        request: PageRequest,
        search: Option<SearchTerm>,
        result: Result<Page<Value>, ApiError>,
    ) {
        let mut state = self.lock_state();
        if state.generation != generation {
            debug!("superseded fetch discarded");
            return;
        }

        match result {
            Ok(page) => {
                state.fetching = false;
                state.loading = false;
                state.error = None;

                self.cache
                    .put_page(self.keys.list(search.as_ref(), request), page.clone());

                // When the collection shrank below the current page, clamp
                // down and adopt this response for the clamped page; the
                // request that produced the new metadata is the only one
                // needed.
                let last_page = page.meta.last_page;
                if state.page > last_page.max(1) {
                    let clamped = clamp_page(state.page, last_page);
                    debug!(from = state.page, to = clamped, "clamping to last known page");
                    state.page = clamped;
                    if let Ok(clamped_request) = PageRequest::new(clamped, request.per_page()) {
                        self.cache.put_page(
                            self.keys.list(search.as_ref(), clamped_request),
                            page.clone(),
                        );
                    }
                }

                state.items = page.items;
                state.meta = Some(page.meta);
            }
            // A cancelled fetch is a no-op, not a failure.
            Err(ApiError::Cancelled) => return,
            Err(error) => {
                state.fetching = false;
                state.loading = false;
                state.error = Some(error);
            }
        }
        drop(state);
        self.bump();
    }

    fn commit_search(self: &Arc<Self>, raw: Option<String>) {
        let committed = raw.as_deref().and_then(SearchTerm::sanitize);
        {
            let mut state = self.lock_state();
            if state.committed_search == committed {
                return;
            }
            state.committed_search = committed;
            state.page = 1;
        }
        self.start_fetch(false);
    }
}

/// Paginated-query controller over one fetcher and one cache.
#[derive(Clone)]
pub struct PaginatedQuery {
    inner: Arc<Inner>,
}

/// Builder for [`PaginatedQuery`].
pub struct PaginatedQueryBuilder {
    fetcher: Arc<dyn PageFetcher>,
    keys: QueryKeys,
    cache: Arc<QueryCache>,
    per_page: u64,
    debounce: Duration,
    enabled: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl PaginatedQueryBuilder {
    /// Initial page size; values below 1 are raised to 1.
    #[must_use]
    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Quiet window before a search commit.
    #[must_use]
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Gate fetching entirely, e.g. on a permission check.
    #[must_use]
    pub fn enabled(mut self, gate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.enabled = Arc::new(gate);
        self
    }

    /// Finish construction.
    #[must_use]
    pub fn build(self) -> PaginatedQuery {
        let (revision, _) = watch::channel(0);
        PaginatedQuery {
            inner: Arc::new(Inner {
                fetcher: self.fetcher,
                keys: self.keys,
                cache: self.cache,
                enabled: self.enabled,
                debounce: self.debounce,
                state: Mutex::new(ControllerState {
                    page: 1,
                    per_page: self.per_page,
                    raw_search: None,
                    committed_search: None,
                    items: Vec::new(),
                    meta: None,
                    error: None,
                    loading: false,
                    fetching: false,
                    generation: 0,
                    fetch_task: None,
                    debounce_task: None,
                }),
                revision,
            }),
        }
    }
}

impl PaginatedQuery {
    /// Start building a controller.
    #[must_use]
    pub fn builder(
        fetcher: Arc<dyn PageFetcher>,
        keys: QueryKeys,
        cache: Arc<QueryCache>,
    ) -> PaginatedQueryBuilder {
        PaginatedQueryBuilder {
            fetcher,
            keys,
            cache,
            per_page: pagination::DEFAULT_PER_PAGE,
            debounce: DEFAULT_DEBOUNCE,
            enabled: Arc::new(|| true),
        }
    }

    /// Fetch the current page, serving a fresh cache entry when one exists.
    pub fn ensure_loaded(&self) {
        self.inner.start_fetch(false);
    }

    /// Fetch the current page, bypassing cache freshness.
    pub fn refetch(&self) {
        self.inner.start_fetch(true);
    }

    /// Move to a page (numbered from 1) and fetch it.
    pub fn set_page(&self, page: u64) {
        let changed = {
            let mut state = self.inner.lock_state();
            let target = page.max(1);
            if state.page == target {
                false
            } else {
                state.page = target;
                true
            }
        };
        if changed {
            self.inner.start_fetch(false);
        }
    }

    /// Change the page size; resets to page 1 so the page/per-page pair
    /// can never be out of range.
    pub fn set_per_page(&self, per_page: u64) {
        let changed = {
            let mut state = self.inner.lock_state();
            let target = per_page.max(1);
            if state.per_page == target {
                false
            } else {
                state.page = 1;
                state.per_page = target;
                true
            }
        };
        if changed {
            self.inner.start_fetch(false);
        }
    }

    /// Record raw search input; the debounced commit resets the page and
    /// refetches after the quiet window.
    pub fn set_search(&self, raw: Option<&str>) {
        let raw_owned = raw.map(str::to_owned);
        let mut state = self.inner.lock_state();
        if state.raw_search == raw_owned {
            return;
        }
        state.raw_search = raw_owned.clone();

        // Restart the quiet window: only the newest input commits.
        if let Some(task) = state.debounce_task.take() {
            task.abort();
        }
        let inner = Arc::clone(&self.inner);
        let debounce = self.inner.debounce;
        state.debounce_task = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            inner.commit_search(raw_owned);
        }));
    }

    /// Current state snapshot; items default to an empty sequence.
    #[must_use]
    pub fn view(&self) -> QueryView {
        let state = self.inner.lock_state();
        QueryView {
            page: state.page,
            per_page: state.per_page,
            items: state.items.clone(),
            meta: state.meta.clone(),
            error: state.error.clone(),
            is_loading: state.loading,
            is_fetching: state.fetching,
        }
    }

    /// Change notifications: the value increments on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Await quiescence: no pending debounce and no in-flight fetch.
    /// Intended for tests and teardown.
    pub async fn settle(&self) {
        loop {
            let task = {
                let mut state = self.inner.lock_state();
                state
                    .debounce_task
                    .take()
                    .or_else(|| state.fetch_task.take())
            };
            match task {
                Some(handle) => {
                    // Aborted handles resolve with a cancellation error;
                    // either way the task is finished.
                    let _ = handle.await;
                }
                None => break,
            }
        }
    }
}
