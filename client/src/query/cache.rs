//! Client-side query cache.
//!
//! Entries hold the last-known payload plus its staleness; mutations
//! invalidate by key prefix, and optimistic updates snapshot affected
//! entries so a failed request can roll the cache back to the exact
//! pre-mutation state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use pagination::Page;
use serde_json::Value;
use tracing::debug;

use crate::query::keys::QueryKey;

/// Default window during which a cached entry is served without refetch.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);

/// Cached payload shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// One validated list page (items kept as raw records).
    Page(Page<Value>),
    /// One detail record.
    Detail(Value),
}

/// One cache entry with its staleness bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: CachedValue,
    fetched_at: Instant,
    stale: bool,
}

impl CacheEntry {
    fn fresh(value: CachedValue) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
            stale: false,
        }
    }

    fn is_fresh(&self, stale_after: Duration) -> bool {
        !self.stale && self.fetched_at.elapsed() < stale_after
    }
}

/// Shared cache keyed by [`QueryKey`].
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    stale_after: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    /// Cache with the default stale window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_stale_after(DEFAULT_STALE_AFTER)
    }

    /// Cache with an explicit stale window.
    #[must_use]
    pub fn with_stale_after(stale_after: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stale_after,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached page plus whether it is still fresh.
    #[must_use]
    pub fn get_page(&self, key: &QueryKey) -> Option<(Page<Value>, bool)> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        match &entry.value {
            CachedValue::Page(page) => Some((page.clone(), entry.is_fresh(self.stale_after))),
            CachedValue::Detail(_) => None,
        }
    }

    /// Cached detail plus whether it is still fresh.
    #[must_use]
    pub fn get_detail(&self, key: &QueryKey) -> Option<(Value, bool)> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        match &entry.value {
            CachedValue::Detail(value) => Some((value.clone(), entry.is_fresh(self.stale_after))),
            CachedValue::Page(_) => None,
        }
    }

    /// Store a freshly fetched page.
    pub fn put_page(&self, key: QueryKey, page: Page<Value>) {
        self.lock()
            .insert(key, CacheEntry::fresh(CachedValue::Page(page)));
    }

    /// Store a freshly fetched detail record.
    pub fn put_detail(&self, key: QueryKey, value: Value) {
        self.lock()
            .insert(key, CacheEntry::fresh(CachedValue::Detail(value)));
    }

    /// Mark every entry under `prefix` stale, forcing a refetch on next
    /// access while keeping the data visible.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) {
        let mut entries = self.lock();
        let mut invalidated = 0_usize;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                invalidated += 1;
            }
        }
        debug!(prefix = %prefix, invalidated, "cache entries invalidated");
    }

    /// Drop one entry entirely.
    pub fn remove(&self, key: &QueryKey) {
        self.lock().remove(key);
    }

    /// Copy every entry under `prefix` for later [`QueryCache::restore`].
    #[must_use]
    pub fn snapshot_prefix(&self, prefix: &QueryKey) -> Vec<(QueryKey, CacheEntry)> {
        self.lock()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Put snapshotted entries back exactly as captured.
    pub fn restore(&self, snapshot: Vec<(QueryKey, CacheEntry)>) {
        let mut entries = self.lock();
        for (key, entry) in snapshot {
            entries.insert(key, entry);
        }
    }

    /// Speculatively remove one item from every cached page under
    /// `prefix`, by its identity field.
    pub fn remove_item_from_pages(&self, prefix: &QueryKey, id: &str) {
        let mut entries = self.lock();
        for (key, entry) in entries.iter_mut() {
            if !key.starts_with(prefix) {
                continue;
            }
            if let CachedValue::Page(page) = &mut entry.value {
                page.items.retain(|item| {
                    item.get("id").and_then(Value::as_str) != Some(id)
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Invalidation, snapshot/rollback, and optimistic-removal coverage.

    use super::*;
    use crate::query::keys::QueryKeys;
    use pagination::{PageMeta, PageRequest};
    use serde_json::json;

    fn request(page: u64) -> PageRequest {
        PageRequest::new(page, 10).expect("valid fixture request")
    }

    fn page_of(ids: &[&str]) -> Page<Value> {
        Page {
            items: ids.iter().map(|id| json!({ "id": id })).collect(),
            meta: PageMeta {
                current_page: 1,
                from: Some(1),
                last_page: 1,
                per_page: 10,
                to: Some(ids.len() as u64),
                total: ids.len() as u64,
            },
        }
    }

    #[test]
    fn fresh_entries_are_served_until_invalidated() {
        let cache = QueryCache::new();
        let keys = QueryKeys::new("development");
        let key = keys.list(None, request(1));

        cache.put_page(key.clone(), page_of(&["a", "b"]));
        let (_, fresh) = cache.get_page(&key).expect("entry present");
        assert!(fresh);

        cache.invalidate_prefix(&keys.lists());
        let (page, fresh) = cache.get_page(&key).expect("entry still present");
        assert!(!fresh, "invalidation marks stale without dropping data");
        assert_eq!(page.items.len(), 2, "stale data stays visible");
    }

    #[test]
    fn invalidation_by_prefix_spares_other_entities() {
        let cache = QueryCache::new();
        let developments = QueryKeys::new("development");
        let programs = QueryKeys::new("social-assistance");

        cache.put_page(developments.list(None, request(1)), page_of(&["d-1"]));
        cache.put_page(programs.list(None, request(1)), page_of(&["sa-1"]));

        cache.invalidate_prefix(&developments.lists());

        let (_, fresh) = cache
            .get_page(&programs.list(None, request(1)))
            .expect("other entity untouched");
        assert!(fresh);
    }

    #[test]
    fn optimistic_removal_rolls_back_to_the_exact_snapshot() {
        let cache = QueryCache::new();
        let keys = QueryKeys::new("development");
        let key = keys.list(None, request(1));

        cache.put_page(key.clone(), page_of(&["a", "b", "c"]));
        let snapshot = cache.snapshot_prefix(&keys.lists());

        cache.remove_item_from_pages(&keys.lists(), "b");
        let (page, _) = cache.get_page(&key).expect("entry present");
        assert_eq!(page.items.len(), 2, "item removed speculatively");

        cache.restore(snapshot);
        let (page, _) = cache.get_page(&key).expect("entry restored");
        let ids: Vec<&str> = page
            .items
            .iter()
            .filter_map(|item| item.get("id").and_then(Value::as_str))
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"], "same items, same order");
    }

    #[test]
    fn detail_entries_are_separate_from_pages() {
        let cache = QueryCache::new();
        let keys = QueryKeys::new("development");

        cache.put_detail(keys.detail("d-1"), json!({ "id": "d-1" }));
        assert!(cache.get_page(&keys.detail("d-1")).is_none());
        assert!(cache.get_detail(&keys.detail("d-1")).is_some());

        cache.remove(&keys.detail("d-1"));
        assert!(cache.get_detail(&keys.detail("d-1")).is_none());
    }
}
