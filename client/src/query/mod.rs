//! Paginated queries: cache keys, the shared query cache, and the generic
//! list controller every list view is built on.

pub mod cache;
pub mod controller;
pub mod keys;

pub use self::cache::{CacheEntry, CachedValue, QueryCache, DEFAULT_STALE_AFTER};
pub use self::controller::{
    PageFetcher, PaginatedQuery, PaginatedQueryBuilder, QueryView, DEFAULT_DEBOUNCE,
};
pub use self::keys::{KeyPart, QueryKey, QueryKeys};
