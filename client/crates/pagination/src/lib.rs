//! Pagination envelope primitives shared by every list endpoint consumer.
//!
//! The server wraps list payloads as `{ data: [...], meta: {...} }`. This
//! crate owns the validated envelope types, the page/per-page request
//! invariants, and the search-term sanitisation applied before a term is
//! allowed to participate in a cache key.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod search;

pub use search::{validate_search_input, SearchInputError, SearchTerm};

/// Default page size used by list views.
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Pagination metadata reported by the server alongside each page.
///
/// `from`/`to` are absent when the page is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u64,
    #[serde(default)]
    pub from: Option<u64>,
    pub last_page: u64,
    pub per_page: u64,
    #[serde(default)]
    pub to: Option<u64>,
    pub total: u64,
}

/// One page of items plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "data")]
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// True when the page carries no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Structural failures while decoding a paginated payload.
///
/// A malformed envelope is a fetch failure, never partial data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// The `data` member is missing or not an array.
    #[error("paginated response missing items array")]
    MissingItems,
    /// The `meta` member is missing or not an object.
    #[error("paginated response missing pagination metadata")]
    MissingMeta,
    /// The envelope was shaped correctly but an item or the metadata failed
    /// to decode.
    #[error("paginated response failed to decode: {message}")]
    Decode { message: String },
}

/// Validate and decode a paginated payload.
///
/// Both the items array and the metadata object must be present before any
/// element is decoded.
///
/// # Errors
///
/// Returns [`EnvelopeError`] when the envelope is structurally malformed or
/// an element fails to decode.
pub fn parse_page<T: DeserializeOwned>(value: &Value) -> Result<Page<T>, EnvelopeError> {
    let items = value
        .get("data")
        .and_then(Value::as_array)
        .ok_or(EnvelopeError::MissingItems)?;
    let meta = value
        .get("meta")
        .filter(|meta| meta.is_object())
        .ok_or(EnvelopeError::MissingMeta)?;

    let meta: PageMeta = serde_json::from_value(meta.clone()).map_err(|error| {
        EnvelopeError::Decode {
            message: error.to_string(),
        }
    })?;
    let items = items
        .iter()
        .map(|item| serde_json::from_value(item.clone()))
        .collect::<Result<Vec<T>, _>>()
        .map_err(|error| EnvelopeError::Decode {
            message: error.to_string(),
        })?;

    Ok(Page { items, meta })
}

/// Validation failures for [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// Pages are numbered from 1.
    #[error("page must be at least 1")]
    PageOutOfRange,
    /// A page must hold at least one item.
    #[error("per_page must be at least 1")]
    PerPageOutOfRange,
}

/// Validated page/per-page pair.
///
/// ## Invariants
/// - `page >= 1` and `per_page >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u64,
    per_page: u64,
}

impl PageRequest {
    /// Construct a validated request.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when either bound is below 1.
    pub fn new(page: u64, per_page: u64) -> Result<Self, PageRequestError> {
        if page < 1 {
            return Err(PageRequestError::PageOutOfRange);
        }
        if per_page < 1 {
            return Err(PageRequestError::PerPageOutOfRange);
        }
        Ok(Self { page, per_page })
    }

    /// Requested page number.
    #[must_use]
    pub fn page(self) -> u64 {
        self.page
    }

    /// Requested page size.
    #[must_use]
    pub fn per_page(self) -> u64 {
        self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Clamp a page number so it never dangles beyond the last known page.
///
/// A `last_page` of zero (empty collection) clamps to page 1.
#[must_use]
pub fn clamp_page(page: u64, last_page: u64) -> u64 {
    page.min(last_page.max(1))
}
