//! Driven ports for the cross-cutting concerns the client depends on.
//!
//! Adapters live next to their concern (`token`, `notify`, `guard`); tests
//! mock these traits directly.

use crate::domain::auth::{BearerToken, TokenFormatError};
use crate::domain::routes::RouteName;
use crate::notify::Notification;

/// Failures while persisting or validating a token.
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    /// The raw value failed the minimum-length/shape check.
    #[error("invalid token format: {0}")]
    InvalidFormat(#[from] TokenFormatError),
    /// The underlying storage rejected the operation.
    #[error("token storage failed: {message}")]
    Storage { message: String },
}

/// Persistence for the bearer credential.
///
/// `get` and `exists` are side-effect free; only `set`/`remove` mutate the
/// underlying storage.
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send + Sync {
    /// The persisted token, absent when missing or expired.
    fn get(&self) -> Option<BearerToken>;

    /// Validate and persist a raw token value.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError::InvalidFormat`] when the value fails the
    /// shape check, or [`TokenStoreError::Storage`] when persistence fails.
    fn set(&self, raw: &str) -> Result<(), TokenStoreError>;

    /// Drop the persisted token, if any.
    fn remove(&self);

    /// Whether a usable token is currently persisted.
    fn exists(&self) -> bool;
}

/// Navigation driven by the guard and the interceptors.
///
/// `replace` must not leave the previous view reachable via back
/// navigation; `push` may.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// The route currently displayed.
    fn current(&self) -> RouteName;

    /// Navigate, keeping history.
    fn push(&self, route: RouteName);

    /// Navigate, replacing the current history entry.
    fn replace(&self, route: RouteName);
}

/// Sink for transient user-facing messages.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    /// Display one notification.
    fn notify(&self, notification: Notification);
}

/// Listener signalled by the HTTP layer when a 401 outside login proves the
/// session dead. Bound late because the session store is built on top of
/// the client.
#[cfg_attr(test, mockall::automock)]
pub trait SessionEvents: Send + Sync {
    /// The current session is no longer valid.
    fn session_expired(&self);
}
