//! Explicit middleware chain for the API client.
//!
//! Cross-cutting request/response behaviour is an ordered list of hooks
//! constructed with their dependencies, never ambient patching. The bearer
//! hook prepares requests; the expiry and forbidden hooks inspect responses
//! and may override the outcome.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::domain::error::ApiError;
use crate::domain::ports::{Navigator, NotificationSink, SessionEvents, TokenStore};
use crate::domain::routes::RouteName;
use crate::http::transport::{ApiRequest, RawResponse};
use crate::notify::{messages, Notification};

/// Hook run over each outbound request, in registration order.
pub trait RequestHook: Send + Sync {
    /// Mutate the request before transport encoding.
    fn prepare(&self, request: &mut ApiRequest);
}

/// Verdict of a response hook.
pub enum HookVerdict {
    /// Let later hooks and the default status mapping proceed.
    Continue,
    /// Stop the chain and reject the call with this error.
    Reject(ApiError),
}

/// Hook run over each response, in registration order, before the default
/// status mapping.
pub trait ResponseHook: Send + Sync {
    /// Inspect the response; a `Reject` verdict wins over later hooks.
    fn inspect(&self, request: &ApiRequest, response: &RawResponse) -> HookVerdict;
}

/// Attaches the bearer credential to every request except login.
pub struct BearerAuth {
    tokens: Arc<dyn TokenStore>,
}

impl BearerAuth {
    /// Hook over the given token store.
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens }
    }
}

impl RequestHook for BearerAuth {
    fn prepare(&self, request: &mut ApiRequest) {
        if request.is_login() {
            return;
        }
        if let Some(token) = self.tokens.get() {
            debug!(path = %request.path, "attaching bearer token");
            request.bearer = Some(token);
        }
    }
}

/// Late binding point for the session-events listener.
///
/// The session store is built on top of the client, so the client starts
/// with an empty binding and the bootstrap wires it immediately after
/// construction.
#[derive(Default)]
pub struct SessionBinding {
    listener: RwLock<Option<Arc<dyn SessionEvents>>>,
}

impl SessionBinding {
    /// Empty binding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the listener; replaces any previous binding.
    pub fn bind(&self, events: Arc<dyn SessionEvents>) {
        let mut slot = self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(events);
    }

    fn notify_expired(&self) {
        let listener = {
            let slot = self.listener.read().unwrap_or_else(PoisonError::into_inner);
            slot.clone()
        };
        match listener {
            Some(events) => events.session_expired(),
            None => warn!("session expired before a listener was bound"),
        }
    }
}

/// Treats a 401 outside login as proof the session is dead.
///
/// Exactly one token clear, one listener signal, and at most one
/// navigation fire per response; a second simultaneous 401 finds the
/// navigator already on the login route and does not navigate again.
pub struct SessionExpiry {
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    binding: Arc<SessionBinding>,
}

impl SessionExpiry {
    /// Hook over the given dependencies.
    #[must_use]
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        binding: Arc<SessionBinding>,
    ) -> Self {
        Self {
            tokens,
            navigator,
            binding,
        }
    }
}

impl ResponseHook for SessionExpiry {
    fn inspect(&self, request: &ApiRequest, response: &RawResponse) -> HookVerdict {
        if response.status != 401 || request.retry || request.is_login() {
            return HookVerdict::Continue;
        }

        warn!(path = %request.path, "session expired, clearing credentials");
        self.tokens.remove();
        self.binding.notify_expired();
        if self.navigator.current() != RouteName::Login {
            self.navigator.replace(RouteName::Login);
        }

        HookVerdict::Reject(ApiError::SessionExpired)
    }
}

/// Surfaces a 403 once and steers the user to the forbidden view.
pub struct ForbiddenRedirect {
    navigator: Arc<dyn Navigator>,
    sink: Arc<dyn NotificationSink>,
}

impl ForbiddenRedirect {
    /// Hook over the given dependencies.
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { navigator, sink }
    }
}

impl ResponseHook for ForbiddenRedirect {
    fn inspect(&self, request: &ApiRequest, response: &RawResponse) -> HookVerdict {
        if response.status != 403 {
            return HookVerdict::Continue;
        }

        warn!(path = %request.path, "access forbidden");
        // One notification and one navigation even when several in-flight
        // requests fail at once.
        if self.navigator.current() != RouteName::Forbidden {
            self.sink.notify(
                Notification::error(messages::FORBIDDEN).titled(messages::FORBIDDEN_TITLE),
            );
            self.navigator.push(RouteName::Forbidden);
        }

        HookVerdict::Reject(ApiError::Forbidden)
    }
}
