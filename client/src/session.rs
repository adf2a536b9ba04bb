//! Session store: the authentication state machine.
//!
//! `Anonymous → Authenticating → Authenticated → SessionExpiring →
//! Anonymous`. Login and logout are latched against re-entry; the latches
//! reset through RAII guards so an error cannot leave them stuck. The
//! store implements [`SessionEvents`] and is bound to the API client at
//! bootstrap so the 401 interceptor can clear it.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::auth::{AuthenticatedUser, BearerToken, LoginCredentials};
use crate::domain::error::ApiError;
use crate::domain::ports::{Navigator, NotificationSink, SessionEvents, TokenStore};
use crate::domain::routes::RouteName;
use crate::http::classifier::ErrorClassifier;
use crate::http::transport::HttpTransport;
use crate::notify::{messages, Notification};
use crate::services::auth::AuthApi;

/// Observable lifecycle phase.
///
/// `SessionExpiring` is transient: it exists only while a detected expiry
/// is being cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
}

struct SessionState {
    token: Option<BearerToken>,
    user: Option<AuthenticatedUser>,
    loading: bool,
    logging_out: bool,
    login_error: Option<String>,
}

enum Latch {
    Loading,
    LoggingOut,
}

struct LatchGuard<'a> {
    state: &'a Mutex<SessionState>,
    which: Latch,
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match self.which {
            Latch::Loading => state.loading = false,
            Latch::LoggingOut => state.logging_out = false,
        }
    }
}

/// Authentication state and the login/logout orchestration.
pub struct SessionStore<T> {
    auth: AuthApi<T>,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    sink: Arc<dyn NotificationSink>,
    classifier: Arc<ErrorClassifier>,
    state: Mutex<SessionState>,
}

impl<T: HttpTransport> SessionStore<T> {
    /// Store over its collaborators; call [`SessionStore::initialize`] to
    /// adopt a previously persisted token.
    #[must_use]
    pub fn new(
        auth: AuthApi<T>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        sink: Arc<dyn NotificationSink>,
        classifier: Arc<ErrorClassifier>,
    ) -> Self {
        Self {
            auth,
            tokens,
            navigator,
            sink,
            classifier,
            state: Mutex::new(SessionState {
                token: None,
                user: None,
                loading: false,
                logging_out: false,
                login_error: None,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adopt a persisted token, if one survived.
    pub fn initialize(&self) {
        if let Some(token) = self.tokens.get() {
            self.lock_state().token = Some(token);
            info!("session initialised from stored token");
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        let state = self.lock_state();
        if state.loading {
            SessionPhase::Authenticating
        } else if state.user.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    /// Whether a token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock_state().token.is_some()
    }

    /// The loaded profile, when any.
    #[must_use]
    pub fn user(&self) -> Option<AuthenticatedUser> {
        self.lock_state().user.clone()
    }

    /// The last login failure message, for the login form.
    #[must_use]
    pub fn login_error(&self) -> Option<String> {
        self.lock_state().login_error.clone()
    }

    /// Pure capability check; no user means no permissions.
    #[must_use]
    pub fn has_permission(&self, name: &str) -> bool {
        self.lock_state()
            .user
            .as_ref()
            .is_some_and(|user| user.has_permission(name))
    }

    /// Authenticate, persist the token, load the profile, and land on the
    /// dashboard. A second call while one is in flight is a no-op.
    ///
    /// # Errors
    ///
    /// Re-throws the underlying [`ApiError`] after recording the
    /// login-form message and reverting to `Anonymous`.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<(), ApiError> {
        {
            let mut state = self.lock_state();
            if state.loading {
                debug!("login already in flight");
                return Ok(());
            }
            state.loading = true;
            state.login_error = None;
        }
        let _latch = LatchGuard {
            state: &self.state,
            which: Latch::Loading,
        };

        match self.try_login(credentials).await {
            Ok(()) => {
                self.navigator.push(RouteName::Dashboard);
                self.sink.notify(
                    Notification::success(messages::LOGIN_SUCCESS)
                        .titled(messages::LOGIN_SUCCESS_TITLE),
                );
                Ok(())
            }
            Err(error) => {
                let message = self.classifier.login_message(&error);
                self.lock_state().login_error = Some(message);
                self.clear_auth();
                Err(error)
            }
        }
    }

    async fn try_login(&self, credentials: &LoginCredentials) -> Result<(), ApiError> {
        let raw = self.auth.login(credentials).await?;
        self.tokens.set(&raw).map_err(|_| ApiError::InvalidToken)?;
        self.lock_state().token = BearerToken::parse(&raw).ok();
        self.fetch_user().await?;
        Ok(())
    }

    /// Load the profile for the held token; a 401 forces logout.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`ApiError`].
    pub async fn fetch_user(&self) -> Result<AuthenticatedUser, ApiError> {
        match self.auth.fetch_user().await {
            Ok(user) => {
                self.lock_state().user = Some(user.clone());
                info!(user = %user.id, "profile loaded");
                Ok(user)
            }
            Err(error) => {
                if error.status() == Some(401) {
                    self.force_logout();
                }
                Err(error)
            }
        }
    }

    /// Best-effort server-side invalidation, then always clear locally and
    /// replace-navigate to login so back-navigation cannot return to an
    /// authenticated view. Re-entry while in flight is a no-op.
    pub async fn logout(&self) {
        {
            let mut state = self.lock_state();
            if state.logging_out {
                debug!("logout already in flight");
                return;
            }
            state.logging_out = true;
        }
        let _latch = LatchGuard {
            state: &self.state,
            which: Latch::LoggingOut,
        };

        match self.auth.logout().await {
            Ok(()) => self
                .sink
                .notify(Notification::info(messages::LOGOUT).titled(messages::LOGOUT_TITLE)),
            Err(error) => {
                warn!(%error, "server-side logout failed; clearing local session anyway");
            }
        }

        self.clear_auth();
        info!("logout complete");
        self.navigator.replace(RouteName::Login);
    }

    /// Immediate local logout with a replace navigation; no server call,
    /// no notification.
    pub fn force_logout(&self) {
        self.clear_auth();
        self.navigator.replace(RouteName::Login);
    }

    /// React to a detected expiry: clear state and warn, exactly once even
    /// when several in-flight requests observe the same dead session.
    /// Navigation is the 401 interceptor's responsibility.
    pub fn handle_session_expired(&self) {
        let already_anonymous = {
            let state = self.lock_state();
            state.token.is_none() && state.user.is_none()
        };
        if already_anonymous {
            return;
        }

        self.clear_auth();
        self.sink.notify(
            Notification::warning(messages::SESSION_EXPIRED)
                .titled(messages::SESSION_EXPIRED_TITLE),
        );
    }

    fn clear_auth(&self) {
        {
            let mut state = self.lock_state();
            state.token = None;
            state.user = None;
        }
        self.tokens.remove();
    }
}

impl<T: HttpTransport> SessionEvents for SessionStore<T> {
    fn session_expired(&self) {
        self.handle_session_expired();
    }
}
