//! Navigation guard over the session store, plus an in-memory navigator
//! adapter for embedders and tests.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::domain::ports::Navigator;
use crate::domain::routes::RouteName;
use crate::http::transport::HttpTransport;
use crate::session::SessionStore;

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Enter the requested route.
    Allow,
    /// No usable session; go sign in.
    RedirectLogin,
    /// Authenticated but lacking the required permission.
    RedirectForbidden,
    /// Authenticated users skip anonymous-only views.
    RedirectDashboard,
}

/// Gate navigation on session state and permission flags.
pub struct RouteGuard<T> {
    session: Arc<SessionStore<T>>,
}

impl<T: HttpTransport> RouteGuard<T> {
    /// Guard over the session store.
    #[must_use]
    pub fn new(session: Arc<SessionStore<T>>) -> Self {
        Self { session }
    }

    /// Decide whether `to` may be entered, fetching the profile on demand.
    pub async fn check(&self, to: RouteName) -> GuardDecision {
        let meta = to.meta();

        if meta.requires_auth {
            return self.check_protected(to).await;
        }

        if meta.requires_unauth && self.session.is_authenticated() {
            debug!("already authenticated; steering to dashboard");
            return GuardDecision::RedirectDashboard;
        }

        GuardDecision::Allow
    }

    async fn check_protected(&self, to: RouteName) -> GuardDecision {
        if !self.session.is_authenticated() {
            warn!(route = ?to, "no token; steering to login");
            return GuardDecision::RedirectLogin;
        }

        if self.session.user().is_none() {
            if let Err(error) = self.session.fetch_user().await {
                warn!(route = ?to, %error, "profile fetch failed during guard check");
                return GuardDecision::RedirectLogin;
            }
        }

        match to.meta().permission {
            Some(permission) if !self.session.has_permission(permission) => {
                warn!(route = ?to, permission, "permission denied");
                GuardDecision::RedirectForbidden
            }
            _ => GuardDecision::Allow,
        }
    }
}

/// Navigator adapter holding the current route in memory; embedders
/// observe it and render accordingly.
pub struct InMemoryNavigator {
    current: Mutex<RouteName>,
}

impl InMemoryNavigator {
    /// Start on the given route.
    #[must_use]
    pub fn new(initial: RouteName) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }
}

impl Navigator for InMemoryNavigator {
    fn current(&self) -> RouteName {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, route: RouteName) {
        debug!(?route, "navigate");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = route;
    }

    fn replace(&self, route: RouteName) {
        debug!(?route, "navigate (replace)");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = route;
    }
}

#[cfg(test)]
mod tests {
    //! Guard decisions across session states.

    use super::*;
    use crate::domain::ports::{MockNotificationSink, NotificationSink, TokenStore};
    use crate::http::classifier::ErrorClassifier;
    use crate::http::client::ApiClient;
    use crate::http::transport::{MockHttpTransport, RawResponse};
    use crate::services::auth::AuthApi;
    use crate::token::MemoryTokenStore;
    use serde_json::json;

    const TOKEN: &str = "1|abcdefghijklmnopqrstuvwxyz";

    fn guard_with(
        transport: MockHttpTransport,
        seeded_token: bool,
    ) -> (RouteGuard<MockHttpTransport>, Arc<InMemoryNavigator>) {
        let tokens = Arc::new(MemoryTokenStore::new());
        if seeded_token {
            tokens.set(TOKEN).expect("seed token");
        }
        let navigator = Arc::new(InMemoryNavigator::new(RouteName::Login));
        let sink: Arc<dyn NotificationSink> = Arc::new({
            let mut sink = MockNotificationSink::new();
            sink.expect_notify().returning(|_| ());
            sink
        });
        let client = Arc::new(ApiClient::new(
            Arc::new(transport),
            Arc::clone(&tokens) as Arc<dyn TokenStore>,
            Arc::clone(&navigator) as Arc<dyn Navigator>,
            Arc::clone(&sink),
        ));
        let session = Arc::new(crate::session::SessionStore::new(
            AuthApi::new(client),
            tokens as Arc<dyn TokenStore>,
            Arc::clone(&navigator) as Arc<dyn Navigator>,
            Arc::clone(&sink),
            Arc::new(ErrorClassifier::new(sink)),
        ));
        session.initialize();
        (RouteGuard::new(session), navigator)
    }

    fn profile_transport(permissions: &[&str]) -> MockHttpTransport {
        let body = json!({
            "data": {
                "id": "u-1",
                "name": "Admin",
                "permissions": permissions,
            },
        });
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .returning(move |_| Ok(RawResponse { status: 200, body: body.clone() }));
        transport
    }

    #[tokio::test]
    async fn anonymous_users_are_sent_to_login() {
        let (guard, _) = guard_with(MockHttpTransport::new(), false);
        assert_eq!(
            guard.check(RouteName::Dashboard).await,
            GuardDecision::RedirectLogin,
        );
    }

    #[tokio::test]
    async fn missing_permission_is_forbidden() {
        let (guard, _) = guard_with(profile_transport(&["dashboard-menu"]), true);
        assert_eq!(
            guard.check(RouteName::DevelopmentList).await,
            GuardDecision::RedirectForbidden,
        );
    }

    #[tokio::test]
    async fn matching_permission_allows_entry() {
        let (guard, _) = guard_with(profile_transport(&["development-list"]), true);
        assert_eq!(
            guard.check(RouteName::DevelopmentList).await,
            GuardDecision::Allow,
        );
    }

    #[tokio::test]
    async fn authenticated_users_skip_the_login_view() {
        let (guard, _) = guard_with(profile_transport(&[]), true);
        assert_eq!(
            guard.check(RouteName::Login).await,
            GuardDecision::RedirectDashboard,
        );
    }

    #[tokio::test]
    async fn failed_profile_fetch_falls_back_to_login() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().returning(|_| {
            Ok(RawResponse {
                status: 500,
                body: json!({ "message": "boom" }),
            })
        });

        let (guard, _) = guard_with(transport, true);
        assert_eq!(
            guard.check(RouteName::Dashboard).await,
            GuardDecision::RedirectLogin,
        );
    }

    #[tokio::test]
    async fn open_routes_need_nothing() {
        let (guard, _) = guard_with(MockHttpTransport::new(), false);
        assert_eq!(guard.check(RouteName::Forbidden).await, GuardDecision::Allow);
    }
}
