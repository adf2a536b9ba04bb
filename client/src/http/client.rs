//! API client: the middleware chain over the transport port.
//!
//! Policy lives here: bearer attachment, expiry/forbidden interception,
//! fixed network-failure messaging, and status-to-taxonomy mapping.
//! Everything below the chain is the transport adapter's problem.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::domain::error::ApiError;
use crate::domain::ports::{Navigator, NotificationSink, SessionEvents, TokenStore};
use crate::http::middleware::{
    BearerAuth, ForbiddenRedirect, HookVerdict, RequestHook, ResponseHook, SessionBinding,
    SessionExpiry,
};
use crate::http::transport::{ApiRequest, FormField, HttpTransport, TransportError};

/// Authenticated JSON/multipart client with interception.
///
/// Constructed once at bootstrap with its dependencies passed explicitly;
/// the session-events listener is bound immediately afterwards via
/// [`ApiClient::bind_session_events`].
pub struct ApiClient<T> {
    transport: Arc<T>,
    request_hooks: Vec<Arc<dyn RequestHook>>,
    response_hooks: Vec<Arc<dyn ResponseHook>>,
    binding: Arc<SessionBinding>,
}

impl<T: HttpTransport> ApiClient<T> {
    /// Assemble the default chain: bearer attachment, session-expiry
    /// interception, forbidden redirection.
    #[must_use]
    pub fn new(
        transport: Arc<T>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let binding = Arc::new(SessionBinding::new());
        let request_hooks: Vec<Arc<dyn RequestHook>> =
            vec![Arc::new(BearerAuth::new(Arc::clone(&tokens)))];
        let response_hooks: Vec<Arc<dyn ResponseHook>> = vec![
            Arc::new(SessionExpiry::new(
                tokens,
                Arc::clone(&navigator),
                Arc::clone(&binding),
            )),
            Arc::new(ForbiddenRedirect::new(navigator, sink)),
        ];

        Self {
            transport,
            request_hooks,
            response_hooks,
            binding,
        }
    }

    /// Append a custom request hook after the defaults.
    #[must_use]
    pub fn with_request_hook(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.request_hooks.push(hook);
        self
    }

    /// Append a custom response hook after the defaults.
    #[must_use]
    pub fn with_response_hook(mut self, hook: Arc<dyn ResponseHook>) -> Self {
        self.response_hooks.push(hook);
        self
    }

    /// Install the session-events listener (bootstrap-time wiring).
    pub fn bind_session_events(&self, events: Arc<dyn SessionEvents>) {
        self.binding.bind(events);
    }

    /// Execute a request through the chain.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] per the taxonomy: interception outcomes for
    /// 401/403, the fixed network message when no response arrived,
    /// `Cancelled` untouched, and the status mapping otherwise.
    pub async fn send(&self, mut request: ApiRequest) -> Result<Value, ApiError> {
        for hook in &self.request_hooks {
            hook.prepare(&mut request);
        }
        debug!(
            request_id = %request.request_id,
            path = %request.path,
            method = ?request.method,
            "sending request"
        );

        let response = match self.transport.execute(request.clone()).await {
            Ok(response) => response,
            Err(TransportError::Cancelled) => return Err(ApiError::Cancelled),
            Err(TransportError::Decode { message }) => {
                error!(path = %request.path, %message, "undecodable response body");
                return Err(ApiError::decode(message));
            }
            Err(transport_error) => {
                error!(path = %request.path, error = %transport_error, "no response received");
                return Err(ApiError::network());
            }
        };

        for hook in &self.response_hooks {
            if let HookVerdict::Reject(rejection) = hook.inspect(&request, &response) {
                return Err(rejection);
            }
        }

        if response.is_success() {
            Ok(response.body)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    /// GET with query parameters.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Value, ApiError> {
        self.send(ApiRequest::get(path).with_query(query)).await
    }

    /// POST with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post_json(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.send(ApiRequest::post_json(path, body)).await
    }

    /// POST with a multipart body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post_multipart(
        &self,
        path: &str,
        fields: Vec<FormField>,
    ) -> Result<Value, ApiError> {
        self.send(ApiRequest::post_multipart(path, fields)).await
    }

    /// DELETE.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.send(ApiRequest::delete(path)).await
    }
}

#[cfg(test)]
mod tests {
    //! Interception coverage: expiry, forbidden, and network mapping.

    use super::*;
    use crate::domain::auth::BearerToken;
    use crate::domain::ports::{
        MockNavigator, MockNotificationSink, MockSessionEvents, MockTokenStore,
    };
    use crate::domain::routes::RouteName;
    use crate::http::transport::{MockHttpTransport, RawResponse};
    use crate::notify::Level;
    use serde_json::json;

    const TOKEN: &str = "1|abcdefghijklmnopqrstuvwxyz";

    fn token_store_with_token() -> MockTokenStore {
        let mut tokens = MockTokenStore::new();
        tokens
            .expect_get()
            .returning(|| Some(BearerToken::parse(TOKEN).expect("valid fixture token")));
        tokens
    }

    fn quiet_sink() -> MockNotificationSink {
        let mut sink = MockNotificationSink::new();
        sink.expect_notify().times(0);
        sink
    }

    fn respond(status: u16, body: serde_json::Value) -> MockHttpTransport {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .returning(move |_| Ok(RawResponse { status, body: body.clone() }));
        transport
    }

    fn client_for(
        transport: MockHttpTransport,
        tokens: MockTokenStore,
        navigator: MockNavigator,
        sink: MockNotificationSink,
    ) -> ApiClient<MockHttpTransport> {
        ApiClient::new(
            Arc::new(transport),
            Arc::new(tokens),
            Arc::new(navigator),
            Arc::new(sink),
        )
    }

    #[tokio::test]
    async fn attaches_bearer_to_non_login_requests() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|request| {
                request.bearer.as_ref().map(BearerToken::as_str) == Some(TOKEN)
            })
            .returning(|_| Ok(RawResponse { status: 200, body: json!({ "data": [] }) }));

        let client = client_for(
            transport,
            token_store_with_token(),
            MockNavigator::new(),
            quiet_sink(),
        );
        client
            .get("me", Vec::new())
            .await
            .expect("authenticated request succeeds");
    }

    #[tokio::test]
    async fn login_requests_travel_without_bearer() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|request| request.bearer.is_none())
            .returning(|_| Ok(RawResponse { status: 200, body: json!({ "token": TOKEN }) }));

        let client = client_for(
            transport,
            token_store_with_token(),
            MockNavigator::new(),
            quiet_sink(),
        );
        client
            .post_json("login", json!({ "email": "a@b.id" }))
            .await
            .expect("login request succeeds");
    }

    #[tokio::test]
    async fn expired_session_clears_token_signals_listener_and_navigates_once() {
        let mut tokens = token_store_with_token();
        tokens.expect_remove().times(1).return_const(());

        let mut navigator = MockNavigator::new();
        navigator
            .expect_current()
            .times(1)
            .return_const(RouteName::Dashboard);
        navigator
            .expect_replace()
            .times(1)
            .withf(|route| *route == RouteName::Login)
            .return_const(());

        let mut events = MockSessionEvents::new();
        events.expect_session_expired().times(1).return_const(());

        let client = client_for(
            respond(401, json!({ "message": "Unauthenticated." })),
            tokens,
            navigator,
            quiet_sink(),
        );
        client.bind_session_events(Arc::new(events));

        let error = client
            .get("development/all/paginated", Vec::new())
            .await
            .expect_err("expired session must reject");
        assert_eq!(error, ApiError::SessionExpired);
    }

    #[tokio::test]
    async fn second_simultaneous_401_does_not_navigate_again() {
        let mut tokens = token_store_with_token();
        tokens.expect_remove().times(1).return_const(());

        // Already on the login view: the route-name comparison suppresses
        // the redirect.
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current()
            .times(1)
            .return_const(RouteName::Login);
        navigator.expect_replace().times(0);

        let mut events = MockSessionEvents::new();
        events.expect_session_expired().times(1).return_const(());

        let client = client_for(
            respond(401, json!({ "message": "Unauthenticated." })),
            tokens,
            navigator,
            quiet_sink(),
        );
        client.bind_session_events(Arc::new(events));

        let error = client
            .get("me", Vec::new())
            .await
            .expect_err("still rejects");
        assert_eq!(error, ApiError::SessionExpired);
    }

    #[tokio::test]
    async fn login_401_bypasses_expiry_interception() {
        let mut tokens = token_store_with_token();
        tokens.expect_remove().times(0);

        let client = client_for(
            respond(401, json!({ "message": "Invalid credentials" })),
            tokens,
            MockNavigator::new(),
            quiet_sink(),
        );

        let error = client
            .post_json("login", json!({}))
            .await
            .expect_err("bad credentials reject");
        assert!(
            matches!(error, ApiError::Unauthorized { .. }),
            "login 401 must surface as plain unauthorized",
        );
    }

    #[tokio::test]
    async fn forbidden_notifies_and_navigates_once() {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current()
            .times(1)
            .return_const(RouteName::Dashboard);
        navigator
            .expect_push()
            .times(1)
            .withf(|route| *route == RouteName::Forbidden)
            .return_const(());

        let mut sink = MockNotificationSink::new();
        sink.expect_notify()
            .times(1)
            .withf(|notification| notification.level == Level::Error)
            .return_const(());

        let client = client_for(
            respond(403, json!({ "message": "Forbidden" })),
            token_store_with_token(),
            navigator,
            sink,
        );

        let error = client
            .get("development/all/paginated", Vec::new())
            .await
            .expect_err("forbidden rejects");
        assert_eq!(error, ApiError::Forbidden);
    }

    #[tokio::test]
    async fn missing_response_maps_to_fixed_network_message() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().returning(|_| {
            Err(TransportError::Connect {
                message: "dns failure".to_owned(),
            })
        });

        let client = client_for(
            transport,
            token_store_with_token(),
            MockNavigator::new(),
            quiet_sink(),
        );

        let error = client.get("me", Vec::new()).await.expect_err("no response");
        assert_eq!(error, ApiError::network(), "message must be the fixed string");
    }

    #[tokio::test]
    async fn cancellation_passes_through_unclassified() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .returning(|_| Err(TransportError::Cancelled));

        let client = client_for(
            transport,
            token_store_with_token(),
            MockNavigator::new(),
            quiet_sink(),
        );

        let error = client.get("me", Vec::new()).await.expect_err("cancelled");
        assert_eq!(error, ApiError::Cancelled);
    }

    #[tokio::test]
    async fn validation_failures_surface_the_field_map() {
        let body = json!({
            "message": "The given data was invalid.",
            "errors": { "name": ["Name is required."] },
        });

        let client = client_for(
            respond(422, body),
            token_store_with_token(),
            MockNavigator::new(),
            quiet_sink(),
        );

        let error = client
            .post_json("development", json!({}))
            .await
            .expect_err("validation rejects");
        let errors = error.field_errors().expect("field errors preserved");
        assert_eq!(errors.get("name"), Some(&vec!["Name is required.".to_owned()]));
    }
}
