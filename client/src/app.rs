//! Application bootstrap: every context object constructed once, wired
//! explicitly, and handed to the embedder.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{Navigator, NotificationSink, TokenStore};
use crate::guard::RouteGuard;
use crate::http::classifier::ErrorClassifier;
use crate::http::client::ApiClient;
use crate::http::config::ApiConfig;
use crate::http::transport::{HttpTransport, ReqwestTransport};
use crate::query::cache::QueryCache;
use crate::services::auth::AuthApi;
use crate::services::{
    DashboardService, DevelopmentService, HeadOfFamilyService, RecipientService, ServiceDeps,
    SocialAssistanceService,
};
use crate::session::SessionStore;
use crate::token::FileTokenStore;

/// Fully wired client context.
///
/// Construction order matters: the client is built first, then the session
/// store on top of it, then the session-events listener is bound so the
/// 401 interceptor can clear the session. Dropping the context tears
/// everything down.
pub struct AppContext<T> {
    pub client: Arc<ApiClient<T>>,
    pub cache: Arc<QueryCache>,
    pub classifier: Arc<ErrorClassifier>,
    pub session: Arc<SessionStore<T>>,
    pub guard: RouteGuard<T>,
    pub dashboard: DashboardService<T>,
    pub head_of_families: Arc<HeadOfFamilyService<T>>,
    pub social_assistances: Arc<SocialAssistanceService<T>>,
    pub recipients: Arc<RecipientService<T>>,
    pub developments: Arc<DevelopmentService<T>>,
}

impl<T: HttpTransport + 'static> AppContext<T> {
    /// Wire a context over an explicit transport and ports.
    #[must_use]
    pub fn wire(
        transport: Arc<T>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let client = Arc::new(ApiClient::new(
            transport,
            Arc::clone(&tokens),
            Arc::clone(&navigator),
            Arc::clone(&sink),
        ));
        let cache = Arc::new(QueryCache::new());
        let classifier = Arc::new(ErrorClassifier::new(Arc::clone(&sink)));

        let session = Arc::new(SessionStore::new(
            AuthApi::new(Arc::clone(&client)),
            tokens,
            navigator,
            Arc::clone(&sink),
            Arc::clone(&classifier),
        ));
        client.bind_session_events(
            Arc::clone(&session) as Arc<dyn crate::domain::ports::SessionEvents>
        );
        session.initialize();

        let deps = ServiceDeps {
            client: Arc::clone(&client),
            cache: Arc::clone(&cache),
            classifier: Arc::clone(&classifier),
            sink,
        };

        Self {
            guard: RouteGuard::new(Arc::clone(&session)),
            dashboard: DashboardService::new(deps.clone()),
            head_of_families: Arc::new(HeadOfFamilyService::new(deps.clone())),
            social_assistances: Arc::new(SocialAssistanceService::new(deps.clone())),
            recipients: Arc::new(RecipientService::new(deps.clone())),
            developments: Arc::new(DevelopmentService::new(deps)),
            client,
            cache,
            classifier,
            session,
        }
    }
}

impl AppContext<ReqwestTransport> {
    /// Wire a context over the real transport, with a file token store.
    ///
    /// # Errors
    ///
    /// Returns the reqwest construction error when the HTTP client cannot
    /// be built.
    pub fn bootstrap(
        config: &ApiConfig,
        token_path: std::path::PathBuf,
        navigator: Arc<dyn Navigator>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, reqwest::Error> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        let tokens = Arc::new(FileTokenStore::with_default_ttl(token_path, clock));
        Ok(Self::wire(transport, tokens, navigator, sink))
    }
}
