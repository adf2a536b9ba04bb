//! Entity services: typed operations over the API client plus the
//! mutation/cache-invalidation contract every write path follows.

pub mod auth;
pub mod crud;
pub mod dashboard;
pub mod development;
pub mod head_of_family;
pub mod social_assistance;
pub mod social_assistance_recipient;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::error::ApiError;
use crate::domain::ports::NotificationSink;
use crate::http::classifier::ErrorClassifier;
use crate::http::client::ApiClient;
use crate::query::cache::QueryCache;

pub use self::auth::AuthApi;
pub use self::dashboard::DashboardService;
pub use self::development::DevelopmentService;
pub use self::head_of_family::HeadOfFamilyService;
pub use self::social_assistance::SocialAssistanceService;
pub use self::social_assistance_recipient::RecipientService;

/// Shared dependencies injected into every service.
pub struct ServiceDeps<T> {
    pub client: Arc<ApiClient<T>>,
    pub cache: Arc<QueryCache>,
    pub classifier: Arc<ErrorClassifier>,
    pub sink: Arc<dyn NotificationSink>,
}

impl<T> Clone for ServiceDeps<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            cache: Arc::clone(&self.cache),
            classifier: Arc::clone(&self.classifier),
            sink: Arc::clone(&self.sink),
        }
    }
}

/// Unwrap the single-resource `{ data: ... }` envelope.
pub(crate) fn data_field(body: &Value) -> Result<&Value, ApiError> {
    body.get("data")
        .ok_or_else(|| ApiError::decode("response missing data envelope"))
}

/// Decode a JSON value into a typed record.
pub(crate) fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, ApiError> {
    serde_json::from_value(value.clone()).map_err(|error| ApiError::decode(error.to_string()))
}
