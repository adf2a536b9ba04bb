//! Authentication endpoints: login, logout, profile.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::domain::auth::{AuthenticatedUser, BearerToken, LoginCredentials};
use crate::domain::error::ApiError;
use crate::http::client::ApiClient;
use crate::http::transport::{HttpTransport, LOGIN_PATH};
use crate::services::{data_field, decode};

/// Thin typed wrapper over the auth endpoints.
pub struct AuthApi<T> {
    client: Arc<ApiClient<T>>,
}

impl<T: HttpTransport> AuthApi<T> {
    /// API over the shared client.
    #[must_use]
    pub fn new(client: Arc<ApiClient<T>>) -> Self {
        Self { client }
    }

    /// Post credentials and validate the returned token shape.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidToken`] when the response carries no
    /// plausible token, or the transport/taxonomy error otherwise.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<String, ApiError> {
        let body = self
            .client
            .post_json(LOGIN_PATH, credentials.to_payload())
            .await?;

        let raw = body
            .get("token")
            .and_then(Value::as_str)
            .ok_or(ApiError::InvalidToken)?;
        BearerToken::parse(raw).map_err(|_| ApiError::InvalidToken)?;

        info!(email = credentials.email(), "login accepted");
        Ok(raw.to_owned())
    }

    /// Best-effort server-side session invalidation.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy error; callers treat failures as advisory.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.client
            .post_json("logout", Value::Null)
            .await
            .map(|_| ())
    }

    /// Fetch the authenticated profile.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUserData`] when the envelope or record
    /// is unusable.
    pub async fn fetch_user(&self) -> Result<AuthenticatedUser, ApiError> {
        let body = self.client.get("me", Vec::new()).await?;
        let record = data_field(&body).map_err(|_| ApiError::InvalidUserData)?;
        decode::<AuthenticatedUser>(record).map_err(|_| ApiError::InvalidUserData)
    }
}
