//! Domain types and ports.
//!
//! Purpose: strongly typed records, validated inputs, and the driven ports
//! the adapters implement. Types stay transport-agnostic; the HTTP layer
//! maps them onto the wire.

pub mod auth;
pub mod derived;
pub mod development;
pub mod error;
pub mod head_of_family;
pub mod ports;
pub mod routes;
pub mod social_assistance;
pub mod social_assistance_recipient;
pub mod upload;
pub mod user;

pub use self::auth::{
    AuthenticatedUser, BearerToken, CredentialsError, LoginCredentials, TokenFormatError,
    TOKEN_MIN_LEN,
};
pub use self::error::{first_messages, ApiError, FieldErrors};
pub use self::ports::{Navigator, NotificationSink, SessionEvents, TokenStore, TokenStoreError};
pub use self::routes::{RouteMeta, RouteName};
pub use self::upload::{FileUpload, UploadValidationError};

#[cfg(test)]
pub use self::ports::{MockNavigator, MockNotificationSink, MockSessionEvents, MockTokenStore};
