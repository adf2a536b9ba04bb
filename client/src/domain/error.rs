//! Client-side error taxonomy.
//!
//! Every failure a caller can observe is one of these kinds. The HTTP layer
//! maps raw statuses into the taxonomy; the classifier maps the taxonomy
//! into user-facing outcomes. Kinds handled by the interception layer
//! (`SessionExpired`, `Forbidden`) reach callers only as already-handled
//! rejections.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::notify::messages;

/// Per-field validation messages exactly as the server sent them.
///
/// The full message array per field is preserved; flattening to the first
/// message is a presentation choice made by [`first_messages`].
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Failure kinds surfaced by the client.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// No response reached the client at all.
    #[error("{message}")]
    Network { message: String },
    /// A 401 outside the login endpoint; the interceptor already cleared
    /// the session and navigated.
    #[error("session expired")]
    SessionExpired,
    /// A 403; the interceptor already notified and navigated.
    #[error("access forbidden")]
    Forbidden,
    /// A 401 on the login endpoint itself (bad credentials).
    #[error("{message}")]
    Unauthorized { message: String },
    /// 404.
    #[error("{message}")]
    NotFound { message: String },
    /// 400 with the server-provided message.
    #[error("{message}")]
    BadRequest { message: String },
    /// 422 with the per-field error map surfaced verbatim.
    #[error("validation failed")]
    Validation { errors: FieldErrors },
    /// 5xx.
    #[error("{message}")]
    Server { message: String },
    /// Any other status.
    #[error("{message}")]
    Unexpected { status: u16, message: String },
    /// The response arrived but its payload was malformed. A malformed
    /// paginated envelope is a fetch failure, never partial data.
    #[error("response failed to decode: {message}")]
    Decode { message: String },
    /// The request was aborted by the client; not a failure.
    #[error("request cancelled")]
    Cancelled,
    /// The login response carried a missing or malformed token.
    #[error("login response carried an invalid token")]
    InvalidToken,
    /// The profile response carried no usable user record.
    #[error("profile response carried invalid user data")]
    InvalidUserData,
}

impl ApiError {
    /// Network failure with the fixed user-facing message.
    #[must_use]
    pub fn network() -> Self {
        Self::Network {
            message: messages::NETWORK.to_owned(),
        }
    }

    /// Decode failure from any displayable cause.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Map a non-intercepted HTTP status and body into the taxonomy.
    ///
    /// The 422 `errors` map is preserved verbatim; when the server omits it
    /// the message is carried under a synthetic `_error` field so form
    /// binding still has something to show.
    #[must_use]
    pub fn from_status(status: u16, body: &Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(messages::UNKNOWN)
            .to_owned();

        match status {
            400 => Self::BadRequest { message },
            401 => Self::Unauthorized { message },
            403 => Self::Forbidden,
            404 => Self::NotFound { message },
            422 => Self::Validation {
                errors: field_errors_from_body(body, &message),
            },
            500..=599 => Self::Server { message },
            _ => Self::Unexpected { status, message },
        }
    }

    /// The HTTP status this kind originated from, when one exists.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired | Self::Unauthorized { .. } => Some(401),
            Self::Forbidden => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::BadRequest { .. } => Some(400),
            Self::Validation { .. } => Some(422),
            Self::Server { .. } => Some(500),
            Self::Unexpected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The verbatim per-field errors, when this is a validation failure.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}

fn field_errors_from_body(body: &Value, fallback_message: &str) -> FieldErrors {
    let Some(map) = body.get("errors").and_then(Value::as_object) else {
        return BTreeMap::from([("_error".to_owned(), vec![fallback_message.to_owned()])]);
    };

    map.iter()
        .map(|(field, messages)| {
            let messages = match messages {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect(),
                Value::String(message) => vec![message.clone()],
                _ => Vec::new(),
            };
            (field.clone(), messages)
        })
        .collect()
}

/// Flatten a field-error map to the first message per field, for inline
/// form rendering.
#[must_use]
pub fn first_messages(errors: &FieldErrors) -> BTreeMap<String, String> {
    errors
        .iter()
        .filter_map(|(field, messages)| {
            messages
                .first()
                .map(|message| (field.clone(), message.clone()))
        })
        .collect()
}
