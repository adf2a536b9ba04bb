//! Authentication primitives: bearer tokens, login credentials, and the
//! authenticated user record.
//!
//! Keep raw input parsing out of the services by exposing constructors that
//! validate before anything talks to the transport.

use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;
use serde_json::{json, Value};
use zeroize::Zeroizing;

/// Minimum plausible length for an opaque bearer credential.
pub const TOKEN_MIN_LEN: usize = 20;

/// Failures while validating a raw token value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenFormatError {
    /// The value is shorter than [`TOKEN_MIN_LEN`].
    TooShort { min: usize },
    /// The value contains whitespace or control characters.
    InvalidCharacters,
}

impl fmt::Display for TokenFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { min } => write!(f, "token must be at least {min} characters"),
            Self::InvalidCharacters => {
                write!(f, "token must not contain whitespace or control characters")
            }
        }
    }
}

impl std::error::Error for TokenFormatError {}

/// Validated opaque bearer credential.
///
/// ## Invariants
/// - At least [`TOKEN_MIN_LEN`] characters.
/// - No whitespace or control characters.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Validate and wrap a raw token value.
    ///
    /// # Errors
    ///
    /// Returns [`TokenFormatError`] when the value fails the shape check.
    pub fn parse(raw: &str) -> Result<Self, TokenFormatError> {
        if raw.chars().count() < TOKEN_MIN_LEN {
            return Err(TokenFormatError::TooShort { min: TOKEN_MIN_LEN });
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TokenFormatError::InvalidCharacters);
        }
        Ok(Self(raw.to_owned()))
    }

    /// The raw credential, for the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

// Tokens must not leak into logs through derived formatting.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(****)")
    }
}

/// Failures while validating login input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for CredentialsError {}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed and lowercased, non-empty after trimming.
/// - `password` is non-empty and retains caller-provided whitespace to
///   avoid surprising credential comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
    role: Option<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw form inputs.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] when either value is blank.
    pub fn try_new(
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<Self, CredentialsError> {
        let sanitized = email.trim().to_lowercase();
        if sanitized.is_empty() {
            return Err(CredentialsError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(CredentialsError::EmptyPassword);
        }

        Ok(Self {
            email: sanitized,
            password: Zeroizing::new(password.to_owned()),
            role: role.map(str::to_owned),
        })
    }

    /// Sanitised email address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Wire payload for the login endpoint.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({
            "email": self.email,
            "password": self.password.as_str(),
        });
        if let (Some(role), Some(map)) = (self.role.as_deref(), payload.as_object_mut()) {
            map.insert("role".to_owned(), Value::String(role.to_owned()));
        }
        payload
    }
}

/// The authenticated user as reported by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub permissions: HashSet<String>,
}

impl AuthenticatedUser {
    /// Pure capability lookup.
    #[must_use]
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }
}
