//! Transport port and its reqwest adapter.
//!
//! The adapter owns transport details only: URL joining, body encoding,
//! timeout mapping, and JSON decoding. Policy (bearer attachment, status
//! interception) lives in the client on top of this port.

use async_trait::async_trait;
use reqwest::multipart;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::domain::auth::BearerToken;
use crate::domain::upload::FileUpload;
use crate::http::config::ApiConfig;

/// Path of the login endpoint, exempt from bearer attachment and expiry
/// interception.
pub const LOGIN_PATH: &str = "login";

/// HTTP verbs the API uses.
///
/// Updates go through POST with a `_method=PUT` override, so PUT itself
/// never appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// Request body shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<FormField>),
}

/// One multipart form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

/// Text or file content of a form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File(FileUpload),
}

/// An outbound API request before transport encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Correlates the request across log lines.
    pub request_id: Uuid,
    pub method: Method,
    /// Relative path, no leading slash (joined onto the base URL).
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Attached by the bearer middleware; never set by callers.
    pub bearer: Option<BearerToken>,
    /// Marks a retried request so expiry interception fires at most once.
    pub retry: bool,
}

impl ApiRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method,
            path: path.trim_start_matches('/').to_owned(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
            retry: false,
        }
    }

    /// A GET request.
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    /// A POST request with a JSON body.
    #[must_use]
    pub fn post_json(path: &str, body: Value) -> Self {
        let mut request = Self::new(Method::Post, path);
        request.body = RequestBody::Json(body);
        request
    }

    /// A POST request with a multipart body.
    #[must_use]
    pub fn post_multipart(path: &str, fields: Vec<FormField>) -> Self {
        let mut request = Self::new(Method::Post, path);
        request.body = RequestBody::Multipart(fields);
        request
    }

    /// A DELETE request.
    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append query parameters.
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query.extend(query);
        self
    }

    /// Whether this request targets the login endpoint.
    #[must_use]
    pub fn is_login(&self) -> bool {
        self.path == LOGIN_PATH
    }
}

/// Text form field helper.
#[must_use]
pub fn text_field(name: &str, value: impl Into<String>) -> FormField {
    FormField {
        name: name.to_owned(),
        value: FormValue::Text(value.into()),
    }
}

/// File form field helper.
#[must_use]
pub fn file_field(name: &str, upload: FileUpload) -> FormField {
    FormField {
        name: name.to_owned(),
        value: FormValue::File(upload),
    }
}

/// A decoded response: status plus JSON payload (`Null` for empty bodies).
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP status level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request exceeded the configured timeout.
    #[error("request timed out: {message}")]
    Timeout { message: String },
    /// No connection could be established or it broke mid-flight.
    #[error("connection failed: {message}")]
    Connect { message: String },
    /// The caller aborted the request.
    #[error("request cancelled")]
    Cancelled,
    /// A success response carried an undecodable body.
    #[error("response body was not valid JSON: {message}")]
    Decode { message: String },
}

/// Driven port for request execution.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute one request and decode its response.
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError>;
}

/// Reqwest-backed transport adapter.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Build an adapter with the configured endpoint and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url().clone(),
        })
    }

    fn build_url(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        self.base_url
            .join(&request.path)
            .map_err(|error| TransportError::Connect {
                message: format!("invalid request path {:?}: {error}", request.path),
            })
    }
}

fn multipart_form(fields: Vec<FormField>) -> Result<multipart::Form, TransportError> {
    let mut form = multipart::Form::new();
    for field in fields {
        form = match field.value {
            FormValue::Text(value) => form.text(field.name, value),
            FormValue::File(upload) => {
                let part = multipart::Part::bytes(upload.bytes().to_vec())
                    .file_name(upload.filename().to_owned())
                    .mime_str(upload.content_type())
                    .map_err(|error| TransportError::Connect {
                        message: format!("invalid upload content type: {error}"),
                    })?;
                form.part(field.name, part)
            }
        };
    }
    Ok(form)
}

fn map_send_error(error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            message: error.to_string(),
        }
    } else {
        TransportError::Connect {
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let url = self.build_url(&request)?;
        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Delete => self.client.delete(url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(fields) => builder.multipart(multipart_form(fields)?),
        };

        let response = builder.send().await.map_err(|e| map_send_error(&e))?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| map_send_error(&e))?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                // Error pages are allowed to be non-JSON; success bodies
                // are not.
                Err(error) if (200..300).contains(&status) => {
                    return Err(TransportError::Decode {
                        message: error.to_string(),
                    });
                }
                Err(_) => Value::Null,
            }
        };

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for request construction helpers.

    use super::*;

    #[test]
    fn login_detection_ignores_leading_slash() {
        assert!(ApiRequest::post_json("/login", Value::Null).is_login());
        assert!(!ApiRequest::get("development/all/paginated").is_login());
    }

    #[test]
    fn requests_start_without_bearer_or_retry() {
        let request = ApiRequest::get("me");
        assert_eq!(request.bearer, None);
        assert!(!request.retry);
    }
}
