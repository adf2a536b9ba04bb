//! HTTP layer: configuration, transport port and adapter, middleware
//! chain, the API client, and the error classifier.

pub mod classifier;
pub mod client;
pub mod config;
pub mod middleware;
pub mod transport;

pub use self::classifier::{Classified, ClassifyOptions, ErrorClassifier};
pub use self::client::ApiClient;
pub use self::config::{ApiConfig, ConfigError};
pub use self::transport::{
    file_field, text_field, ApiRequest, FormField, FormValue, HttpTransport, Method, RawResponse,
    ReqwestTransport, RequestBody, TransportError, LOGIN_PATH,
};
