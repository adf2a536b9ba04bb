//! Client-side core for the civic welfare administration console.
//!
//! Layers, leaf-first: validated domain types and ports (`domain`), the
//! authenticated HTTP client with its interception chain (`http`), token
//! persistence (`token`), the paginated-query cache and controller
//! (`query`), typed entity services (`services`), the session state
//! machine (`session`), and the navigation guard (`guard`). `app` wires
//! one context object at process start.

pub mod app;
pub mod domain;
pub mod guard;
pub mod http;
pub mod notify;
pub mod query;
pub mod services;
pub mod session;
pub mod telemetry;
pub mod token;

pub use app::AppContext;
pub use domain::{ApiError, LoginCredentials, RouteName};
pub use session::{SessionPhase, SessionStore};
