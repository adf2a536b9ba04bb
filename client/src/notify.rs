//! Transient user-facing notifications and the fixed message catalogue.

use crate::domain::ports::NotificationSink;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Warning,
    Info,
}

/// One transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    pub message: String,
}

impl Notification {
    fn new(level: Level, title: &str, message: &str) -> Self {
        Self {
            level,
            title: title.to_owned(),
            message: message.to_owned(),
        }
    }

    /// Success with the default title.
    #[must_use]
    pub fn success(message: &str) -> Self {
        Self::new(Level::Success, "Success", message)
    }

    /// Error with the default title.
    #[must_use]
    pub fn error(message: &str) -> Self {
        Self::new(Level::Error, "Error", message)
    }

    /// Warning with the default title.
    #[must_use]
    pub fn warning(message: &str) -> Self {
        Self::new(Level::Warning, "Warning", message)
    }

    /// Info with the default title.
    #[must_use]
    pub fn info(message: &str) -> Self {
        Self::new(Level::Info, "Info", message)
    }

    /// Replace the default title.
    #[must_use]
    pub fn titled(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }
}

/// Sink adapter that logs notifications through `tracing`.
///
/// Useful for headless embedders and as the default until a UI sink is
/// attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    /// Create the adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Error => {
                tracing::error!(title = %notification.title, message = %notification.message, "notification");
            }
            Level::Warning => {
                tracing::warn!(title = %notification.title, message = %notification.message, "notification");
            }
            Level::Success | Level::Info => {
                tracing::info!(title = %notification.title, message = %notification.message, "notification");
            }
        }
    }
}

/// Fixed user-facing strings.
pub mod messages {
    pub const NETWORK: &str =
        "Could not reach the server. Please check your internet connection.";
    pub const SESSION_EXPIRED: &str = "Your session has ended. Please sign in again.";
    pub const SESSION_EXPIRED_TITLE: &str = "Session Ended";
    pub const FORBIDDEN: &str = "You do not have access to this page.";
    pub const FORBIDDEN_TITLE: &str = "Access Denied";
    pub const SERVER_ERROR: &str = "Something went wrong on the server. Please try again later.";
    pub const NOT_FOUND: &str = "The data you are looking for was not found.";
    pub const LOGIN_INVALID: &str = "The email or password you entered is incorrect.";
    pub const UNKNOWN: &str = "Something went wrong. Please try again shortly.";

    pub const LOGIN_SUCCESS: &str = "Welcome back.";
    pub const LOGIN_SUCCESS_TITLE: &str = "Signed In";
    pub const LOGOUT: &str = "You have signed out.";
    pub const LOGOUT_TITLE: &str = "Goodbye";

    pub const CREATED: &str = "Data created successfully.";
    pub const UPDATED: &str = "Data updated successfully.";
    pub const DELETED: &str = "Data deleted successfully.";
    pub const DELETE_FAILED: &str = "Failed to delete data.";
    pub const RECIPIENT_APPROVED: &str = "Application approved successfully.";
    pub const RECIPIENT_REJECTED: &str = "Application rejected successfully.";
}
