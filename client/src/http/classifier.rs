//! Maps taxonomy errors to user-facing outcomes.
//!
//! One notification per failure, validation maps surfaced verbatim for
//! form binding, interception outcomes acknowledged silently, and
//! cancellation passed through untouched.

use std::sync::Arc;

use tracing::error;

use crate::domain::error::{ApiError, FieldErrors};
use crate::notify::{messages, Notification};
use crate::domain::ports::NotificationSink;

/// Per-call classification options.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyOptions {
    /// Emit a notification for notifiable kinds.
    pub show_notification: bool,
    /// Log the failure.
    pub log_error: bool,
    /// Diagnostics label only; no behavioural effect.
    pub context: &'static str,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            show_notification: true,
            log_error: true,
            context: "api",
        }
    }
}

impl ClassifyOptions {
    /// Default options with a diagnostics context.
    #[must_use]
    pub fn for_context(context: &'static str) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }
}

/// Outcome handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// 422: bind these to form fields.
    Validation(FieldErrors),
    /// Already handled by the interception layer; ignore or log.
    Handled,
    /// Notified (or suppressed); nothing further for the caller.
    Silent,
    /// Aborted by the client; special-case, never report.
    Cancelled,
}

/// Error classifier over a notification sink.
pub struct ErrorClassifier {
    sink: Arc<dyn NotificationSink>,
}

impl ErrorClassifier {
    /// Classifier emitting through the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Classify one failure, emitting at most one notification.
    pub fn handle(&self, failure: &ApiError, options: &ClassifyOptions) -> Classified {
        if matches!(failure, ApiError::Cancelled) {
            return Classified::Cancelled;
        }

        if options.log_error {
            error!(context = options.context, error = %failure, "request failed");
        }

        match failure {
            ApiError::Validation { errors } => Classified::Validation(errors.clone()),
            ApiError::SessionExpired | ApiError::Forbidden => Classified::Handled,
            ApiError::Network { message }
            | ApiError::BadRequest { message }
            | ApiError::Unauthorized { message }
            | ApiError::Unexpected { message, .. } => {
                self.emit(options, message);
                Classified::Silent
            }
            ApiError::NotFound { .. } => {
                self.emit(options, messages::NOT_FOUND);
                Classified::Silent
            }
            ApiError::Server { .. } => {
                self.emit(options, messages::SERVER_ERROR);
                Classified::Silent
            }
            ApiError::Decode { .. }
            | ApiError::InvalidToken
            | ApiError::InvalidUserData
            | ApiError::Cancelled => {
                self.emit(options, messages::UNKNOWN);
                Classified::Silent
            }
        }
    }

    /// Login-specific mapping: credential failures collapse to one fixed
    /// message; everything else goes through the general path.
    #[must_use]
    pub fn login_message(&self, failure: &ApiError) -> String {
        match failure.status() {
            Some(401 | 422) => messages::LOGIN_INVALID.to_owned(),
            _ => {
                self.handle(failure, &ClassifyOptions::for_context("login"));
                messages::UNKNOWN.to_owned()
            }
        }
    }

    fn emit(&self, options: &ClassifyOptions, message: &str) {
        if options.show_notification {
            self.sink.notify(Notification::error(message));
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for classification outcomes.

    use super::*;
    use crate::domain::ports::MockNotificationSink;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn classifier_expecting(notifications: usize) -> ErrorClassifier {
        let mut sink = MockNotificationSink::new();
        sink.expect_notify().times(notifications).return_const(());
        ErrorClassifier::new(Arc::new(sink))
    }

    #[test]
    fn validation_surfaces_the_field_map_without_notifying() {
        let errors: FieldErrors =
            BTreeMap::from([("name".to_owned(), vec!["required".to_owned()])]);
        let classifier = classifier_expecting(0);

        let outcome = classifier.handle(
            &ApiError::Validation { errors: errors.clone() },
            &ClassifyOptions::default(),
        );
        assert_eq!(outcome, Classified::Validation(errors));
    }

    #[rstest]
    #[case::expired(ApiError::SessionExpired)]
    #[case::forbidden(ApiError::Forbidden)]
    fn interception_outcomes_stay_silent(#[case] failure: ApiError) {
        let classifier = classifier_expecting(0);
        let outcome = classifier.handle(&failure, &ClassifyOptions::default());
        assert_eq!(outcome, Classified::Handled);
    }

    #[test]
    fn cancellation_is_never_classified() {
        let classifier = classifier_expecting(0);
        let outcome = classifier.handle(&ApiError::Cancelled, &ClassifyOptions::default());
        assert_eq!(outcome, Classified::Cancelled);
    }

    #[rstest]
    #[case::network(ApiError::network())]
    #[case::not_found(ApiError::NotFound { message: "missing".to_owned() })]
    #[case::server(ApiError::Server { message: "boom".to_owned() })]
    #[case::decode(ApiError::decode("truncated"))]
    fn notifiable_kinds_emit_exactly_one_notification(#[case] failure: ApiError) {
        let classifier = classifier_expecting(1);
        let outcome = classifier.handle(&failure, &ClassifyOptions::default());
        assert_eq!(outcome, Classified::Silent);
    }

    #[test]
    fn notifications_can_be_suppressed() {
        let classifier = classifier_expecting(0);
        let options = ClassifyOptions {
            show_notification: false,
            ..ClassifyOptions::default()
        };
        let outcome = classifier.handle(&ApiError::network(), &options);
        assert_eq!(outcome, Classified::Silent);
    }

    #[rstest]
    #[case::unauthorized(ApiError::Unauthorized { message: "nope".to_owned() })]
    #[case::validation(ApiError::Validation { errors: BTreeMap::new() })]
    fn login_credential_failures_collapse_to_fixed_message(#[case] failure: ApiError) {
        let classifier = classifier_expecting(0);
        assert_eq!(classifier.login_message(&failure), messages::LOGIN_INVALID);
    }

    #[test]
    fn other_login_failures_fall_back_to_generic_message() {
        let classifier = classifier_expecting(1);
        assert_eq!(
            classifier.login_message(&ApiError::Server { message: "boom".to_owned() }),
            messages::UNKNOWN,
        );
    }
}
