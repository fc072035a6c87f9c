//! WAMP protocol error types.
//!
//! # Error Classification
//!
//! | Variant           | Raised by                          | Meaning                                   |
//! |-------------------|------------------------------------|-------------------------------------------|
//! | `Protocol`        | `parse`, serializers               | Malformed wire message                    |
//! | `Correlation`     | `WampSession`, `Joiner`            | Response/push without a matching request, or a handshake message in the wrong state |
//! | `SessionNotReady` | `Joiner::session_details`          | Handshake has not completed               |
//! | `Application`     | `Joiner` (ABORT), peers (ERROR)    | Structured URI error with payload         |
//! | `Auth`            | authenticators                     | Missing challenge fields, bad key material |
//!
//! None of these are retried internally. The `Auth` variant preserves the
//! full error chain via `#[source]`.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::auth::AuthError;
use crate::messages::{Dict, List};

/// WAMP protocol errors.
#[derive(Error, Debug)]
pub enum WampError {
    /// Malformed wire message (length, type code, or field validation).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Message does not correlate with any outstanding request, registration,
    /// subscription, or the current handshake state.
    #[error("Correlation error: {0}")]
    Correlation(String),

    /// Session details requested before the handshake completed.
    #[error("Session not ready: {0}")]
    SessionNotReady(String),

    /// Structured application error (peer ERROR or ABORT reason).
    #[error("Application error: {0}")]
    Application(ApplicationError),

    /// Authenticator failure.
    #[error("Authentication error: {0}")]
    Auth(#[source] AuthError),

    /// Serializer failure that is not a JSON error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for WAMP operations
pub type Result<T> = std::result::Result<T, WampError>;

impl From<AuthError> for WampError {
    fn from(err: AuthError) -> Self {
        WampError::Auth(err)
    }
}

impl From<ApplicationError> for WampError {
    fn from(err: ApplicationError) -> Self {
        WampError::Application(err)
    }
}

impl From<toml::de::Error> for WampError {
    fn from(err: toml::de::Error) -> Self {
        WampError::Config(format!("Failed to parse config: {err}"))
    }
}

/// Application-level error identified by a URI.
///
/// Carries the optional positional and keyword payload of an ERROR or ABORT
/// message, plus its details dictionary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplicationError {
    /// Error URI (e.g. `wamp.error.not_authorized`)
    pub uri: String,
    /// Positional arguments
    pub args: List,
    /// Keyword arguments
    pub kwargs: Dict,
    /// Details dictionary from the originating message
    pub details: Dict,
}

impl ApplicationError {
    /// Create an error with only a URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Attach positional arguments
    pub fn with_args(mut self, args: List) -> Self {
        self.args = args;
        self
    }

    /// Attach keyword arguments
    pub fn with_kwargs(mut self, kwargs: Dict) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Attach the details dictionary
    pub fn with_details(mut self, details: Dict) -> Self {
        self.details = details;
        self
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)?;

        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(display_value).collect();
            write!(f, ": {}", args.join(", "))?;
        }

        if !self.kwargs.is_empty() {
            let kwargs: Vec<String> = self
                .kwargs
                .iter()
                .map(|(key, value)| format!("{key}={}", display_value(value)))
                .collect();
            write!(f, ": {}", kwargs.join(", "))?;
        }

        Ok(())
    }
}

impl std::error::Error for ApplicationError {}

/// Strings render bare, everything else as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dict(value: Value) -> Dict {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_application_error_uri_only() {
        let err = ApplicationError::new("Unexpected error");
        assert_eq!(err.to_string(), "Unexpected error");
    }

    #[test]
    fn test_application_error_with_args() {
        let err =
            ApplicationError::new("Authentication failed").with_args(vec![json!("username"), json!("password")]);
        assert_eq!(err.to_string(), "Authentication failed: username, password");
    }

    #[test]
    fn test_application_error_with_kwargs() {
        let err = ApplicationError::new("Permission denied")
            .with_kwargs(dict(json!({"user": "admin", "role": "guest"})));
        assert_eq!(err.to_string(), "Permission denied: user=admin, role=guest");
    }

    #[test]
    fn test_application_error_with_args_and_kwargs() {
        let err = ApplicationError::new("Something went wrong")
            .with_args(vec![json!(42), json!("test")])
            .with_kwargs(dict(json!({"code": 500, "reason": "Internal Server error"})));
        assert_eq!(
            err.to_string(),
            "Something went wrong: 42, test: code=500, reason=Internal Server error"
        );
    }

    #[test]
    fn test_application_error_empty_payload() {
        let err = ApplicationError::new("Some error")
            .with_args(Vec::new())
            .with_kwargs(Dict::new());
        assert_eq!(err.to_string(), "Some error");
    }

    #[test]
    fn test_auth_error_source_chain() {
        use std::error::Error;

        let err: WampError = AuthError::IterationsMissing.into();
        assert!(matches!(err, WampError::Auth(_)));

        let source = err.source();
        assert!(source.is_some());
        assert!(source.unwrap().to_string().contains("Iterations missing"));
    }
}
