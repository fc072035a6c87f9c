//! ERROR message.

use serde_json::Value;

use super::validation::{
    required, validate_args, validate_details, validate_kwargs, validate_message,
    validate_message_type, validate_request_id, validate_uri, ValidationSpec,
};
use super::{push_payload, Dict, List, MessageType, WireMessage};
use crate::error::{ApplicationError, Result};

/// `[ERROR, REQUEST.Type|int, REQUEST.Request|id, Details|dict, Error|uri,
/// Arguments|list?, ArgumentsKw|dict?]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorMessage {
    /// Type code of the request this error answers
    pub message_type: u64,
    /// Request ID of the request this error answers
    pub request_id: u64,
    /// Details dictionary
    pub details: Dict,
    /// Error URI
    pub uri: String,
    /// Positional payload
    pub args: List,
    /// Keyword payload
    pub kwargs: Dict,
}

impl ErrorMessage {
    /// Create an ERROR answering `request_id` of type `message_type`
    pub fn new(message_type: MessageType, request_id: u64, uri: impl Into<String>) -> Self {
        Self {
            message_type: message_type.code(),
            request_id,
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Attach payload
    pub fn with_payload(mut self, args: List, kwargs: Dict) -> Self {
        self.args = args;
        self.kwargs = kwargs;
        self
    }

    /// Set the details dictionary
    pub fn with_details(mut self, details: Dict) -> Self {
        self.details = details;
        self
    }

    /// Convert into an [`ApplicationError`] for the caller.
    pub fn to_application_error(&self) -> ApplicationError {
        ApplicationError::new(self.uri.clone())
            .with_args(self.args.clone())
            .with_kwargs(self.kwargs.clone())
            .with_details(self.details.clone())
    }
}

impl WireMessage for ErrorMessage {
    const KIND: MessageType = MessageType::Error;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 5,
        max_length: 7,
        message: "ERROR",
        spec: &[
            (1, validate_message_type),
            (2, validate_request_id),
            (3, validate_details),
            (4, validate_uri),
            (5, validate_args),
            (6, validate_kwargs),
        ],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            message_type: required(f.message_type, "message type", Self::KIND.name())?,
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            details: required(f.details, "details", Self::KIND.name())?,
            uri: required(f.uri, "uri", Self::KIND.name())?,
            args: f.args.unwrap_or_default(),
            kwargs: f.kwargs.unwrap_or_default(),
        })
    }

    fn marshal(&self) -> List {
        let mut out = vec![
            Value::from(Self::KIND.code()),
            Value::from(self.message_type),
            Value::from(self.request_id),
            Value::Object(self.details.clone()),
            Value::String(self.uri.clone()),
        ];
        push_payload(&mut out, &self.args, &self.kwargs);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_wire_layout() {
        let error = ErrorMessage::new(MessageType::Invocation, 10, "wamp.error.procedure_already_exists");
        assert_eq!(
            Value::Array(error.marshal()),
            json!([8, 68, 10, {}, "wamp.error.procedure_already_exists"])
        );
        assert_eq!(ErrorMessage::parse(&error.marshal()).unwrap(), error);
    }

    #[test]
    fn test_error_full_payload_roundtrip() {
        let mut kwargs = Dict::new();
        kwargs.insert("a".to_string(), json!("b"));
        let error = ErrorMessage::new(MessageType::Call, 2, "io.xconn.test")
            .with_payload(vec![json!("abc")], kwargs.clone())
            .with_details(kwargs);
        assert_eq!(error.marshal().len(), 7);
        assert_eq!(ErrorMessage::parse(&error.marshal()).unwrap(), error);
    }

    #[test]
    fn test_error_to_application_error() {
        let error = ErrorMessage::new(MessageType::Call, 2, "wamp.error.invalid_argument")
            .with_payload(vec![json!(1)], Dict::new());
        let app = error.to_application_error();
        assert_eq!(app.uri, "wamp.error.invalid_argument");
        assert_eq!(app.to_string(), "wamp.error.invalid_argument: 1");
    }

    #[test]
    fn test_error_rejects_non_integer_type() {
        let msg = vec![json!(8), json!("CALL"), json!(1), json!({}), json!("a.b")];
        assert!(ErrorMessage::parse(&msg).is_err());
    }
}
