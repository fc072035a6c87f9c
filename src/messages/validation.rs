//! Wire-level validation shared by every message variant.
//!
//! Each variant owns one immutable [`ValidationSpec`]: the accepted sequence
//! length range, its canonical name, and a table mapping field positions to
//! validator functions. [`validate_message`] runs the checks in a fixed order
//! (length, type code, then every registered field present in the sequence)
//! and collects the validated values into [`Fields`].

use serde_json::Value;

use super::{Dict, List, MessageType};
use crate::error::{Result, WampError};

/// Largest identifier representable on the wire (2^53).
pub const MAX_ID: u64 = 1 << 53;

/// Validates the value at a sequence position and stores it in [`Fields`].
///
/// Returns a description of the violation on failure; [`validate_message`]
/// prefixes it with the message name.
pub type FieldValidator = fn(&Value, usize, &mut Fields) -> std::result::Result<(), String>;

/// Per-variant wire contract.
#[derive(Debug, Clone, Copy)]
pub struct ValidationSpec {
    /// Minimum sequence length, type code included
    pub min_length: usize,
    /// Maximum sequence length, type code included
    pub max_length: usize,
    /// Canonical message name used in errors
    pub message: &'static str,
    /// Field position (>= 1) to validator
    pub spec: &'static [(usize, FieldValidator)],
}

/// Values collected by field validators.
///
/// Only the fields registered in a variant's spec (and present in the
/// sequence) are populated.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Fields {
    /// Request ID
    pub request_id: Option<u64>,
    /// Session ID (WELCOME)
    pub session_id: Option<u64>,
    /// Registration ID
    pub registration_id: Option<u64>,
    /// Subscription ID
    pub subscription_id: Option<u64>,
    /// Publication ID
    pub publication_id: Option<u64>,
    /// Type code of the request an ERROR answers
    pub message_type: Option<u64>,
    /// Realm (HELLO)
    pub realm: Option<String>,
    /// Close or abort reason URI
    pub reason: Option<String>,
    /// Error URI
    pub uri: Option<String>,
    /// Topic URI
    pub topic: Option<String>,
    /// Procedure URI
    pub procedure: Option<String>,
    /// Authentication method (CHALLENGE)
    pub authmethod: Option<String>,
    /// Challenge response (AUTHENTICATE)
    pub signature: Option<String>,
    /// Details dictionary
    pub details: Option<Dict>,
    /// Options dictionary
    pub options: Option<Dict>,
    /// Extra dictionary (CHALLENGE, AUTHENTICATE)
    pub extra: Option<Dict>,
    /// Positional payload
    pub args: Option<List>,
    /// Keyword payload
    pub kwargs: Option<Dict>,
    /// `roles` from HELLO/WELCOME details
    pub roles: Option<Dict>,
    /// `authid` from details
    pub authid: Option<String>,
    /// `authrole` from details
    pub authrole: Option<String>,
    /// `authmethods` from HELLO details
    pub authmethods: Option<Vec<String>>,
    /// `authextra` from details
    pub authextra: Option<Dict>,
}

/// Validate a raw sequence against `spec`.
///
/// Fails with a [`WampError::Protocol`] naming the message when the length is
/// out of range, the leading type code differs from `kind`, or a field
/// validator rejects its value. Nothing is constructed on failure.
pub fn validate_message(msg: &[Value], kind: MessageType, spec: &ValidationSpec) -> Result<Fields> {
    if msg.len() < spec.min_length || msg.len() > spec.max_length {
        let expected = if spec.min_length == spec.max_length {
            format!("{}", spec.min_length)
        } else {
            format!("between {} and {}", spec.min_length, spec.max_length)
        };
        return Err(WampError::Protocol(format!(
            "unexpected message length for {}, must be {}, but was {}",
            spec.message,
            expected,
            msg.len()
        )));
    }

    match msg.first().and_then(Value::as_u64) {
        Some(code) if code == kind.code() => {},
        _ => {
            let actual = msg.first().map(Value::to_string).unwrap_or_default();
            return Err(WampError::Protocol(format!(
                "invalid message type {} for {}, expected {}",
                actual,
                spec.message,
                kind.code()
            )));
        },
    }

    let mut fields = Fields::default();
    for (index, validator) in spec.spec {
        if let Some(value) = msg.get(*index) {
            validator(value, *index, &mut fields)
                .map_err(|e| WampError::Protocol(format!("{}: {}", spec.message, e)))?;
        }
    }

    Ok(fields)
}

/// Unwrap a field declared as required.
///
/// Cannot fail after a successful [`validate_message`] whose minimum length
/// covers the field.
pub(crate) fn required<T>(value: Option<T>, field: &str, message: &str) -> Result<T> {
    value.ok_or_else(|| WampError::Protocol(format!("{message}: missing {field}")))
}

fn invalid_type(index: usize, expected: &str, value: &Value) -> String {
    format!("value at index {index} must be of type '{expected}' but was {value}")
}

fn as_id(value: &Value, index: usize) -> std::result::Result<u64, String> {
    match value.as_u64() {
        Some(id) if id <= MAX_ID => Ok(id),
        Some(id) => Err(format!(
            "value at index {index} must not exceed {MAX_ID} but was {id}"
        )),
        None => Err(invalid_type(index, "integer", value)),
    }
}

fn as_string(value: &Value, index: usize) -> std::result::Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid_type(index, "string", value))
}

fn as_uri(value: &Value, index: usize) -> std::result::Result<String, String> {
    let uri = value
        .as_str()
        .ok_or_else(|| invalid_type(index, "uri", value))?;
    if uri.is_empty() || uri.chars().any(char::is_whitespace) {
        return Err(format!("value at index {index} must be a valid URI but was {value}"));
    }
    Ok(uri.to_string())
}

fn as_dict(value: &Value, index: usize) -> std::result::Result<Dict, String> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| invalid_type(index, "dict", value))
}

fn as_list(value: &Value, index: usize) -> std::result::Result<List, String> {
    value
        .as_array()
        .cloned()
        .ok_or_else(|| invalid_type(index, "list", value))
}

pub(crate) fn validate_request_id(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.request_id = Some(as_id(value, index)?);
    Ok(())
}

pub(crate) fn validate_session_id(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.session_id = Some(as_id(value, index)?);
    Ok(())
}

pub(crate) fn validate_registration_id(
    value: &Value,
    index: usize,
    fields: &mut Fields,
) -> std::result::Result<(), String> {
    fields.registration_id = Some(as_id(value, index)?);
    Ok(())
}

pub(crate) fn validate_subscription_id(
    value: &Value,
    index: usize,
    fields: &mut Fields,
) -> std::result::Result<(), String> {
    fields.subscription_id = Some(as_id(value, index)?);
    Ok(())
}

pub(crate) fn validate_publication_id(
    value: &Value,
    index: usize,
    fields: &mut Fields,
) -> std::result::Result<(), String> {
    fields.publication_id = Some(as_id(value, index)?);
    Ok(())
}

pub(crate) fn validate_message_type(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    let code = value
        .as_u64()
        .ok_or_else(|| invalid_type(index, "integer", value))?;
    fields.message_type = Some(code);
    Ok(())
}

pub(crate) fn validate_realm(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.realm = Some(as_uri(value, index)?);
    Ok(())
}

pub(crate) fn validate_reason(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.reason = Some(as_uri(value, index)?);
    Ok(())
}

pub(crate) fn validate_uri(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.uri = Some(as_uri(value, index)?);
    Ok(())
}

pub(crate) fn validate_topic(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.topic = Some(as_uri(value, index)?);
    Ok(())
}

pub(crate) fn validate_procedure(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.procedure = Some(as_uri(value, index)?);
    Ok(())
}

pub(crate) fn validate_authmethod(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.authmethod = Some(as_string(value, index)?);
    Ok(())
}

pub(crate) fn validate_signature(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.signature = Some(as_string(value, index)?);
    Ok(())
}

pub(crate) fn validate_details(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.details = Some(as_dict(value, index)?);
    Ok(())
}

pub(crate) fn validate_options(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.options = Some(as_dict(value, index)?);
    Ok(())
}

pub(crate) fn validate_extra(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.extra = Some(as_dict(value, index)?);
    Ok(())
}

pub(crate) fn validate_args(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.args = Some(as_list(value, index)?);
    Ok(())
}

pub(crate) fn validate_kwargs(value: &Value, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    fields.kwargs = Some(as_dict(value, index)?);
    Ok(())
}

/// HELLO details: `roles` is required, `authid`, `authmethods` and
/// `authextra` are optional.
pub(crate) fn validate_hello_details(
    value: &Value,
    index: usize,
    fields: &mut Fields,
) -> std::result::Result<(), String> {
    let details = as_dict(value, index)?;
    validate_roles(&details, index, fields)?;
    validate_auth_details(&details, index, fields)?;

    if let Some(methods) = details.get("authmethods") {
        let methods = methods
            .as_array()
            .ok_or_else(|| format!("authmethods in details at index {index} must be a list"))?;
        let methods = methods
            .iter()
            .map(|m| {
                m.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("authmethods in details at index {index} must be strings"))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        fields.authmethods = Some(methods);
    }

    fields.details = Some(details);
    Ok(())
}

/// WELCOME details: `roles` is required, the auth fields are optional.
pub(crate) fn validate_welcome_details(
    value: &Value,
    index: usize,
    fields: &mut Fields,
) -> std::result::Result<(), String> {
    let details = as_dict(value, index)?;
    validate_roles(&details, index, fields)?;
    validate_auth_details(&details, index, fields)?;

    if let Some(authrole) = details.get("authrole") {
        fields.authrole = Some(optional_string(authrole, "authrole", index)?);
    }
    if let Some(authmethod) = details.get("authmethod") {
        fields.authmethod = Some(optional_string(authmethod, "authmethod", index)?);
    }

    fields.details = Some(details);
    Ok(())
}

fn validate_roles(details: &Dict, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    let roles = details
        .get("roles")
        .ok_or_else(|| format!("roles missing in details at index {index}"))?;
    let roles = roles
        .as_object()
        .ok_or_else(|| format!("roles in details at index {index} must be a dict"))?;
    fields.roles = Some(roles.clone());
    Ok(())
}

fn validate_auth_details(details: &Dict, index: usize, fields: &mut Fields) -> std::result::Result<(), String> {
    if let Some(authid) = details.get("authid") {
        fields.authid = Some(optional_string(authid, "authid", index)?);
    }
    if let Some(authextra) = details.get("authextra") {
        let authextra = match authextra {
            Value::Null => Dict::new(),
            Value::Object(map) => map.clone(),
            _ => return Err(format!("authextra in details at index {index} must be a dict")),
        };
        fields.authextra = Some(authextra);
    }
    Ok(())
}

/// `null` is accepted for optional string details and maps to "".
fn optional_string(value: &Value, name: &str, index: usize) -> std::result::Result<String, String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        _ => Err(format!("{name} in details at index {index} must be a string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 4,
        message: "UNREGISTER",
        spec: &[(1, validate_request_id), (2, validate_registration_id), (3, validate_details)],
    };

    #[test]
    fn test_validate_collects_fields() {
        let msg = vec![json!(66), json!(1), json!(2)];
        let fields = validate_message(&msg, MessageType::Unregister, &TEST_SPEC).unwrap();
        assert_eq!(fields.request_id, Some(1));
        assert_eq!(fields.registration_id, Some(2));
        assert!(fields.details.is_none());
    }

    #[test]
    fn test_validate_length_bounds() {
        let short = vec![json!(66), json!(1)];
        let err = validate_message(&short, MessageType::Unregister, &TEST_SPEC).unwrap_err();
        assert!(matches!(err, WampError::Protocol(_)));
        assert!(err.to_string().contains("UNREGISTER"));

        let long = vec![json!(66), json!(1), json!(2), json!({}), json!({})];
        assert!(validate_message(&long, MessageType::Unregister, &TEST_SPEC).is_err());
    }

    #[test]
    fn test_validate_type_code() {
        let msg = vec![json!(65), json!(1), json!(2)];
        let err = validate_message(&msg, MessageType::Unregister, &TEST_SPEC).unwrap_err();
        assert!(err.to_string().contains("invalid message type"));

        let msg = vec![json!("66"), json!(1), json!(2)];
        assert!(validate_message(&msg, MessageType::Unregister, &TEST_SPEC).is_err());
    }

    #[test]
    fn test_validate_field_failure() {
        let msg = vec![json!(66), json!("one"), json!(2)];
        let err = validate_message(&msg, MessageType::Unregister, &TEST_SPEC).unwrap_err();
        assert!(err.to_string().contains("index 1"));

        let msg = vec![json!(66), json!(1), json!(2), json!([])];
        let err = validate_message(&msg, MessageType::Unregister, &TEST_SPEC).unwrap_err();
        assert!(err.to_string().contains("dict"));
    }

    #[test]
    fn test_id_range() {
        let mut fields = Fields::default();
        assert!(validate_request_id(&json!(MAX_ID), 1, &mut fields).is_ok());
        assert!(validate_request_id(&json!(MAX_ID + 1), 1, &mut fields).is_err());
        assert!(validate_request_id(&json!(-1), 1, &mut fields).is_err());
        assert!(validate_request_id(&json!(1.5), 1, &mut fields).is_err());
    }

    #[test]
    fn test_uri_shape() {
        let mut fields = Fields::default();
        assert!(validate_uri(&json!("io.xconn.test"), 1, &mut fields).is_ok());
        assert!(validate_uri(&json!(""), 1, &mut fields).is_err());
        assert!(validate_uri(&json!("has space"), 1, &mut fields).is_err());
        assert!(validate_uri(&json!(7), 1, &mut fields).is_err());
    }

    #[test]
    fn test_hello_details_require_roles() {
        let mut fields = Fields::default();
        let err = validate_hello_details(&json!({"authid": "foo"}), 2, &mut fields).unwrap_err();
        assert!(err.contains("roles"));

        let details = json!({"roles": {"caller": {}}, "authid": "foo", "authmethods": ["ticket"]});
        validate_hello_details(&details, 2, &mut fields).unwrap();
        assert_eq!(fields.authid.as_deref(), Some("foo"));
        assert_eq!(fields.authmethods, Some(vec!["ticket".to_string()]));

        let bad = json!({"roles": {}, "authmethods": [1]});
        assert!(validate_hello_details(&bad, 2, &mut Fields::default()).is_err());
    }
}
