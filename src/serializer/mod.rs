//! Byte encodings for WAMP messages.
//!
//! A [`Serializer`] turns a validated [`Message`] into a transport payload
//! and back. Only the JSON encoding ships with the crate; other encodings
//! plug in behind the same trait.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wampproto::serializer::{JsonSerializer, Serializer};
//! use wampproto::messages::{Call, Message};
//!
//! let serializer = JsonSerializer;
//! let payload = serializer.serialize(&Call::new(1, "com.example.add").into())?;
//! let message = serializer.deserialize(&payload)?;
//! ```

use serde_json::Value;

use crate::error::{Result, WampError};
use crate::messages::Message;

/// Encoded message as handed to or received from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Text frame
    Text(String),
    /// Binary frame
    Binary(Vec<u8>),
}

impl Payload {
    /// Raw bytes regardless of frame kind
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(bytes)
    }
}

/// Message encoding.
///
/// Implementations must reject malformed input, non-array top-level values,
/// and unknown leading type codes instead of coercing them.
pub trait Serializer: Send + Sync {
    /// WebSocket subprotocol identifier (e.g. `wamp.2.json`)
    fn subprotocol(&self) -> &'static str;

    /// Encode a message
    fn serialize(&self, msg: &Message) -> Result<Payload>;

    /// Decode and validate a message
    fn deserialize(&self, payload: &Payload) -> Result<Message>;
}

/// JSON encoding (`wamp.2.json`), emitted as text frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn subprotocol(&self) -> &'static str {
        "wamp.2.json"
    }

    fn serialize(&self, msg: &Message) -> Result<Payload> {
        let text = serde_json::to_string(&Value::Array(msg.marshal()))?;
        Ok(Payload::Text(text))
    }

    fn deserialize(&self, payload: &Payload) -> Result<Message> {
        let value: Value = serde_json::from_slice(payload.as_bytes())?;
        match value {
            Value::Array(items) => Message::parse(&items),
            other => Err(WampError::Serialization(format!(
                "message must be a list, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Call, Dict, Hello, Registered};
    use serde_json::json;

    #[test]
    fn test_json_roundtrip() {
        let serializer = JsonSerializer;
        let call: Message = Call::new(10, "io.xconn.echo")
            .with_payload(vec![json!(1), json!("two")], Dict::new())
            .into();

        let payload = serializer.serialize(&call).unwrap();
        assert_eq!(payload, Payload::Text(r#"[48,10,{},"io.xconn.echo",[1,"two"]]"#.to_string()));
        assert_eq!(serializer.deserialize(&payload).unwrap(), call);
    }

    #[test]
    fn test_json_preserves_key_order() {
        let mut roles = Dict::new();
        roles.insert("caller".to_string(), json!({}));
        roles.insert("callee".to_string(), json!({}));
        let hello: Message = Hello::new("realm1", roles).into();

        let payload = JsonSerializer.serialize(&hello).unwrap();
        let text = String::from_utf8(payload.as_bytes().to_vec()).unwrap();
        assert!(text.find("caller").unwrap() < text.find("callee").unwrap());
    }

    #[test]
    fn test_json_accepts_binary_frames() {
        let payload = Payload::from(b"[65,2,3]".to_vec());
        assert_eq!(
            JsonSerializer.deserialize(&payload).unwrap(),
            Message::Registered(Registered::new(2, 3))
        );
    }

    #[test]
    fn test_json_rejects_bad_input() {
        let serializer = JsonSerializer;
        let err = serializer.deserialize(&Payload::from("{\"a\":1}".to_string())).unwrap_err();
        assert!(matches!(err, WampError::Serialization(_)));

        let err = serializer.deserialize(&Payload::from("[65,2".to_string())).unwrap_err();
        assert!(matches!(err, WampError::Json(_)));

        let err = serializer.deserialize(&Payload::from("[7,1]".to_string())).unwrap_err();
        assert!(matches!(err, WampError::Protocol(_)));
    }
}
