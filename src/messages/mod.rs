//! WAMP message catalogue.
//!
//! Every wire message is a heterogeneous JSON-like sequence whose first
//! element is the protocol-fixed type code:
//!
//! ```text
//! [1, "realm1", {"roles": {...}, "authmethods": ["anonymous"]}]   HELLO
//! [48, 7, {}, "com.example.add", [1, 2]]                           CALL
//! ```
//!
//! The catalogue is closed: [`Message`] enumerates every variant and each
//! variant struct implements [`WireMessage`] with its type code, its
//! [`ValidationSpec`], and the `parse`/`marshal` pair.
//!
//! ## Type Codes
//!
//! | Session        | Code | PubSub        | Code | RPC           | Code |
//! |----------------|------|---------------|------|---------------|------|
//! | HELLO          | 1    | PUBLISH       | 16   | CALL          | 48   |
//! | WELCOME        | 2    | PUBLISHED     | 17   | CANCEL        | 49   |
//! | ABORT          | 3    | SUBSCRIBE     | 32   | RESULT        | 50   |
//! | CHALLENGE      | 4    | SUBSCRIBED    | 33   | REGISTER      | 64   |
//! | AUTHENTICATE   | 5    | UNSUBSCRIBE   | 34   | REGISTERED    | 65   |
//! | GOODBYE        | 6    | UNSUBSCRIBED  | 35   | UNREGISTER    | 66   |
//! | ERROR          | 8    | EVENT         | 36   | UNREGISTERED  | 67   |
//! |                |      |               |      | INVOCATION    | 68   |
//! |                |      |               |      | INTERRUPT     | 69   |
//! |                |      |               |      | YIELD         | 70   |
//!
//! ## Optional Payload
//!
//! Trailing `args`/`kwargs` fields are optional on the wire. Missing fields
//! parse as an empty list/dict and `marshal` omits them when empty, so
//! `parse(marshal(m)) == m` for every message.

mod error;
mod pubsub;
mod rpc;
mod session;
pub mod validation;

use std::fmt;

use serde_json::Value;

use crate::error::{Result, WampError};

pub use error::ErrorMessage;
pub use pubsub::{
    Event, Publish, Published, Subscribe, Subscribed, Unsubscribe, Unsubscribed,
};
pub use rpc::{
    Call, CallResult, Cancel, Interrupt, Invocation, Register, Registered, Unregister,
    Unregistered, Yield,
};
pub use session::{Abort, Authenticate, Challenge, Goodbye, Hello, Welcome};
pub use validation::{validate_message, FieldValidator, Fields, ValidationSpec, MAX_ID};

/// Dictionary field (`details`, `options`, `kwargs`, ...)
pub type Dict = serde_json::Map<String, Value>;

/// List field (`args`)
pub type List = Vec<Value>;

/// Message types in the WAMP protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Session open request
    Hello,
    /// Session accepted
    Welcome,
    /// Session rejected
    Abort,
    /// Authentication challenge
    Challenge,
    /// Challenge response
    Authenticate,
    /// Session close
    Goodbye,
    /// Error reply to a request
    Error,
    /// Publish to a topic
    Publish,
    /// Publish acknowledgement
    Published,
    /// Subscribe to a topic
    Subscribe,
    /// Subscribe acknowledgement
    Subscribed,
    /// Unsubscribe from a topic
    Unsubscribe,
    /// Unsubscribe acknowledgement
    Unsubscribed,
    /// Event delivered for a subscription
    Event,
    /// Call a procedure
    Call,
    /// Cancel a pending call
    Cancel,
    /// Call result
    Result,
    /// Register a procedure
    Register,
    /// Register acknowledgement
    Registered,
    /// Unregister a procedure
    Unregister,
    /// Unregister acknowledgement
    Unregistered,
    /// Call forwarded to a registered procedure
    Invocation,
    /// Interrupt a pending invocation
    Interrupt,
    /// Invocation result
    Yield,
}

impl MessageType {
    /// Protocol-fixed type code
    pub const fn code(self) -> u64 {
        match self {
            MessageType::Hello => 1,
            MessageType::Welcome => 2,
            MessageType::Abort => 3,
            MessageType::Challenge => 4,
            MessageType::Authenticate => 5,
            MessageType::Goodbye => 6,
            MessageType::Error => 8,
            MessageType::Publish => 16,
            MessageType::Published => 17,
            MessageType::Subscribe => 32,
            MessageType::Subscribed => 33,
            MessageType::Unsubscribe => 34,
            MessageType::Unsubscribed => 35,
            MessageType::Event => 36,
            MessageType::Call => 48,
            MessageType::Cancel => 49,
            MessageType::Result => 50,
            MessageType::Register => 64,
            MessageType::Registered => 65,
            MessageType::Unregister => 66,
            MessageType::Unregistered => 67,
            MessageType::Invocation => 68,
            MessageType::Interrupt => 69,
            MessageType::Yield => 70,
        }
    }

    /// Canonical upper-case name
    pub const fn name(self) -> &'static str {
        match self {
            MessageType::Hello => "HELLO",
            MessageType::Welcome => "WELCOME",
            MessageType::Abort => "ABORT",
            MessageType::Challenge => "CHALLENGE",
            MessageType::Authenticate => "AUTHENTICATE",
            MessageType::Goodbye => "GOODBYE",
            MessageType::Error => "ERROR",
            MessageType::Publish => "PUBLISH",
            MessageType::Published => "PUBLISHED",
            MessageType::Subscribe => "SUBSCRIBE",
            MessageType::Subscribed => "SUBSCRIBED",
            MessageType::Unsubscribe => "UNSUBSCRIBE",
            MessageType::Unsubscribed => "UNSUBSCRIBED",
            MessageType::Event => "EVENT",
            MessageType::Call => "CALL",
            MessageType::Cancel => "CANCEL",
            MessageType::Result => "RESULT",
            MessageType::Register => "REGISTER",
            MessageType::Registered => "REGISTERED",
            MessageType::Unregister => "UNREGISTER",
            MessageType::Unregistered => "UNREGISTERED",
            MessageType::Invocation => "INVOCATION",
            MessageType::Interrupt => "INTERRUPT",
            MessageType::Yield => "YIELD",
        }
    }

    /// Look up a type by its wire code
    pub fn from_code(code: u64) -> Option<Self> {
        let kind = match code {
            1 => MessageType::Hello,
            2 => MessageType::Welcome,
            3 => MessageType::Abort,
            4 => MessageType::Challenge,
            5 => MessageType::Authenticate,
            6 => MessageType::Goodbye,
            8 => MessageType::Error,
            16 => MessageType::Publish,
            17 => MessageType::Published,
            32 => MessageType::Subscribe,
            33 => MessageType::Subscribed,
            34 => MessageType::Unsubscribe,
            35 => MessageType::Unsubscribed,
            36 => MessageType::Event,
            48 => MessageType::Call,
            49 => MessageType::Cancel,
            50 => MessageType::Result,
            64 => MessageType::Register,
            65 => MessageType::Registered,
            66 => MessageType::Unregister,
            67 => MessageType::Unregistered,
            68 => MessageType::Invocation,
            69 => MessageType::Interrupt,
            70 => MessageType::Yield,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single message variant with its wire contract.
pub trait WireMessage: Sized {
    /// Message type (code and canonical name)
    const KIND: MessageType;

    /// Length and field validation rules
    const VALIDATION_SPEC: ValidationSpec;

    /// Validate a raw sequence and build the message
    fn parse(msg: &[Value]) -> Result<Self>;

    /// Emit `[code, field1, field2, ...]` in canonical order
    fn marshal(&self) -> List;
}

/// Append the optional `args`/`kwargs` tail.
///
/// `args` is emitted whenever `kwargs` is, since positions are fixed.
pub(crate) fn push_payload(out: &mut List, args: &List, kwargs: &Dict) {
    if !args.is_empty() || !kwargs.is_empty() {
        out.push(Value::Array(args.clone()));
    }
    if !kwargs.is_empty() {
        out.push(Value::Object(kwargs.clone()));
    }
}

/// Closed union over every WAMP message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// HELLO
    Hello(Hello),
    /// WELCOME
    Welcome(Welcome),
    /// ABORT
    Abort(Abort),
    /// CHALLENGE
    Challenge(Challenge),
    /// AUTHENTICATE
    Authenticate(Authenticate),
    /// GOODBYE
    Goodbye(Goodbye),
    /// ERROR
    Error(ErrorMessage),
    /// PUBLISH
    Publish(Publish),
    /// PUBLISHED
    Published(Published),
    /// SUBSCRIBE
    Subscribe(Subscribe),
    /// SUBSCRIBED
    Subscribed(Subscribed),
    /// UNSUBSCRIBE
    Unsubscribe(Unsubscribe),
    /// UNSUBSCRIBED
    Unsubscribed(Unsubscribed),
    /// EVENT
    Event(Event),
    /// CALL
    Call(Call),
    /// CANCEL
    Cancel(Cancel),
    /// RESULT
    Result(CallResult),
    /// REGISTER
    Register(Register),
    /// REGISTERED
    Registered(Registered),
    /// UNREGISTER
    Unregister(Unregister),
    /// UNREGISTERED
    Unregistered(Unregistered),
    /// INVOCATION
    Invocation(Invocation),
    /// INTERRUPT
    Interrupt(Interrupt),
    /// YIELD
    Yield(Yield),
}

macro_rules! message_variants {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        impl Message {
            /// Message type of this variant
            pub fn kind(&self) -> MessageType {
                match self {
                    $(Message::$variant(_) => <$ty as WireMessage>::KIND,)*
                }
            }

            /// Emit the wire sequence
            pub fn marshal(&self) -> List {
                match self {
                    $(Message::$variant(m) => m.marshal(),)*
                }
            }
        }

        $(
            impl From<$ty> for Message {
                fn from(msg: $ty) -> Self {
                    Message::$variant(msg)
                }
            }
        )*
    };
}

message_variants!(
    Hello(Hello),
    Welcome(Welcome),
    Abort(Abort),
    Challenge(Challenge),
    Authenticate(Authenticate),
    Goodbye(Goodbye),
    Error(ErrorMessage),
    Publish(Publish),
    Published(Published),
    Subscribe(Subscribe),
    Subscribed(Subscribed),
    Unsubscribe(Unsubscribe),
    Unsubscribed(Unsubscribed),
    Event(Event),
    Call(Call),
    Cancel(Cancel),
    Result(CallResult),
    Register(Register),
    Registered(Registered),
    Unregister(Unregister),
    Unregistered(Unregistered),
    Invocation(Invocation),
    Interrupt(Interrupt),
    Yield(Yield),
);

impl Message {
    /// Protocol type code
    pub fn code(&self) -> u64 {
        self.kind().code()
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Parse any message, dispatching on the leading type code.
    pub fn parse(msg: &[Value]) -> Result<Self> {
        let code = msg
            .first()
            .and_then(Value::as_u64)
            .ok_or_else(|| WampError::Protocol("message type must be an integer".to_string()))?;

        let kind = MessageType::from_code(code)
            .ok_or_else(|| WampError::Protocol(format!("unknown message type {code}")))?;

        let message = match kind {
            MessageType::Hello => Hello::parse(msg)?.into(),
            MessageType::Welcome => Welcome::parse(msg)?.into(),
            MessageType::Abort => Abort::parse(msg)?.into(),
            MessageType::Challenge => Challenge::parse(msg)?.into(),
            MessageType::Authenticate => Authenticate::parse(msg)?.into(),
            MessageType::Goodbye => Goodbye::parse(msg)?.into(),
            MessageType::Error => ErrorMessage::parse(msg)?.into(),
            MessageType::Publish => Publish::parse(msg)?.into(),
            MessageType::Published => Published::parse(msg)?.into(),
            MessageType::Subscribe => Subscribe::parse(msg)?.into(),
            MessageType::Subscribed => Subscribed::parse(msg)?.into(),
            MessageType::Unsubscribe => Unsubscribe::parse(msg)?.into(),
            MessageType::Unsubscribed => Unsubscribed::parse(msg)?.into(),
            MessageType::Event => Event::parse(msg)?.into(),
            MessageType::Call => Call::parse(msg)?.into(),
            MessageType::Cancel => Cancel::parse(msg)?.into(),
            MessageType::Result => CallResult::parse(msg)?.into(),
            MessageType::Register => Register::parse(msg)?.into(),
            MessageType::Registered => Registered::parse(msg)?.into(),
            MessageType::Unregister => Unregister::parse(msg)?.into(),
            MessageType::Unregistered => Unregistered::parse(msg)?.into(),
            MessageType::Invocation => Invocation::parse(msg)?.into(),
            MessageType::Interrupt => Interrupt::parse(msg)?.into(),
            MessageType::Yield => Yield::parse(msg)?.into(),
        };

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALL_CODES: [u64; 24] = [
        1, 2, 3, 4, 5, 6, 8, 16, 17, 32, 33, 34, 35, 36, 48, 49, 50, 64, 65, 66, 67, 68, 69, 70,
    ];

    #[test]
    fn test_code_table_is_consistent() {
        for code in ALL_CODES {
            let kind = MessageType::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert!(MessageType::from_code(7).is_none());
        assert!(MessageType::from_code(0).is_none());
        assert_eq!(MessageType::Unsubscribed.to_string(), "UNSUBSCRIBED");
    }

    #[test]
    fn test_parse_dispatches_on_type_code() {
        let msg = Message::parse(&[json!(65), json!(2), json!(3)]).unwrap();
        assert_eq!(msg, Message::Registered(Registered::new(2, 3)));
        assert_eq!(msg.name(), "REGISTERED");
        assert_eq!(msg.code(), 65);
    }

    #[test]
    fn test_parse_rejects_unknown_or_missing_code() {
        let err = Message::parse(&[json!(99), json!(1)]).unwrap_err();
        assert!(err.to_string().contains("unknown message type 99"));

        assert!(Message::parse(&[]).is_err());
        assert!(Message::parse(&[json!("HELLO")]).is_err());
    }

    #[test]
    fn test_push_payload_keeps_positions() {
        let mut out = vec![json!(50), json!(1), json!({})];
        let mut kwargs = Dict::new();
        kwargs.insert("a".to_string(), json!(1));
        push_payload(&mut out, &Vec::new(), &kwargs);
        assert_eq!(out, vec![json!(50), json!(1), json!({}), json!([]), json!({"a": 1})]);

        let mut out = vec![json!(50), json!(1), json!({})];
        push_payload(&mut out, &Vec::new(), &Dict::new());
        assert_eq!(out.len(), 3);
    }
}
