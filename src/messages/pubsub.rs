//! Publish/subscribe messages.

use serde_json::Value;

use super::validation::{
    required, validate_args, validate_details, validate_kwargs, validate_message,
    validate_options, validate_publication_id, validate_request_id, validate_subscription_id,
    validate_topic, ValidationSpec,
};
use super::{push_payload, Dict, List, MessageType, WireMessage};
use crate::error::Result;

/// `[PUBLISH, Request|id, Options|dict, Topic|uri, Arguments|list?, ArgumentsKw|dict?]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Publish {
    /// Request ID
    pub request_id: u64,
    /// Publish options
    pub options: Dict,
    /// Topic URI
    pub topic: String,
    /// Positional payload
    pub args: List,
    /// Keyword payload
    pub kwargs: Dict,
}

impl Publish {
    /// Create a PUBLISH
    pub fn new(request_id: u64, topic: impl Into<String>) -> Self {
        Self {
            request_id,
            topic: topic.into(),
            ..Default::default()
        }
    }

    /// Set publish options
    pub fn with_options(mut self, options: Dict) -> Self {
        self.options = options;
        self
    }

    /// Request a PUBLISHED acknowledgement from the broker
    pub fn acknowledged(mut self) -> Self {
        self.options.insert("acknowledge".to_string(), Value::Bool(true));
        self
    }

    /// Attach payload
    pub fn with_payload(mut self, args: List, kwargs: Dict) -> Self {
        self.args = args;
        self.kwargs = kwargs;
        self
    }

    /// Whether the publisher asked for a PUBLISHED acknowledgement
    pub fn acknowledge(&self) -> bool {
        self.options
            .get("acknowledge")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl WireMessage for Publish {
    const KIND: MessageType = MessageType::Publish;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 4,
        max_length: 6,
        message: "PUBLISH",
        spec: &[
            (1, validate_request_id),
            (2, validate_options),
            (3, validate_topic),
            (4, validate_args),
            (5, validate_kwargs),
        ],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            options: required(f.options, "options", Self::KIND.name())?,
            topic: required(f.topic, "topic", Self::KIND.name())?,
            args: f.args.unwrap_or_default(),
            kwargs: f.kwargs.unwrap_or_default(),
        })
    }

    fn marshal(&self) -> List {
        let mut out = vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::Object(self.options.clone()),
            Value::String(self.topic.clone()),
        ];
        push_payload(&mut out, &self.args, &self.kwargs);
        out
    }
}

/// `[PUBLISHED, PUBLISH.Request|id, Publication|id]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Published {
    /// Request ID of the acknowledged PUBLISH
    pub request_id: u64,
    /// Broker-assigned publication ID
    pub publication_id: u64,
}

impl Published {
    /// Create a PUBLISHED
    pub fn new(request_id: u64, publication_id: u64) -> Self {
        Self {
            request_id,
            publication_id,
        }
    }
}

impl WireMessage for Published {
    const KIND: MessageType = MessageType::Published;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "PUBLISHED",
        spec: &[(1, validate_request_id), (2, validate_publication_id)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            publication_id: required(f.publication_id, "publication ID", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::from(self.publication_id),
        ]
    }
}

/// `[SUBSCRIBE, Request|id, Options|dict, Topic|uri]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subscribe {
    /// Request ID
    pub request_id: u64,
    /// Subscribe options
    pub options: Dict,
    /// Topic URI
    pub topic: String,
}

impl Subscribe {
    /// Create a SUBSCRIBE
    pub fn new(request_id: u64, topic: impl Into<String>) -> Self {
        Self {
            request_id,
            options: Dict::new(),
            topic: topic.into(),
        }
    }

    /// Set subscribe options
    pub fn with_options(mut self, options: Dict) -> Self {
        self.options = options;
        self
    }
}

impl WireMessage for Subscribe {
    const KIND: MessageType = MessageType::Subscribe;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 4,
        max_length: 4,
        message: "SUBSCRIBE",
        spec: &[(1, validate_request_id), (2, validate_options), (3, validate_topic)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            options: required(f.options, "options", Self::KIND.name())?,
            topic: required(f.topic, "topic", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::Object(self.options.clone()),
            Value::String(self.topic.clone()),
        ]
    }
}

/// `[SUBSCRIBED, SUBSCRIBE.Request|id, Subscription|id]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subscribed {
    /// Request ID of the acknowledged SUBSCRIBE
    pub request_id: u64,
    /// Broker-assigned subscription ID
    pub subscription_id: u64,
}

impl Subscribed {
    /// Create a SUBSCRIBED
    pub fn new(request_id: u64, subscription_id: u64) -> Self {
        Self {
            request_id,
            subscription_id,
        }
    }
}

impl WireMessage for Subscribed {
    const KIND: MessageType = MessageType::Subscribed;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "SUBSCRIBED",
        spec: &[(1, validate_request_id), (2, validate_subscription_id)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            subscription_id: required(f.subscription_id, "subscription ID", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::from(self.subscription_id),
        ]
    }
}

/// `[UNSUBSCRIBE, Request|id, SUBSCRIBED.Subscription|id]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Unsubscribe {
    /// Request ID
    pub request_id: u64,
    /// Subscription to remove
    pub subscription_id: u64,
}

impl Unsubscribe {
    /// Create an UNSUBSCRIBE
    pub fn new(request_id: u64, subscription_id: u64) -> Self {
        Self {
            request_id,
            subscription_id,
        }
    }
}

impl WireMessage for Unsubscribe {
    const KIND: MessageType = MessageType::Unsubscribe;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "UNSUBSCRIBE",
        spec: &[(1, validate_request_id), (2, validate_subscription_id)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            subscription_id: required(f.subscription_id, "subscription ID", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::from(self.subscription_id),
        ]
    }
}

/// `[UNSUBSCRIBED, UNSUBSCRIBE.Request|id]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Unsubscribed {
    /// Request ID of the acknowledged UNSUBSCRIBE
    pub request_id: u64,
}

impl Unsubscribed {
    /// Create an UNSUBSCRIBED
    pub fn new(request_id: u64) -> Self {
        Self { request_id }
    }
}

impl WireMessage for Unsubscribed {
    const KIND: MessageType = MessageType::Unsubscribed;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 2,
        max_length: 2,
        message: "UNSUBSCRIBED",
        spec: &[(1, validate_request_id)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![Value::from(Self::KIND.code()), Value::from(self.request_id)]
    }
}

/// `[EVENT, SUBSCRIBED.Subscription|id, PUBLISHED.Publication|id, Details|dict,
/// PUBLISH.Arguments|list?, PUBLISH.ArgumentsKw|dict?]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    /// Subscription the event is delivered for
    pub subscription_id: u64,
    /// Publication ID
    pub publication_id: u64,
    /// Details dictionary
    pub details: Dict,
    /// Positional payload
    pub args: List,
    /// Keyword payload
    pub kwargs: Dict,
}

impl Event {
    /// Create an EVENT
    pub fn new(subscription_id: u64, publication_id: u64) -> Self {
        Self {
            subscription_id,
            publication_id,
            ..Default::default()
        }
    }

    /// Set the details dictionary
    pub fn with_details(mut self, details: Dict) -> Self {
        self.details = details;
        self
    }

    /// Attach payload
    pub fn with_payload(mut self, args: List, kwargs: Dict) -> Self {
        self.args = args;
        self.kwargs = kwargs;
        self
    }
}

impl WireMessage for Event {
    const KIND: MessageType = MessageType::Event;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 4,
        max_length: 6,
        message: "EVENT",
        spec: &[
            (1, validate_subscription_id),
            (2, validate_publication_id),
            (3, validate_details),
            (4, validate_args),
            (5, validate_kwargs),
        ],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            subscription_id: required(f.subscription_id, "subscription ID", Self::KIND.name())?,
            publication_id: required(f.publication_id, "publication ID", Self::KIND.name())?,
            details: required(f.details, "details", Self::KIND.name())?,
            args: f.args.unwrap_or_default(),
            kwargs: f.kwargs.unwrap_or_default(),
        })
    }

    fn marshal(&self) -> List {
        let mut out = vec![
            Value::from(Self::KIND.code()),
            Value::from(self.subscription_id),
            Value::from(self.publication_id),
            Value::Object(self.details.clone()),
        ];
        push_payload(&mut out, &self.args, &self.kwargs);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dict(value: Value) -> Dict {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_publish_acknowledge_flag() {
        let publish = Publish::new(6, "topic");
        assert!(!publish.acknowledge());

        let publish = publish.acknowledged();
        assert!(publish.acknowledge());
        assert_eq!(
            Value::Array(publish.marshal()),
            json!([16, 6, {"acknowledge": true}, "topic"])
        );

        let odd = Publish::new(1, "topic").with_options(dict(json!({"acknowledge": "yes"})));
        assert!(!odd.acknowledge());
    }

    #[test]
    fn test_publish_roundtrip_with_payload() {
        let publish = Publish::new(6, "io.xconn.topic")
            .with_payload(vec![json!("abc"), json!(1)], dict(json!({"a": "b"})));
        assert_eq!(Publish::parse(&publish.marshal()).unwrap(), publish);

        let args_only = Publish::new(6, "io.xconn.topic").with_payload(vec![json!(null)], Dict::new());
        assert_eq!(args_only.marshal().len(), 5);
        assert_eq!(Publish::parse(&args_only.marshal()).unwrap(), args_only);
    }

    #[test]
    fn test_event_roundtrip() {
        let event = Event::new(1, 3);
        assert_eq!(Value::Array(event.marshal()), json!([36, 1, 3, {}]));
        assert_eq!(Event::parse(&event.marshal()).unwrap(), event);

        let event = Event::new(1, 3)
            .with_details(dict(json!({"a": "b"})))
            .with_payload(vec![json!("abc")], dict(json!({"a": "b"})));
        assert_eq!(Event::parse(&event.marshal()).unwrap(), event);
    }

    #[test]
    fn test_subscription_acks() {
        assert_eq!(
            Subscribe::parse(&Subscribe::new(7, "topic").marshal()).unwrap(),
            Subscribe::new(7, "topic")
        );
        assert_eq!(Subscribed::parse(&[json!(33), json!(7), json!(8)]).unwrap(), Subscribed::new(7, 8));
        assert_eq!(Unsubscribe::parse(&[json!(34), json!(9), json!(8)]).unwrap(), Unsubscribe::new(9, 8));
        assert_eq!(Unsubscribed::parse(&[json!(35), json!(9)]).unwrap(), Unsubscribed::new(9));
        assert_eq!(Published::parse(&[json!(17), json!(6), json!(6)]).unwrap(), Published::new(6, 6));
    }

    #[test]
    fn test_pubsub_rejects_malformed() {
        assert!(Subscribe::parse(&[json!(32), json!(7), json!({}), json!("topic"), json!([])]).is_err());
        assert!(Subscribe::parse(&[json!(32), json!(7), json!([]), json!("topic")]).is_err());
        assert!(Unsubscribed::parse(&[json!(35), json!(9), json!({})]).is_err());
        assert!(Event::parse(&[json!(36), json!(1), json!(3)]).is_err());
        assert!(Published::parse(&[json!(17), json!(6), json!("6")]).is_err());
    }
}
