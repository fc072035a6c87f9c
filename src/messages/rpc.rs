//! Remote procedure call messages.

use serde_json::Value;

use super::validation::{
    required, validate_args, validate_details, validate_kwargs, validate_message, validate_options,
    validate_procedure, validate_registration_id, validate_request_id, ValidationSpec,
};
use super::{push_payload, Dict, List, MessageType, WireMessage};
use crate::error::Result;

/// `[CALL, Request|id, Options|dict, Procedure|uri, Arguments|list?, ArgumentsKw|dict?]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Call {
    /// Request ID
    pub request_id: u64,
    /// Call options
    pub options: Dict,
    /// Procedure URI
    pub procedure: String,
    /// Positional payload
    pub args: List,
    /// Keyword payload
    pub kwargs: Dict,
}

impl Call {
    /// Create a CALL
    pub fn new(request_id: u64, procedure: impl Into<String>) -> Self {
        Self {
            request_id,
            procedure: procedure.into(),
            ..Default::default()
        }
    }

    /// Set call options
    pub fn with_options(mut self, options: Dict) -> Self {
        self.options = options;
        self
    }

    /// Attach payload
    pub fn with_payload(mut self, args: List, kwargs: Dict) -> Self {
        self.args = args;
        self.kwargs = kwargs;
        self
    }
}

impl WireMessage for Call {
    const KIND: MessageType = MessageType::Call;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 4,
        max_length: 6,
        message: "CALL",
        spec: &[
            (1, validate_request_id),
            (2, validate_options),
            (3, validate_procedure),
            (4, validate_args),
            (5, validate_kwargs),
        ],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            options: required(f.options, "options", Self::KIND.name())?,
            procedure: required(f.procedure, "procedure", Self::KIND.name())?,
            args: f.args.unwrap_or_default(),
            kwargs: f.kwargs.unwrap_or_default(),
        })
    }

    fn marshal(&self) -> List {
        let mut out = vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::Object(self.options.clone()),
            Value::String(self.procedure.clone()),
        ];
        push_payload(&mut out, &self.args, &self.kwargs);
        out
    }
}

/// `[CANCEL, CALL.Request|id, Options|dict]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cancel {
    /// Request ID of the CALL to cancel
    pub request_id: u64,
    /// Cancel options (e.g. `mode`)
    pub options: Dict,
}

impl Cancel {
    /// Create a CANCEL
    pub fn new(request_id: u64, options: Dict) -> Self {
        Self { request_id, options }
    }
}

impl WireMessage for Cancel {
    const KIND: MessageType = MessageType::Cancel;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "CANCEL",
        spec: &[(1, validate_request_id), (2, validate_options)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            options: required(f.options, "options", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::Object(self.options.clone()),
        ]
    }
}

/// `[RESULT, CALL.Request|id, Details|dict, YIELD.Arguments|list?, YIELD.ArgumentsKw|dict?]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallResult {
    /// Request ID of the answered CALL
    pub request_id: u64,
    /// Details dictionary
    pub details: Dict,
    /// Positional payload
    pub args: List,
    /// Keyword payload
    pub kwargs: Dict,
}

impl CallResult {
    /// Create a RESULT
    pub fn new(request_id: u64) -> Self {
        Self {
            request_id,
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

    /// Whether this is a progressive (non-final) result
    pub fn is_progress(&self) -> bool {
        self.details
            .get("progress")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl WireMessage for CallResult {
    const KIND: MessageType = MessageType::Result;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 5,
        message: "RESULT",
        spec: &[
            (1, validate_request_id),
            (2, validate_details),
            (3, validate_args),
            (4, validate_kwargs),
        ],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            details: required(f.details, "details", Self::KIND.name())?,
            args: f.args.unwrap_or_default(),
            kwargs: f.kwargs.unwrap_or_default(),
        })
    }

    fn marshal(&self) -> List {
        let mut out = vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::Object(self.details.clone()),
        ];
        push_payload(&mut out, &self.args, &self.kwargs);
        out
    }
}

/// `[REGISTER, Request|id, Options|dict, Procedure|uri]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Register {
    /// Request ID
    pub request_id: u64,
    /// Register options
    pub options: Dict,
    /// Procedure URI
    pub procedure: String,
}

impl Register {
    /// Create a REGISTER
    pub fn new(request_id: u64, procedure: impl Into<String>) -> Self {
        Self {
            request_id,
            options: Dict::new(),
            procedure: procedure.into(),
        }
    }

    /// Set register options
    pub fn with_options(mut self, options: Dict) -> Self {
        self.options = options;
        self
    }
}

impl WireMessage for Register {
    const KIND: MessageType = MessageType::Register;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 4,
        max_length: 4,
        message: "REGISTER",
        spec: &[(1, validate_request_id), (2, validate_options), (3, validate_procedure)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            options: required(f.options, "options", Self::KIND.name())?,
            procedure: required(f.procedure, "procedure", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::Object(self.options.clone()),
            Value::String(self.procedure.clone()),
        ]
    }
}

/// `[REGISTERED, REGISTER.Request|id, Registration|id]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Registered {
    /// Request ID of the acknowledged REGISTER
    pub request_id: u64,
    /// Dealer-assigned registration ID
    pub registration_id: u64,
}

impl Registered {
    /// Create a REGISTERED
    pub fn new(request_id: u64, registration_id: u64) -> Self {
        Self {
            request_id,
            registration_id,
        }
    }
}

impl WireMessage for Registered {
    const KIND: MessageType = MessageType::Registered;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "REGISTERED",
        spec: &[(1, validate_request_id), (2, validate_registration_id)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            registration_id: required(f.registration_id, "registration ID", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::from(self.registration_id),
        ]
    }
}

/// `[UNREGISTER, Request|id, REGISTERED.Registration|id]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Unregister {
    /// Request ID
    pub request_id: u64,
    /// Registration to remove
    pub registration_id: u64,
}

impl Unregister {
    /// Create an UNREGISTER
    pub fn new(request_id: u64, registration_id: u64) -> Self {
        Self {
            request_id,
            registration_id,
        }
    }
}

impl WireMessage for Unregister {
    const KIND: MessageType = MessageType::Unregister;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "UNREGISTER",
        spec: &[(1, validate_request_id), (2, validate_registration_id)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            registration_id: required(f.registration_id, "registration ID", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::from(self.registration_id),
        ]
    }
}

/// `[UNREGISTERED, UNREGISTER.Request|id]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Unregistered {
    /// Request ID of the acknowledged UNREGISTER
    pub request_id: u64,
}

impl Unregistered {
    /// Create an UNREGISTERED
    pub fn new(request_id: u64) -> Self {
        Self { request_id }
    }
}

impl WireMessage for Unregistered {
    const KIND: MessageType = MessageType::Unregistered;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 2,
        max_length: 2,
        message: "UNREGISTERED",
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

/// `[INVOCATION, Request|id, REGISTERED.Registration|id, Details|dict,
/// CALL.Arguments|list?, CALL.ArgumentsKw|dict?]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Invocation {
    /// Dealer-assigned invocation request ID
    pub request_id: u64,
    /// Registration the invocation targets
    pub registration_id: u64,
    /// Details dictionary
    pub details: Dict,
    /// Positional payload
    pub args: List,
    /// Keyword payload
    pub kwargs: Dict,
}

impl Invocation {
    /// Create an INVOCATION
    pub fn new(request_id: u64, registration_id: u64) -> Self {
        Self {
            request_id,
            registration_id,
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

impl WireMessage for Invocation {
    const KIND: MessageType = MessageType::Invocation;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 4,
        max_length: 6,
        message: "INVOCATION",
        spec: &[
            (1, validate_request_id),
            (2, validate_registration_id),
            (3, validate_details),
            (4, validate_args),
            (5, validate_kwargs),
        ],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            registration_id: required(f.registration_id, "registration ID", Self::KIND.name())?,
            details: required(f.details, "details", Self::KIND.name())?,
            args: f.args.unwrap_or_default(),
            kwargs: f.kwargs.unwrap_or_default(),
        })
    }

    fn marshal(&self) -> List {
        let mut out = vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::from(self.registration_id),
            Value::Object(self.details.clone()),
        ];
        push_payload(&mut out, &self.args, &self.kwargs);
        out
    }
}

/// `[INTERRUPT, INVOCATION.Request|id, Options|dict]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interrupt {
    /// Request ID of the interrupted INVOCATION
    pub request_id: u64,
    /// Interrupt options
    pub options: Dict,
}

impl Interrupt {
    /// Create an INTERRUPT
    pub fn new(request_id: u64, options: Dict) -> Self {
        Self { request_id, options }
    }
}

impl WireMessage for Interrupt {
    const KIND: MessageType = MessageType::Interrupt;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "INTERRUPT",
        spec: &[(1, validate_request_id), (2, validate_options)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            options: required(f.options, "options", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::Object(self.options.clone()),
        ]
    }
}

/// `[YIELD, INVOCATION.Request|id, Options|dict, Arguments|list?, ArgumentsKw|dict?]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Yield {
    /// Request ID of the answered INVOCATION
    pub request_id: u64,
    /// Yield options
    pub options: Dict,
    /// Positional payload
    pub args: List,
    /// Keyword payload
    pub kwargs: Dict,
}

impl Yield {
    /// Create a YIELD
    pub fn new(request_id: u64) -> Self {
        Self {
            request_id,
            ..Default::default()
        }
    }

    /// Set yield options
    pub fn with_options(mut self, options: Dict) -> Self {
        self.options = options;
        self
    }

    /// Attach payload
    pub fn with_payload(mut self, args: List, kwargs: Dict) -> Self {
        self.args = args;
        self.kwargs = kwargs;
        self
    }
}

impl WireMessage for Yield {
    const KIND: MessageType = MessageType::Yield;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 5,
        message: "YIELD",
        spec: &[
            (1, validate_request_id),
            (2, validate_options),
            (3, validate_args),
            (4, validate_kwargs),
        ],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            request_id: required(f.request_id, "request ID", Self::KIND.name())?,
            options: required(f.options, "options", Self::KIND.name())?,
            args: f.args.unwrap_or_default(),
            kwargs: f.kwargs.unwrap_or_default(),
        })
    }

    fn marshal(&self) -> List {
        let mut out = vec![
            Value::from(Self::KIND.code()),
            Value::from(self.request_id),
            Value::Object(self.options.clone()),
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
    fn test_call_wire_layout() {
        let call = Call::new(1, "io.xconn.echo");
        assert_eq!(Value::Array(call.marshal()), json!([48, 1, {}, "io.xconn.echo"]));

        let call = Call::new(1, "io.xconn.echo").with_payload(Vec::new(), dict(json!({"k": 1})));
        assert_eq!(
            Value::Array(call.marshal()),
            json!([48, 1, {}, "io.xconn.echo", [], {"k": 1}])
        );
        assert_eq!(Call::parse(&call.marshal()).unwrap(), call);
    }

    #[test]
    fn test_call_rejects_bad_procedure() {
        assert!(Call::parse(&[json!(48), json!(1), json!({}), json!("")]).is_err());
        assert!(Call::parse(&[json!(48), json!(1), json!({}), json!(5)]).is_err());
        assert!(Call::parse(&[json!(48), json!(1), json!({})]).is_err());
    }

    #[test]
    fn test_result_progress() {
        let result = CallResult::new(1).with_details(dict(json!({"progress": true})));
        assert!(result.is_progress());
        assert!(!CallResult::new(1).is_progress());
        assert_eq!(CallResult::parse(&result.marshal()).unwrap(), result);
    }

    #[test]
    fn test_invocation_and_yield() {
        let invocation = Invocation::new(4, 3).with_payload(vec![json!("abc")], Dict::new());
        assert_eq!(
            Value::Array(invocation.marshal()),
            json!([68, 4, 3, {}, ["abc"]])
        );
        assert_eq!(Invocation::parse(&invocation.marshal()).unwrap(), invocation);

        let yielded = Yield::new(4).with_payload(vec![json!(1)], dict(json!({"a": "b"})));
        assert_eq!(Yield::parse(&yielded.marshal()).unwrap(), yielded);
    }

    #[test]
    fn test_registration_acks() {
        assert_eq!(
            Register::parse(&Register::new(2, "io.xconn.echo").marshal()).unwrap(),
            Register::new(2, "io.xconn.echo")
        );
        assert_eq!(Registered::parse(&[json!(65), json!(2), json!(3)]).unwrap(), Registered::new(2, 3));
        assert_eq!(Unregister::parse(&[json!(66), json!(5), json!(3)]).unwrap(), Unregister::new(5, 3));
        assert_eq!(Unregistered::parse(&[json!(67), json!(5)]).unwrap(), Unregistered::new(5));
    }

    #[test]
    fn test_cancel_and_interrupt() {
        let cancel = Cancel::new(1, dict(json!({"mode": "kill"})));
        assert_eq!(Value::Array(cancel.marshal()), json!([49, 1, {"mode": "kill"}]));
        assert_eq!(Cancel::parse(&cancel.marshal()).unwrap(), cancel);

        let interrupt = Interrupt::new(4, Dict::new());
        assert_eq!(Value::Array(interrupt.marshal()), json!([69, 4, {}]));
        assert!(Interrupt::parse(&[json!(69), json!(4)]).is_err());
    }

    #[test]
    fn test_id_over_max_rejected() {
        let too_big = json!(super::super::validation::MAX_ID + 1);
        assert!(Registered::parse(&[json!(65), too_big, json!(3)]).is_err());
    }
}
