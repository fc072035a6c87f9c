//! Session lifecycle messages: HELLO, WELCOME, ABORT, CHALLENGE,
//! AUTHENTICATE and GOODBYE.

use serde_json::Value;

use super::validation::{
    required, validate_authmethod, validate_details, validate_extra, validate_hello_details,
    validate_kwargs, validate_args, validate_message, validate_realm, validate_reason,
    validate_session_id, validate_signature, validate_welcome_details, ValidationSpec,
};
use super::{push_payload, Dict, List, MessageType, WireMessage};
use crate::error::Result;

/// `[HELLO, Realm|uri, Details|dict]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hello {
    /// Realm to join
    pub realm: String,
    /// Announced client roles
    pub roles: Dict,
    /// Claimed identity (empty when not announced)
    pub authid: String,
    /// Offered authentication methods
    pub authmethods: Vec<String>,
    /// Authentication extra data
    pub authextra: Dict,
}

impl Hello {
    /// Create a HELLO for `realm` with the given roles
    pub fn new(realm: impl Into<String>, roles: Dict) -> Self {
        Self {
            realm: realm.into(),
            roles,
            ..Default::default()
        }
    }

    /// Set the claimed authid
    pub fn with_authid(mut self, authid: impl Into<String>) -> Self {
        self.authid = authid.into();
        self
    }

    /// Set the offered authentication methods
    pub fn with_authmethods(mut self, authmethods: Vec<String>) -> Self {
        self.authmethods = authmethods;
        self
    }

    /// Set the authentication extra data
    pub fn with_authextra(mut self, authextra: Dict) -> Self {
        self.authextra = authextra;
        self
    }
}

impl WireMessage for Hello {
    const KIND: MessageType = MessageType::Hello;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "HELLO",
        spec: &[(1, validate_realm), (2, validate_hello_details)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            realm: required(f.realm, "realm", Self::KIND.name())?,
            roles: required(f.roles, "roles", Self::KIND.name())?,
            authid: f.authid.unwrap_or_default(),
            authmethods: f.authmethods.unwrap_or_default(),
            authextra: f.authextra.unwrap_or_default(),
        })
    }

    fn marshal(&self) -> List {
        let mut details = Dict::new();
        details.insert("roles".to_string(), Value::Object(self.roles.clone()));
        if !self.authid.is_empty() {
            details.insert("authid".to_string(), Value::String(self.authid.clone()));
        }
        details.insert(
            "authmethods".to_string(),
            Value::Array(self.authmethods.iter().cloned().map(Value::String).collect()),
        );
        if !self.authextra.is_empty() {
            details.insert("authextra".to_string(), Value::Object(self.authextra.clone()));
        }

        vec![
            Value::from(Self::KIND.code()),
            Value::String(self.realm.clone()),
            Value::Object(details),
        ]
    }
}

/// `[WELCOME, Session|id, Details|dict]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Welcome {
    /// Router-assigned session ID
    pub session_id: u64,
    /// Router roles
    pub roles: Dict,
    /// Authenticated identity
    pub authid: String,
    /// Granted role
    pub authrole: String,
    /// Method used to authenticate
    pub authmethod: String,
    /// Authentication extra data
    pub authextra: Dict,
}

impl Welcome {
    /// Create a WELCOME for `session_id`
    pub fn new(session_id: u64, roles: Dict) -> Self {
        Self {
            session_id,
            roles,
            ..Default::default()
        }
    }

    /// Set the authenticated identity and role
    pub fn with_auth(
        mut self,
        authid: impl Into<String>,
        authrole: impl Into<String>,
        authmethod: impl Into<String>,
    ) -> Self {
        self.authid = authid.into();
        self.authrole = authrole.into();
        self.authmethod = authmethod.into();
        self
    }

    /// Set the authentication extra data
    pub fn with_authextra(mut self, authextra: Dict) -> Self {
        self.authextra = authextra;
        self
    }
}

impl WireMessage for Welcome {
    const KIND: MessageType = MessageType::Welcome;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "WELCOME",
        spec: &[(1, validate_session_id), (2, validate_welcome_details)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            session_id: required(f.session_id, "session ID", Self::KIND.name())?,
            roles: required(f.roles, "roles", Self::KIND.name())?,
            authid: f.authid.unwrap_or_default(),
            authrole: f.authrole.unwrap_or_default(),
            authmethod: f.authmethod.unwrap_or_default(),
            authextra: f.authextra.unwrap_or_default(),
        })
    }

    fn marshal(&self) -> List {
        let mut details = Dict::new();
        details.insert("roles".to_string(), Value::Object(self.roles.clone()));
        for (key, value) in [
            ("authid", &self.authid),
            ("authrole", &self.authrole),
            ("authmethod", &self.authmethod),
        ] {
            if !value.is_empty() {
                details.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        if !self.authextra.is_empty() {
            details.insert("authextra".to_string(), Value::Object(self.authextra.clone()));
        }

        vec![
            Value::from(Self::KIND.code()),
            Value::from(self.session_id),
            Value::Object(details),
        ]
    }
}

/// `[ABORT, Details|dict, Reason|uri, Arguments|list?, ArgumentsKw|dict?]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Abort {
    /// Details dictionary
    pub details: Dict,
    /// Abort reason URI
    pub reason: String,
    /// Positional payload
    pub args: List,
    /// Keyword payload
    pub kwargs: Dict,
}

impl Abort {
    /// Create an ABORT with a reason
    pub fn new(details: Dict, reason: impl Into<String>) -> Self {
        Self {
            details,
            reason: reason.into(),
            ..Default::default()
        }
    }

    /// Attach payload
    pub fn with_payload(mut self, args: List, kwargs: Dict) -> Self {
        self.args = args;
        self.kwargs = kwargs;
        self
    }
}

impl WireMessage for Abort {
    const KIND: MessageType = MessageType::Abort;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 5,
        message: "ABORT",
        spec: &[
            (1, validate_details),
            (2, validate_reason),
            (3, validate_args),
            (4, validate_kwargs),
        ],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            details: required(f.details, "details", Self::KIND.name())?,
            reason: required(f.reason, "reason", Self::KIND.name())?,
            args: f.args.unwrap_or_default(),
            kwargs: f.kwargs.unwrap_or_default(),
        })
    }

    fn marshal(&self) -> List {
        let mut out = vec![
            Value::from(Self::KIND.code()),
            Value::Object(self.details.clone()),
            Value::String(self.reason.clone()),
        ];
        push_payload(&mut out, &self.args, &self.kwargs);
        out
    }
}

/// `[CHALLENGE, AuthMethod|string, Extra|dict]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Challenge {
    /// Authentication method being challenged
    pub authmethod: String,
    /// Method-specific challenge data
    pub extra: Dict,
}

impl Challenge {
    /// Create a CHALLENGE
    pub fn new(authmethod: impl Into<String>, extra: Dict) -> Self {
        Self {
            authmethod: authmethod.into(),
            extra,
        }
    }
}

impl WireMessage for Challenge {
    const KIND: MessageType = MessageType::Challenge;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "CHALLENGE",
        spec: &[(1, validate_authmethod), (2, validate_extra)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            authmethod: required(f.authmethod, "authmethod", Self::KIND.name())?,
            extra: required(f.extra, "extra", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::String(self.authmethod.clone()),
            Value::Object(self.extra.clone()),
        ]
    }
}

/// `[AUTHENTICATE, Signature|string, Extra|dict]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Authenticate {
    /// Challenge response
    pub signature: String,
    /// Method-specific extra data
    pub extra: Dict,
}

impl Authenticate {
    /// Create an AUTHENTICATE
    pub fn new(signature: impl Into<String>, extra: Dict) -> Self {
        Self {
            signature: signature.into(),
            extra,
        }
    }
}

impl WireMessage for Authenticate {
    const KIND: MessageType = MessageType::Authenticate;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "AUTHENTICATE",
        spec: &[(1, validate_signature), (2, validate_extra)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            signature: required(f.signature, "signature", Self::KIND.name())?,
            extra: required(f.extra, "extra", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::String(self.signature.clone()),
            Value::Object(self.extra.clone()),
        ]
    }
}

/// `[GOODBYE, Details|dict, Reason|uri]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Goodbye {
    /// Details dictionary
    pub details: Dict,
    /// Close reason URI
    pub reason: String,
}

impl Goodbye {
    /// Create a GOODBYE
    pub fn new(details: Dict, reason: impl Into<String>) -> Self {
        Self {
            details,
            reason: reason.into(),
        }
    }
}

impl WireMessage for Goodbye {
    const KIND: MessageType = MessageType::Goodbye;

    const VALIDATION_SPEC: ValidationSpec = ValidationSpec {
        min_length: 3,
        max_length: 3,
        message: "GOODBYE",
        spec: &[(1, validate_details), (2, validate_reason)],
    };

    fn parse(msg: &[Value]) -> Result<Self> {
        let f = validate_message(msg, Self::KIND, &Self::VALIDATION_SPEC)?;
        Ok(Self {
            details: required(f.details, "details", Self::KIND.name())?,
            reason: required(f.reason, "reason", Self::KIND.name())?,
        })
    }

    fn marshal(&self) -> List {
        vec![
            Value::from(Self::KIND.code()),
            Value::Object(self.details.clone()),
            Value::String(self.reason.clone()),
        ]
    }
}
