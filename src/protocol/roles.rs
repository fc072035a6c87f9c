//! Client roles advertised in HELLO.
//!
//! Roles are declared in `details.roles` as `{"caller": {"features": {...}}, ...}`.
//! The router uses them to decide which messages it may route to the session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::Dict;

/// WAMP client role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Issues CALLs
    Caller,
    /// Registers procedures and answers INVOCATIONs
    Callee,
    /// Publishes events
    Publisher,
    /// Subscribes to topics
    Subscriber,
}

impl Role {
    /// Role key in `details.roles`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Caller => "caller",
            Self::Callee => "callee",
            Self::Publisher => "publisher",
            Self::Subscriber => "subscriber",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Declared roles with their feature flags, in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Roles {
    roles: Vec<(Role, Dict)>,
}

impl Roles {
    /// No roles declared
    pub fn new() -> Self {
        Self::default()
    }

    /// All four client roles without extra features
    pub fn client() -> Self {
        Self::new()
            .with_role(Role::Caller)
            .with_role(Role::Callee)
            .with_role(Role::Publisher)
            .with_role(Role::Subscriber)
    }

    /// Declare a role (no-op if already declared)
    pub fn with_role(mut self, role: Role) -> Self {
        if !self.supports(role) {
            self.roles.push((role, Dict::new()));
        }
        self
    }

    /// Declare a feature flag on a role, declaring the role if needed
    pub fn with_feature(mut self, role: Role, feature: &str, enabled: bool) -> Self {
        self = self.with_role(role);
        if let Some((_, features)) = self.roles.iter_mut().find(|(r, _)| *r == role) {
            features.insert(feature.to_string(), Value::Bool(enabled));
        }
        self
    }

    /// Check if a role is declared
    pub fn supports(&self, role: Role) -> bool {
        self.roles.iter().any(|(r, _)| *r == role)
    }

    /// Declared roles in order
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().map(|(role, _)| *role)
    }

    /// Wire form for `details.roles`
    pub fn to_dict(&self) -> Dict {
        self.roles
            .iter()
            .map(|(role, features)| {
                let mut entry = Dict::new();
                entry.insert("features".to_string(), Value::Object(features.clone()));
                (role.name().to_string(), Value::Object(entry))
            })
            .collect()
    }
}
