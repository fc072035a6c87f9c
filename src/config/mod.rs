//! Client configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! realm = "realm1"
//!
//! [roles]
//! publisher = false
//!
//! [auth]
//! method = "cryptosign"
//! authid = "alice"
//! private_key = "6b0c7c4f..."
//!
//! [auth.authextra]
//! channel_binding = "tls-unique"
//! ```
//!
//! `[auth]` defaults to anonymous; every role defaults to enabled.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::{
    AnonymousAuthenticator, ClientAuthenticator, CryptoSignAuthenticator, TicketAuthenticator,
    WampCraAuthenticator,
};
use crate::error::{Result, WampError};
use crate::messages::Dict;
use crate::protocol::{Joiner, Role, Roles};

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Realm to join
    pub realm: String,

    /// Declared client roles
    #[serde(default)]
    pub roles: RolesConfig,

    /// Authentication method and credentials
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let content = std::fs::read_to_string(path.into())?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;

        if config.realm.is_empty() {
            return Err(WampError::Config("realm must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Build the configured authenticator
    pub fn authenticator(&self) -> Result<Arc<dyn ClientAuthenticator>> {
        self.auth.authenticator()
    }

    /// Build a joiner for the configured realm, roles and authenticator
    pub fn joiner(&self) -> Result<Joiner> {
        Ok(Joiner::new(self.realm.clone())
            .with_roles(self.roles.to_roles())
            .with_authenticator(self.authenticator()?))
    }
}

/// Role toggles
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RolesConfig {
    /// Declare the caller role
    #[serde(default = "enabled")]
    pub caller: bool,

    /// Declare the callee role
    #[serde(default = "enabled")]
    pub callee: bool,

    /// Declare the publisher role
    #[serde(default = "enabled")]
    pub publisher: bool,

    /// Declare the subscriber role
    #[serde(default = "enabled")]
    pub subscriber: bool,
}

fn enabled() -> bool {
    true
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            caller: true,
            callee: true,
            publisher: true,
            subscriber: true,
        }
    }
}

impl RolesConfig {
    /// Declared roles in canonical order
    pub fn to_roles(&self) -> Roles {
        [
            (Role::Caller, self.caller),
            (Role::Callee, self.callee),
            (Role::Publisher, self.publisher),
            (Role::Subscriber, self.subscriber),
        ]
        .into_iter()
        .filter(|(_, on)| *on)
        .fold(Roles::new(), |roles, (role, _)| roles.with_role(role))
    }
}

/// Authentication settings, tagged by `method`
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum AuthConfig {
    /// No credentials
    Anonymous {
        /// Claimed identity
        #[serde(default)]
        authid: String,
        /// HELLO authextra
        #[serde(default)]
        authextra: Option<Dict>,
    },
    /// Pre-shared ticket
    Ticket {
        /// Claimed identity
        authid: String,
        /// Ticket sent as the signature
        ticket: String,
        /// HELLO authextra
        #[serde(default)]
        authextra: Option<Dict>,
    },
    /// WAMP-CRA shared secret
    Wampcra {
        /// Claimed identity
        authid: String,
        /// Shared secret
        secret: String,
        /// HELLO authextra
        #[serde(default)]
        authextra: Option<Dict>,
    },
    /// Ed25519 key pair
    Cryptosign {
        /// Claimed identity
        authid: String,
        /// Hex-encoded 32-byte seed
        private_key: String,
        /// HELLO authextra
        #[serde(default)]
        authextra: Option<Dict>,
    },
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::Anonymous {
            authid: String::new(),
            authextra: None,
        }
    }
}

impl AuthConfig {
    /// Method name advertised in HELLO
    pub fn method(&self) -> &'static str {
        match self {
            Self::Anonymous { .. } => "anonymous",
            Self::Ticket { .. } => "ticket",
            Self::Wampcra { .. } => "wampcra",
            Self::Cryptosign { .. } => "cryptosign",
        }
    }

    /// Build the authenticator these settings describe
    pub fn authenticator(&self) -> Result<Arc<dyn ClientAuthenticator>> {
        let authenticator: Arc<dyn ClientAuthenticator> = match self {
            Self::Anonymous { authid, authextra } => {
                Arc::new(AnonymousAuthenticator::new(authid.clone(), authextra.clone()))
            },
            Self::Ticket {
                authid,
                ticket,
                authextra,
            } => Arc::new(TicketAuthenticator::new(authid.clone(), ticket.clone(), authextra.clone())),
            Self::Wampcra {
                authid,
                secret,
                authextra,
            } => Arc::new(WampCraAuthenticator::new(authid.clone(), secret.clone(), authextra.clone())),
            Self::Cryptosign {
                authid,
                private_key,
                authextra,
            } => Arc::new(CryptoSignAuthenticator::new(
                authid.clone(),
                private_key,
                authextra.clone(),
            )?),
        };
        Ok(authenticator)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authid = match self {
            Self::Anonymous { authid, .. }
            | Self::Ticket { authid, .. }
            | Self::Wampcra { authid, .. }
            | Self::Cryptosign { authid, .. } => authid,
        };
        f.debug_struct("AuthConfig")
            .field("method", &self.method())
            .field("authid", authid)
            .field("credentials", &"[REDACTED]")
            .finish()
    }
}
