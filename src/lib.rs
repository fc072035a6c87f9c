//! # wampproto - WAMP Client Protocol Core
//!
//! Sans-I/O building blocks for a WAMP (Web Application Messaging Protocol)
//! client: a validated message catalogue, a session-level request/response
//! correlator, and the opening handshake with four authentication methods.
//!
//! ## Features
//!
//! - **Closed message catalogue**: every WAMP v2 message with its type code,
//!   length bounds, and per-field validation
//! - **Session correlation**: outstanding CALL/REGISTER/SUBSCRIBE/... requests
//!   and live registrations/subscriptions tracked per session
//! - **Handshake state machine**: HELLO → CHALLENGE → AUTHENTICATE → WELCOME/ABORT
//! - **Authentication**: anonymous, ticket, WAMP-CRA (HMAC-SHA256, PBKDF2)
//!   and cryptosign (Ed25519)
//!
//! No transport lives here. Callers move [`Payload`]s between a socket and the
//! [`Joiner`] / [`WampSession`] state machines.
//!
//! ## Protocol Overview
//!
//! ```text
//! Client                              Router
//!    |------ HELLO (realm, roles) --->|
//!    |<----- CHALLENGE ---------------|   (ticket, wampcra, cryptosign)
//!    |------ AUTHENTICATE ----------->|
//!    |<----- WELCOME / ABORT ---------|
//!    |                                |
//!    |====== CALL ===================>|
//!    |<===== RESULT / ERROR ==========|
//! ```
//!
//! ### Message Types
//!
//! | Type         | Code | Direction        | Purpose                          |
//! |--------------|------|------------------|----------------------------------|
//! | HELLO        | 1    | Client→Router    | Open a session on a realm        |
//! | WELCOME      | 2    | Router→Client    | Session established              |
//! | ABORT        | 3    | Router→Client    | Session refused                  |
//! | CHALLENGE    | 4    | Router→Client    | Authentication challenge         |
//! | AUTHENTICATE | 5    | Client→Router    | Challenge response               |
//! | CALL         | 48   | Client→Router    | Invoke a procedure               |
//! | RESULT       | 50   | Router→Client    | Call result                      |
//! | INVOCATION   | 68   | Router→Client    | Call routed to our procedure     |
//! | YIELD        | 70   | Client→Router    | Invocation result                |
//!
//! See [`messages`] for the full catalogue.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wampproto::{Joiner, JoinerState, WampSession, TicketAuthenticator};
//! use wampproto::messages::Call;
//!
//! let auth = Arc::new(TicketAuthenticator::new("alice", "s3cr3t", None));
//! let mut joiner = Joiner::new("realm1").with_authenticator(auth);
//!
//! transport.send(joiner.send_hello()?);
//! while joiner.state() != JoinerState::Joined {
//!     if let Some(reply) = joiner.receive(&transport.recv()).await? {
//!         transport.send(reply);
//!     }
//! }
//! let details = joiner.session_details()?;
//!
//! let mut session = WampSession::new();
//! transport.send(session.send_message(&Call::new(1, "com.example.add").into())?);
//! let result = session.receive(&transport.recv())?;
//! ```
//!
//! ## Modules
//!
//! - [`messages`]: Message catalogue and wire validation
//! - [`serializer`]: Message encodings
//! - [`auth`]: Authentication strategies and challenge helpers
//! - [`protocol`]: Handshake and session correlation
//! - [`idgen`]: Session and request ID generation
//! - [`config`]: TOML client configuration
//! - [`error`]: Error types and result aliases

pub mod auth;
pub mod config;
pub mod error;
pub mod idgen;
pub mod messages;
pub mod protocol;
pub mod serializer;

// Re-exports for convenience
pub use auth::{
    AnonymousAuthenticator, AuthError, ClientAuthenticator, CryptoSignAuthenticator,
    TicketAuthenticator, WampCraAuthenticator,
};
pub use config::Config;
pub use error::{ApplicationError, Result, WampError};
pub use idgen::{generate_session_id, SessionScopeIdGenerator};
pub use messages::{Message, MessageType, WireMessage};
pub use protocol::{Joiner, JoinerState, Role, Roles, SessionDetails, SessionStats, WampSession};
pub use serializer::{JsonSerializer, Payload, Serializer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
