//! Client-side authentication strategies.
//!
//! Every strategy implements [`ClientAuthenticator`]: it advertises an
//! `authmethod`, an `authid` and optional `authextra` in HELLO, and answers a
//! router CHALLENGE with an AUTHENTICATE.
//!
//! | Method       | Type                          | Secret material              |
//! |--------------|-------------------------------|------------------------------|
//! | `anonymous`  | [`AnonymousAuthenticator`]    | none                         |
//! | `ticket`     | [`TicketAuthenticator`]       | pre-shared ticket            |
//! | `wampcra`    | [`WampCraAuthenticator`]      | shared secret (HMAC-SHA256)  |
//! | `cryptosign` | [`CryptoSignAuthenticator`]   | Ed25519 private key (hex)    |
//!
//! Authenticators hold no per-handshake state and can be shared between
//! joiners as `Arc<dyn ClientAuthenticator>`. Secret material is zeroized on
//! drop and redacted from `Debug` output.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wampproto::auth::{ClientAuthenticator, TicketAuthenticator};
//!
//! let auth: Arc<dyn ClientAuthenticator> =
//!     Arc::new(TicketAuthenticator::new("alice", "s3cr3t", None));
//! let authenticate = auth.authenticate(&challenge).await?;
//! ```

mod anonymous;
mod cryptosign;
mod ticket;
mod wampcra;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::messages::{Authenticate, Challenge, Dict};

pub use anonymous::AnonymousAuthenticator;
pub use cryptosign::{
    generate_cryptosign_challenge, generate_cryptosign_challenge_with_rng,
    sign_cryptosign_challenge, verify_cryptosign_signature, CryptoSignAuthenticator,
};
pub use ticket::TicketAuthenticator;
pub use wampcra::{
    derive_cra_key, generate_wampcra_challenge, generate_wampcra_challenge_with_rng,
    sign_wampcra_challenge, verify_wampcra_signature, WampCraAuthenticator, DEFAULT_ITERATIONS,
    DEFAULT_KEY_LENGTH, MAX_ITERATIONS, MAX_KEY_LENGTH,
};

/// Errors from authenticators and their standalone helpers
#[derive(Debug, Error)]
pub enum AuthError {
    /// Anonymous sessions never receive a CHALLENGE
    #[error("authenticate() must not be called for anonymous authentication")]
    AnonymousChallenge,

    /// `extra.challenge` absent or not a string
    #[error("Challenge string missing in extra")]
    ChallengeMissing,

    /// `extra.iterations` absent or not numeric while a salt is present
    #[error("Iterations missing in extra")]
    IterationsMissing,

    /// `extra.keylen` absent or not numeric while a salt is present
    #[error("Key length missing in extra")]
    KeyLengthMissing,

    /// A challenge field has the wrong type or an out-of-range value
    #[error("Invalid challenge: {0}")]
    InvalidChallenge(String),

    /// Private key is not 64 hex characters
    #[error("Invalid private key length. Expected 64 hex characters (32 bytes).")]
    InvalidPrivateKeyLength,

    /// Key material could not be used
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Hex decoding failed
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Client side of a WAMP authentication method.
#[async_trait]
pub trait ClientAuthenticator: Send + Sync + fmt::Debug {
    /// Method name advertised in HELLO `authmethods`
    fn auth_method(&self) -> &str;

    /// Claimed identity
    fn auth_id(&self) -> &str;

    /// Extra data sent in HELLO `authextra`
    fn auth_extra(&self) -> Option<&Dict>;

    /// Answer a router CHALLENGE.
    ///
    /// May suspend while key derivation or signing completes. Failures leave
    /// the authenticator unchanged.
    async fn authenticate(&self, challenge: &Challenge) -> Result<Authenticate, AuthError>;
}

/// Fetch the mandatory `challenge` string from CHALLENGE extra.
pub(crate) fn challenge_string(challenge: &Challenge) -> Result<&str, AuthError> {
    challenge
        .extra
        .get("challenge")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::ChallengeMissing)
}
