//! WAMP client session protocol.
//!
//! Two single-owner state machines sit on top of the message catalogue:
//!
//! - [`Joiner`] drives the opening handshake until the router welcomes or
//!   aborts the session.
//! - [`WampSession`] correlates every request with its response once the
//!   session is established.
//!
//! ## Message Flow
//!
//! ```text
//! Client                              Router
//!    |                                  |
//!    |-------- HELLO (roles) --------->|  Joiner::send_hello
//!    |                                  |
//!    |<------- CHALLENGE --------------|  optional, authenticator answers
//!    |-------- AUTHENTICATE ---------->|
//!    |                                  |
//!    |<------- WELCOME ----------------|  SessionDetails available
//!    |     or ABORT (reason)            |  Application error
//!    |                                  |
//!    |======= CALL / REGISTER ... ====>|  WampSession::send_message
//!    |<====== RESULT / REGISTERED ... =|  WampSession::receive
//! ```
//!
//! ## Joiner States
//!
//! | State           | Description                      | Valid Transitions            |
//! |-----------------|----------------------------------|------------------------------|
//! | `Init`          | Nothing sent yet                 | → HelloSent                  |
//! | `HelloSent`     | HELLO sent                       | → ChallengeSent, Joined, Aborted |
//! | `ChallengeSent` | AUTHENTICATE returned to caller  | → Joined, Aborted            |
//! | `Joined`        | WELCOME received                 | (terminal)                   |
//! | `Aborted`       | ABORT received                   | (terminal)                   |
//!
//! # Usage
//!
//! ```rust,ignore
//! use wampproto::protocol::{Joiner, WampSession};
//!
//! let mut joiner = Joiner::new("realm1");
//! let hello = joiner.send_hello()?;
//! // send hello, feed router replies to joiner.receive(...) until joined
//! let details = joiner.session_details()?;
//!
//! let mut session = WampSession::new();
//! let call = session.send_message(&Call::new(1, "com.example.add").into())?;
//! ```

mod joiner;
mod roles;
mod session;

pub use joiner::{Joiner, JoinerState};
pub use roles::{Role, Roles};
pub use session::{SessionStats, WampSession};

/// Outcome of a successful handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDetails {
    /// Router-assigned session ID
    pub session_id: u64,
    /// Joined realm
    pub realm: String,
    /// Authenticated identity
    pub authid: String,
    /// Granted role
    pub authrole: String,
}
