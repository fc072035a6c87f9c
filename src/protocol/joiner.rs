//! Client side of the WAMP opening handshake.

use std::fmt;
use std::sync::Arc;

use super::{Roles, SessionDetails};
use crate::auth::{AnonymousAuthenticator, ClientAuthenticator};
use crate::error::{ApplicationError, Result, WampError};
use crate::messages::{Hello, Message};
use crate::serializer::{JsonSerializer, Payload, Serializer};

/// Handshake state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinerState {
    /// Nothing sent yet
    Init,
    /// HELLO sent, waiting for WELCOME, CHALLENGE or ABORT
    HelloSent,
    /// AUTHENTICATE produced, waiting for WELCOME or ABORT
    ChallengeSent,
    /// Session established
    Joined,
    /// Router refused the session
    Aborted,
}

/// Handshake state machine for a single join attempt.
///
/// Discard the joiner after an error; a failed `authenticate` leaves it in
/// `HelloSent`.
pub struct Joiner<S: Serializer = JsonSerializer> {
    realm: String,
    serializer: S,
    authenticator: Arc<dyn ClientAuthenticator>,
    roles: Roles,
    state: JoinerState,
    session_details: Option<SessionDetails>,
}

impl Joiner<JsonSerializer> {
    /// Anonymous joiner using the JSON encoding
    pub fn new(realm: impl Into<String>) -> Self {
        Self::with_serializer(realm, JsonSerializer)
    }
}

impl<S: Serializer> Joiner<S> {
    /// Anonymous joiner with a specific encoding
    pub fn with_serializer(realm: impl Into<String>, serializer: S) -> Self {
        Self {
            realm: realm.into(),
            serializer,
            authenticator: Arc::new(AnonymousAuthenticator::new("", None)),
            roles: Roles::client(),
            state: JoinerState::Init,
            session_details: None,
        }
    }

    /// Authenticate with the given strategy
    pub fn with_authenticator(mut self, authenticator: Arc<dyn ClientAuthenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Override the declared roles
    pub fn with_roles(mut self, roles: Roles) -> Self {
        self.roles = roles;
        self
    }

    /// Realm to join
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Current handshake state
    pub fn state(&self) -> JoinerState {
        self.state
    }

    /// Build and serialize the HELLO. Only valid once, from `Init`.
    pub fn send_hello(&mut self) -> Result<Payload> {
        if self.state != JoinerState::Init {
            return Err(WampError::Correlation(format!(
                "Cannot send HELLO in state {:?}",
                self.state
            )));
        }

        let hello = Hello::new(self.realm.clone(), self.roles.to_dict())
            .with_authid(self.authenticator.auth_id())
            .with_authmethods(vec![self.authenticator.auth_method().to_string()])
            .with_authextra(self.authenticator.auth_extra().cloned().unwrap_or_default());

        let payload = self.serializer.serialize(&hello.into())?;
        self.state = JoinerState::HelloSent;
        tracing::debug!(
            "HELLO sent for realm {} (authmethod {})",
            self.realm,
            self.authenticator.auth_method()
        );
        Ok(payload)
    }

    /// Deserialize and process a router reply.
    ///
    /// Returns the serialized AUTHENTICATE when the router challenged us,
    /// `None` once welcomed.
    pub async fn receive(&mut self, payload: &Payload) -> Result<Option<Payload>> {
        let msg = self.serializer.deserialize(payload)?;
        match self.receive_message(msg).await? {
            Some(reply) => Ok(Some(self.serializer.serialize(&reply)?)),
            None => Ok(None),
        }
    }

    /// Process a router reply.
    ///
    /// ABORT moves the joiner to `Aborted` and surfaces the reason as
    /// [`WampError::Application`].
    pub async fn receive_message(&mut self, msg: Message) -> Result<Option<Message>> {
        match msg {
            Message::Welcome(welcome)
                if matches!(self.state, JoinerState::HelloSent | JoinerState::ChallengeSent) =>
            {
                self.session_details = Some(SessionDetails {
                    session_id: welcome.session_id,
                    realm: self.realm.clone(),
                    authid: welcome.authid,
                    authrole: welcome.authrole,
                });
                self.state = JoinerState::Joined;
                tracing::debug!("Joined realm {} as session {}", self.realm, welcome.session_id);
                Ok(None)
            },
            Message::Challenge(challenge) if self.state == JoinerState::HelloSent => {
                tracing::trace!("CHALLENGE received (authmethod {})", challenge.authmethod);
                let authenticate = self.authenticator.authenticate(&challenge).await?;
                self.state = JoinerState::ChallengeSent;
                Ok(Some(authenticate.into()))
            },
            Message::Abort(abort)
                if matches!(self.state, JoinerState::HelloSent | JoinerState::ChallengeSent) =>
            {
                self.state = JoinerState::Aborted;
                tracing::warn!("Join of realm {} aborted: {}", self.realm, abort.reason);
                Err(ApplicationError::new(abort.reason)
                    .with_args(abort.args)
                    .with_kwargs(abort.kwargs)
                    .with_details(abort.details)
                    .into())
            },
            Message::Welcome(_)
            | Message::Challenge(_)
            | Message::Abort(_)
            | Message::Hello(_)
            | Message::Authenticate(_)
            | Message::Goodbye(_)
            | Message::Error(_)
            | Message::Publish(_)
            | Message::Published(_)
            | Message::Subscribe(_)
            | Message::Subscribed(_)
            | Message::Unsubscribe(_)
            | Message::Unsubscribed(_)
            | Message::Event(_)
            | Message::Call(_)
            | Message::Cancel(_)
            | Message::Result(_)
            | Message::Register(_)
            | Message::Registered(_)
            | Message::Unregister(_)
            | Message::Unregistered(_)
            | Message::Invocation(_)
            | Message::Interrupt(_)
            | Message::Yield(_) => Err(WampError::Correlation(format!(
                "Cannot process {} in state {:?}",
                msg.name(),
                self.state
            ))),
        }
    }

    /// Session details, available once joined
    pub fn session_details(&self) -> Result<SessionDetails> {
        match (&self.session_details, self.state) {
            (Some(details), JoinerState::Joined) => Ok(details.clone()),
            _ => Err(WampError::SessionNotReady(format!(
                "session not ready in state {:?}",
                self.state
            ))),
        }
    }
}

impl<S: Serializer + fmt::Debug> fmt::Debug for Joiner<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Joiner")
            .field("realm", &self.realm)
            .field("serializer", &self.serializer)
            .field("authenticator", &self.authenticator)
            .field("state", &self.state)
            .finish()
    }
}
