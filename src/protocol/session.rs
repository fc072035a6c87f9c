//! Request/response correlation for an established WAMP session.
//!
//! Tracks every outstanding request across six independent categories plus
//! the live registration and subscription registries, and rejects inbound
//! messages that do not match anything the session asked for.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, WampError};
use crate::messages::{ErrorMessage, Message, MessageType};
use crate::serializer::{JsonSerializer, Payload, Serializer};

/// Bookkeeping planned for an outbound message, applied once it serialized.
#[derive(Debug, Clone, Copy)]
enum Outbound {
    Call(u64),
    Register(u64),
    Unregister { request_id: u64, registration_id: u64 },
    Publish(u64),
    Subscribe(u64),
    Unsubscribe { request_id: u64, subscription_id: u64 },
    InvocationDone(u64),
    Untracked,
}

/// Session correlator.
///
/// Single owner: one connection's read/write loop drives one instance.
#[derive(Debug)]
pub struct WampSession<S: Serializer = JsonSerializer> {
    serializer: S,

    call_requests: HashSet<u64>,
    register_requests: HashSet<u64>,
    unregister_requests: HashMap<u64, u64>,
    registrations: HashSet<u64>,
    invocation_requests: HashSet<u64>,

    publish_requests: HashSet<u64>,
    subscribe_requests: HashSet<u64>,
    unsubscribe_requests: HashMap<u64, u64>,
    subscriptions: HashSet<u64>,

    messages_sent: u64,
    messages_received: u64,
}

impl WampSession<JsonSerializer> {
    /// Create a session using the JSON encoding
    pub fn new() -> Self {
        Self::with_serializer(JsonSerializer)
    }
}

impl Default for WampSession<JsonSerializer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Serializer> WampSession<S> {
    /// Create a session with a specific encoding
    pub fn with_serializer(serializer: S) -> Self {
        Self {
            serializer,
            call_requests: HashSet::new(),
            register_requests: HashSet::new(),
            unregister_requests: HashMap::new(),
            registrations: HashSet::new(),
            invocation_requests: HashSet::new(),
            publish_requests: HashSet::new(),
            subscribe_requests: HashSet::new(),
            unsubscribe_requests: HashMap::new(),
            subscriptions: HashSet::new(),
            messages_sent: 0,
            messages_received: 0,
        }
    }

    /// Record an outbound message and serialize it.
    ///
    /// Nothing is recorded if validation or serialization fails.
    pub fn send_message(&mut self, msg: &Message) -> Result<Payload> {
        let outbound = self.plan_outbound(msg)?;
        let payload = self.serializer.serialize(msg)?;
        self.commit_outbound(outbound);
        self.messages_sent += 1;
        Ok(payload)
    }

    /// Deserialize and correlate an inbound payload
    pub fn receive(&mut self, payload: &Payload) -> Result<Message> {
        let msg = self.serializer.deserialize(payload)?;
        self.receive_message(msg)
    }

    /// Correlate an inbound message, returning it on success
    pub fn receive_message(&mut self, msg: Message) -> Result<Message> {
        match &msg {
            Message::Result(result) => {
                if !self.call_requests.remove(&result.request_id) {
                    return Err(invalid_request(msg.kind()));
                }
            },
            Message::Registered(registered) => {
                if !self.register_requests.remove(&registered.request_id) {
                    return Err(invalid_request(msg.kind()));
                }
                self.registrations.insert(registered.registration_id);
            },
            Message::Unregistered(unregistered) => {
                let registration_id = *self
                    .unregister_requests
                    .get(&unregistered.request_id)
                    .ok_or_else(|| invalid_request(msg.kind()))?;
                if !self.registrations.contains(&registration_id) {
                    return Err(correlation(format!(
                        "received {} for invalid registration ID",
                        msg.name()
                    )));
                }
                self.unregister_requests.remove(&unregistered.request_id);
                self.registrations.remove(&registration_id);
            },
            Message::Invocation(invocation) => {
                if !self.registrations.contains(&invocation.registration_id) {
                    return Err(correlation(format!(
                        "received {} for invalid registration ID",
                        msg.name()
                    )));
                }
                if !self.invocation_requests.insert(invocation.request_id) {
                    return Err(correlation(format!(
                        "received {} for already pending request ID {}",
                        msg.name(),
                        invocation.request_id
                    )));
                }
            },
            Message::Published(published) => {
                if !self.publish_requests.remove(&published.request_id) {
                    return Err(invalid_request(msg.kind()));
                }
            },
            Message::Subscribed(subscribed) => {
                if !self.subscribe_requests.remove(&subscribed.request_id) {
                    return Err(invalid_request(msg.kind()));
                }
                self.subscriptions.insert(subscribed.subscription_id);
            },
            Message::Unsubscribed(unsubscribed) => {
                let subscription_id = *self
                    .unsubscribe_requests
                    .get(&unsubscribed.request_id)
                    .ok_or_else(|| invalid_request(msg.kind()))?;
                if !self.subscriptions.contains(&subscription_id) {
                    return Err(correlation(format!(
                        "received {} for invalid subscription ID",
                        msg.name()
                    )));
                }
                self.unsubscribe_requests.remove(&unsubscribed.request_id);
                self.subscriptions.remove(&subscription_id);
            },
            Message::Event(event) => {
                if !self.subscriptions.contains(&event.subscription_id) {
                    return Err(correlation(format!(
                        "received {} for invalid subscription ID",
                        msg.name()
                    )));
                }
            },
            Message::Error(error) => self.receive_error(error)?,
            Message::Hello(_)
            | Message::Welcome(_)
            | Message::Abort(_)
            | Message::Challenge(_)
            | Message::Authenticate(_)
            | Message::Goodbye(_)
            | Message::Publish(_)
            | Message::Subscribe(_)
            | Message::Unsubscribe(_)
            | Message::Call(_)
            | Message::Cancel(_)
            | Message::Register(_)
            | Message::Unregister(_)
            | Message::Interrupt(_)
            | Message::Yield(_) => {
                return Err(correlation(format!("unknown message {}", msg.name())));
            },
        }

        self.messages_received += 1;
        tracing::trace!("Received {} ({} pending calls)", msg.name(), self.call_requests.len());
        Ok(msg)
    }

    /// Check if a registration is live
    pub fn has_registration(&self, registration_id: u64) -> bool {
        self.registrations.contains(&registration_id)
    }

    /// Check if a subscription is live
    pub fn has_subscription(&self, subscription_id: u64) -> bool {
        self.subscriptions.contains(&subscription_id)
    }

    /// Check if an INVOCATION awaits its YIELD or ERROR
    pub fn has_pending_invocation(&self, request_id: u64) -> bool {
        self.invocation_requests.contains(&request_id)
    }

    /// Get session statistics
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            messages_sent: self.messages_sent,
            messages_received: self.messages_received,
            pending_requests: self.call_requests.len()
                + self.register_requests.len()
                + self.unregister_requests.len()
                + self.publish_requests.len()
                + self.subscribe_requests.len()
                + self.unsubscribe_requests.len(),
            pending_invocations: self.invocation_requests.len(),
            registrations: self.registrations.len(),
            subscriptions: self.subscriptions.len(),
        }
    }

    fn plan_outbound(&self, msg: &Message) -> Result<Outbound> {
        let outbound = match msg {
            Message::Call(call) => {
                self.ensure_not_pending(msg.kind(), call.request_id)?;
                Outbound::Call(call.request_id)
            },
            Message::Register(register) => {
                self.ensure_not_pending(msg.kind(), register.request_id)?;
                Outbound::Register(register.request_id)
            },
            Message::Unregister(unregister) => {
                self.ensure_not_pending(msg.kind(), unregister.request_id)?;
                Outbound::Unregister {
                    request_id: unregister.request_id,
                    registration_id: unregister.registration_id,
                }
            },
            Message::Publish(publish) if publish.acknowledge() => {
                self.ensure_not_pending(msg.kind(), publish.request_id)?;
                Outbound::Publish(publish.request_id)
            },
            Message::Publish(_) => Outbound::Untracked,
            Message::Subscribe(subscribe) => {
                self.ensure_not_pending(msg.kind(), subscribe.request_id)?;
                Outbound::Subscribe(subscribe.request_id)
            },
            Message::Unsubscribe(unsubscribe) => {
                self.ensure_not_pending(msg.kind(), unsubscribe.request_id)?;
                Outbound::Unsubscribe {
                    request_id: unsubscribe.request_id,
                    subscription_id: unsubscribe.subscription_id,
                }
            },
            Message::Yield(yielded) => {
                if !self.invocation_requests.contains(&yielded.request_id) {
                    return Err(correlation("cannot yield for unknown invocation request".to_string()));
                }
                Outbound::InvocationDone(yielded.request_id)
            },
            Message::Error(error) => {
                if error.message_type != MessageType::Invocation.code() {
                    return Err(correlation("send only supported for invocation error".to_string()));
                }
                if !self.invocation_requests.contains(&error.request_id) {
                    return Err(correlation(
                        "cannot send error for unknown invocation request".to_string(),
                    ));
                }
                Outbound::InvocationDone(error.request_id)
            },
            Message::Hello(_)
            | Message::Welcome(_)
            | Message::Abort(_)
            | Message::Challenge(_)
            | Message::Authenticate(_)
            | Message::Goodbye(_)
            | Message::Published(_)
            | Message::Subscribed(_)
            | Message::Unsubscribed(_)
            | Message::Event(_)
            | Message::Cancel(_)
            | Message::Result(_)
            | Message::Registered(_)
            | Message::Unregistered(_)
            | Message::Invocation(_)
            | Message::Interrupt(_) => {
                return Err(correlation(format!("cannot send {} through a session", msg.name())));
            },
        };
        Ok(outbound)
    }

    fn commit_outbound(&mut self, outbound: Outbound) {
        match outbound {
            Outbound::Call(request_id) => {
                self.call_requests.insert(request_id);
            },
            Outbound::Register(request_id) => {
                self.register_requests.insert(request_id);
            },
            Outbound::Unregister {
                request_id,
                registration_id,
            } => {
                self.unregister_requests.insert(request_id, registration_id);
            },
            Outbound::Publish(request_id) => {
                self.publish_requests.insert(request_id);
            },
            Outbound::Subscribe(request_id) => {
                self.subscribe_requests.insert(request_id);
            },
            Outbound::Unsubscribe {
                request_id,
                subscription_id,
            } => {
                self.unsubscribe_requests.insert(request_id, subscription_id);
            },
            Outbound::InvocationDone(request_id) => {
                self.invocation_requests.remove(&request_id);
            },
            Outbound::Untracked => {},
        }
    }

    /// A request ID may be outstanding in at most one outbound table.
    fn ensure_not_pending(&self, kind: MessageType, request_id: u64) -> Result<()> {
        let pending = self.call_requests.contains(&request_id)
            || self.register_requests.contains(&request_id)
            || self.unregister_requests.contains_key(&request_id)
            || self.publish_requests.contains(&request_id)
            || self.subscribe_requests.contains(&request_id)
            || self.unsubscribe_requests.contains_key(&request_id);

        if pending {
            return Err(correlation(format!(
                "cannot send {kind}: request ID {request_id} is already pending"
            )));
        }
        Ok(())
    }

    fn receive_error(&mut self, error: &ErrorMessage) -> Result<()> {
        let removed = match MessageType::from_code(error.message_type) {
            Some(MessageType::Call) => self.call_requests.remove(&error.request_id),
            Some(MessageType::Register) => self.register_requests.remove(&error.request_id),
            Some(MessageType::Unregister) => self.unregister_requests.remove(&error.request_id).is_some(),
            Some(MessageType::Subscribe) => self.subscribe_requests.remove(&error.request_id),
            Some(MessageType::Unsubscribe) => self.unsubscribe_requests.remove(&error.request_id).is_some(),
            Some(MessageType::Publish) => self.publish_requests.remove(&error.request_id),
            Some(other) => {
                return Err(correlation(format!("unknown error message type {other}")));
            },
            None => {
                return Err(correlation(format!(
                    "unknown error message type {}",
                    error.message_type
                )));
            },
        };

        if !removed {
            let request = MessageType::from_code(error.message_type)
                .map(|kind| kind.name().to_lowercase())
                .unwrap_or_default();
            return Err(correlation(format!("received ERROR for invalid {request} request")));
        }

        tracing::debug!("Peer returned {} for request {}", error.uri, error.request_id);
        Ok(())
    }
}

fn correlation(message: String) -> WampError {
    tracing::warn!("Correlation failure: {}", message);
    WampError::Correlation(message)
}

fn invalid_request(kind: MessageType) -> WampError {
    correlation(format!("received {kind} for invalid request ID"))
}

/// Session statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Messages sent
    pub messages_sent: u64,
    /// Messages received and correlated
    pub messages_received: u64,
    /// Outbound requests awaiting a response
    pub pending_requests: usize,
    /// Invocations awaiting a YIELD or ERROR
    pub pending_invocations: usize,
    /// Live registrations
    pub registrations: usize,
    /// Live subscriptions
    pub subscriptions: usize,
}
