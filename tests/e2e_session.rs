//! End-to-end session correlation tests.
//!
//! These tests drive a `WampSession` through serialized payloads the way a
//! connection loop would, covering RPC and PubSub lifecycles and the wire
//! grammar beyond the unit test level.

use proptest::prelude::*;
use serde_json::{json, Value};
use wampproto::messages::{
    Call, CallResult, Dict, ErrorMessage, Event, Invocation, List, Publish, Published, Register,
    Registered, Subscribe, Subscribed, Unregister, Unregistered, Unsubscribe, Unsubscribed, Yield,
    MAX_ID,
};
use wampproto::{
    JsonSerializer, Message, MessageType, Payload, Serializer, SessionScopeIdGenerator, WampError,
    WampSession, WireMessage,
};

fn router_says(msg: impl Into<Message>) -> Payload {
    JsonSerializer.serialize(&msg.into()).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test a call is answered exactly once
#[test]
fn test_call_result_over_the_wire() {
    init_tracing();
    let mut session = WampSession::new();
    let mut ids = SessionScopeIdGenerator::new();

    let request_id = ids.next();
    let payload = session
        .send_message(&Call::new(request_id, "io.xconn.echo").with_payload(vec![json!("hi")], Dict::new()).into())
        .unwrap();
    assert_eq!(payload, Payload::Text(r#"[48,1,{},"io.xconn.echo",["hi"]]"#.to_string()));

    let result = session
        .receive(&Payload::Text(r#"[50,1,{},["hi"]]"#.to_string()))
        .unwrap();
    match result {
        Message::Result(result) => assert_eq!(result.args, vec![json!("hi")]),
        other => panic!("unexpected {other:?}"),
    }

    let err = session.receive(&router_says(CallResult::new(99))).unwrap_err();
    assert!(matches!(err, WampError::Correlation(_)));
}

/// Test the callee lifecycle: register, serve, unregister
#[test]
fn test_callee_lifecycle() {
    init_tracing();
    let mut session = WampSession::new();

    session.send_message(&Register::new(2, "io.xconn.add").into()).unwrap();
    session.receive(&router_says(Registered::new(2, 3))).unwrap();

    let invocation = Invocation::new(4, 3).with_payload(vec![json!(1), json!(2)], Dict::new());
    session.receive(&router_says(invocation)).unwrap();
    session
        .send_message(&Yield::new(4).with_payload(vec![json!(3)], Dict::new()).into())
        .unwrap();
    assert!(session.send_message(&Yield::new(4).into()).is_err());

    assert!(session.receive(&router_says(Invocation::new(5, 999))).is_err());

    session.send_message(&Unregister::new(3, 3).into()).unwrap();
    session.receive(&router_says(Unregistered::new(3))).unwrap();
    assert!(session.receive(&router_says(Invocation::new(6, 3))).is_err());

    let stats = session.stats();
    assert_eq!(stats.registrations, 0);
    assert_eq!(stats.pending_invocations, 0);
    assert_eq!(stats.pending_requests, 0);
}

/// Test a callee can fail an invocation with ERROR
#[test]
fn test_callee_returns_error() {
    let mut session = WampSession::new();
    session.send_message(&Register::new(1, "io.xconn.div").into()).unwrap();
    session.receive(&router_says(Registered::new(1, 10))).unwrap();
    session.receive(&router_says(Invocation::new(2, 10))).unwrap();

    let error = ErrorMessage::new(MessageType::Invocation, 2, "wamp.error.invalid_argument")
        .with_payload(vec![json!("division by zero")], Dict::new());
    let payload = session.send_message(&error.into()).unwrap();
    assert_eq!(
        payload,
        Payload::Text(r#"[8,68,2,{},"wamp.error.invalid_argument",["division by zero"]]"#.to_string())
    );
    assert!(!session.has_pending_invocation(2));
}

/// Test a router ERROR for a call surfaces as an application error
#[test]
fn test_call_error_to_application_error() {
    let mut session = WampSession::new();
    session.send_message(&Call::new(7, "io.xconn.missing").into()).unwrap();

    let error = ErrorMessage::new(MessageType::Call, 7, "wamp.error.no_such_procedure");
    let Message::Error(error) = session.receive(&router_says(error)).unwrap() else {
        panic!("expected ERROR");
    };
    assert_eq!(error.to_application_error().to_string(), "wamp.error.no_such_procedure");

    let again = ErrorMessage::new(MessageType::Call, 7, "wamp.error.no_such_procedure");
    assert!(session.receive(&router_says(again)).is_err());
}

/// Test subscriber lifecycle with acknowledged publishing
#[test]
fn test_pubsub_lifecycle() {
    let mut session = WampSession::new();

    session.send_message(&Subscribe::new(1, "io.xconn.topic").into()).unwrap();
    session.receive(&router_says(Subscribed::new(1, 5))).unwrap();
    session
        .receive(&router_says(Event::new(5, 100).with_payload(vec![json!("news")], Dict::new())))
        .unwrap();

    session.send_message(&Publish::new(2, "io.xconn.topic").into()).unwrap();
    assert!(session.receive(&router_says(Published::new(2, 101))).is_err());

    session
        .send_message(&Publish::new(3, "io.xconn.topic").acknowledged().into())
        .unwrap();
    session.receive(&router_says(Published::new(3, 102))).unwrap();

    session.send_message(&Unsubscribe::new(4, 5).into()).unwrap();
    session.receive(&router_says(Unsubscribed::new(4))).unwrap();
    assert!(!session.has_subscription(5));
    assert!(session.receive(&router_says(Event::new(5, 103))).is_err());
}

/// Test malformed wire input is rejected before correlation
#[test]
fn test_malformed_payloads_rejected() {
    let mut session = WampSession::new();
    session.send_message(&Call::new(1, "io.xconn.echo").into()).unwrap();

    for bad in [r#"{"not":"a list"}"#, "[50]", "[50,1,[]]", "[99,1,{}]", "[50,1,{},{}]", "nope"] {
        assert!(session.receive(&Payload::Text(bad.to_string())).is_err(), "{bad}");
    }
    session.receive(&Payload::Text("[50,1,{}]".to_string())).unwrap();
}

fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

fn args() -> impl Strategy<Value = List> {
    prop::collection::vec(json_scalar(), 0..4)
}

fn kwargs() -> impl Strategy<Value = Dict> {
    prop::collection::vec(("[a-z]{1,6}", json_scalar()), 0..4)
        .prop_map(|pairs| pairs.into_iter().collect())
}

fn id() -> impl Strategy<Value = u64> {
    0..=MAX_ID
}

fn uri() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[a-z]{1,8}){0,3}"
}

proptest! {
    #[test]
    fn prop_call_roundtrip(request_id in id(), procedure in uri(), args in args(), kwargs in kwargs()) {
        let call = Call::new(request_id, procedure).with_payload(args, kwargs);
        prop_assert_eq!(Call::parse(&call.marshal()).unwrap(), call);
    }

    #[test]
    fn prop_event_roundtrip(subscription_id in id(), publication_id in id(), details in kwargs(), args in args(), kwargs in kwargs()) {
        let event = Event::new(subscription_id, publication_id)
            .with_details(details)
            .with_payload(args, kwargs);
        prop_assert_eq!(Event::parse(&event.marshal()).unwrap(), event);
    }

    #[test]
    fn prop_error_roundtrip(request_id in id(), uri in uri(), args in args(), kwargs in kwargs()) {
        let error = ErrorMessage::new(MessageType::Invocation, request_id, uri).with_payload(args, kwargs);
        let message: Message = error.into();
        let payload = JsonSerializer.serialize(&message).unwrap();
        prop_assert_eq!(JsonSerializer.deserialize(&payload).unwrap(), message);
    }

    #[test]
    fn prop_ids_above_max_rejected(excess in 1u64..1_000_000) {
        let msg = vec![json!(65), json!(MAX_ID + excess), json!(1)];
        prop_assert!(Registered::parse(&msg).is_err());
    }

    #[test]
    fn prop_wrong_type_code_rejected(code in 0u64..100) {
        prop_assume!(code != MessageType::Registered.code());
        let msg = vec![json!(code), json!(1), json!(2)];
        prop_assert!(Registered::parse(&msg).is_err());
    }
}
