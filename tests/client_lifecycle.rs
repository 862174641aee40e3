//! Integration tests for the subscription client lifecycle.
//!
//! These tests drive a client end to end through the scripted in-memory
//! transport:
//! 1. Lazy construction, first subscribe opens the connection
//! 2. Handshake flushes queued starts in order
//! 3. Data frames reach exactly the right callback
//! 4. A dropped connection reconnects and replays every subscription

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use serde_json::{json, Value};

use gql_subscriber::adapters::MemoryConnector;
use gql_subscriber::application::SubscriptionClient;
use gql_subscriber::config::ClientConfig;
use gql_subscriber::domain::foundation::{ConnectionState, SubscriptionId};
use gql_subscriber::domain::protocol::ClientMessage;

// =============================================================================
// Test Infrastructure
// =============================================================================

type Received = Arc<Mutex<Vec<Value>>>;

fn reconnecting_lazy_client(connector: &MemoryConnector) -> SubscriptionClient<MemoryConnector> {
    let config = ClientConfig::new("wss://x").lazy(true).reconnect(true);
    SubscriptionClient::new(config, connector.clone()).expect("valid config")
}

fn recorder() -> (Received, impl FnMut(Value) + Send + 'static) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    (received, move |payload| sink.lock().unwrap().push(payload))
}

fn handshake(
    client: &mut SubscriptionClient<MemoryConnector>,
    connector: &MemoryConnector,
    index: usize,
) {
    connector.accept(index);
    connector.acknowledge(index);
    client.process_pending().expect("handshake frames are well formed");
}

fn data_frame(id: impl std::fmt::Display, payload: &str) -> String {
    format!(r#"{{"type":"data","id":{},"payload":"{}"}}"#, id, payload)
}

// =============================================================================
// Scenario
// =============================================================================

#[test]
fn subscribe_receive_drop_and_replay() {
    let connector = MemoryConnector::new();
    let mut client = reconnecting_lazy_client(&connector);
    let (received, callback) = recorder();

    let id = client.subscribe("subscription Q1 { tick }", json!({}), callback);
    assert_eq!(id, SubscriptionId::new(1));
    assert_eq!(connector.connection_count(), 1);

    connector.accept(0);
    client.process_pending().unwrap();
    assert_eq!(
        connector.sent_messages(0),
        vec![ClientMessage::connection_init(json!({}))]
    );

    connector.acknowledge(0);
    client.process_pending().unwrap();
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(
        connector.sent_messages(0)[1],
        ClientMessage::start(id, "subscription Q1 { tick }", json!({}))
    );

    connector.deliver(0, data_frame(1, "R1"));
    client.process_pending().unwrap();
    assert_eq!(*received.lock().unwrap(), vec![json!("R1")]);

    connector.hang_up(0);
    client.process_pending().unwrap();
    assert_eq!(client.state(), ConnectionState::Connecting);
    assert_eq!(connector.connection_count(), 2);

    handshake(&mut client, &connector, 1);
    assert_eq!(
        connector.sent_messages(1),
        vec![
            ClientMessage::connection_init(json!({})),
            ClientMessage::start(id, "subscription Q1 { tick }", json!({})),
        ]
    );

    connector.deliver(1, data_frame(1, "R2"));
    client.process_pending().unwrap();
    assert_eq!(*received.lock().unwrap(), vec![json!("R1"), json!("R2")]);
}

// =============================================================================
// Queueing and replay
// =============================================================================

#[test]
fn queued_messages_flush_in_enqueue_order() {
    let connector = MemoryConnector::new();
    let mut client = reconnecting_lazy_client(&connector);

    let a = client.subscribe("A", json!({"n": 1}), |_| {});
    let b = client.subscribe("B", json!({"n": 2}), |_| {});
    let c = client.subscribe("C", json!({"n": 3}), |_| {});
    assert_eq!(client.pending_messages(), 3);
    assert_eq!(connector.connection_count(), 1);

    handshake(&mut client, &connector, 0);

    assert_eq!(client.pending_messages(), 0);
    assert_eq!(
        connector.sent_messages(0),
        vec![
            ClientMessage::connection_init(json!({})),
            ClientMessage::start(a, "A", json!({"n": 1})),
            ClientMessage::start(b, "B", json!({"n": 2})),
            ClientMessage::start(c, "C", json!({"n": 3})),
        ]
    );
}

#[test]
fn reconnect_replays_every_subscription_with_original_operation() {
    let connector = MemoryConnector::new();
    let mut client = reconnecting_lazy_client(&connector);

    let a = client.subscribe("subscription A", json!({"room": "a"}), |_| {});
    let b = client.subscribe("subscription B", json!({"room": "b"}), |_| {});
    handshake(&mut client, &connector, 0);

    connector.hang_up(0);
    client.process_pending().unwrap();
    handshake(&mut client, &connector, 1);

    let replayed: Vec<ClientMessage> = connector.sent_messages(1).into_iter().skip(1).collect();
    assert_eq!(
        replayed,
        vec![
            ClientMessage::start(a, "subscription A", json!({"room": "a"})),
            ClientMessage::start(b, "subscription B", json!({"room": "b"})),
        ]
    );
}

#[test]
fn unsubscribed_subscription_is_not_replayed() {
    let connector = MemoryConnector::new();
    let mut client = reconnecting_lazy_client(&connector);

    let a = client.subscribe("A", json!({}), |_| {});
    let b = client.subscribe("B", json!({}), |_| {});
    handshake(&mut client, &connector, 0);
    client.unsubscribe(a);
    assert_eq!(connector.sent_messages(0).last(), Some(&ClientMessage::stop(a)));

    connector.hang_up(0);
    client.process_pending().unwrap();
    handshake(&mut client, &connector, 1);

    assert_eq!(
        connector.sent_messages(1)[1..],
        [ClientMessage::start(b, "B", json!({}))]
    );
}

#[test]
fn manual_disconnect_and_connect_keeps_subscriptions_alive() {
    let connector = MemoryConnector::new();
    let mut client = reconnecting_lazy_client(&connector);
    let (received, callback) = recorder();
    let id = client.subscribe("subscription Q1 { tick }", json!({}), callback);
    handshake(&mut client, &connector, 0);

    client.disconnect();
    assert_eq!(connector.connection_count(), 1);
    client.connect().unwrap();
    handshake(&mut client, &connector, 1);

    assert_eq!(
        connector.sent_messages(1)[1..],
        [ClientMessage::start(id, "subscription Q1 { tick }", json!({}))]
    );
    connector.deliver(1, data_frame(id, "after-reconnect"));
    client.process_pending().unwrap();
    assert_eq!(*received.lock().unwrap(), vec![json!("after-reconnect")]);
}

// =============================================================================
// Dispatch
// =============================================================================

#[test]
fn data_reaches_exactly_the_addressed_callback() {
    let connector = MemoryConnector::new();
    let mut client = reconnecting_lazy_client(&connector);
    let (first, first_cb) = recorder();
    let (second, second_cb) = recorder();

    client.subscribe("A", json!({}), first_cb);
    let b = client.subscribe("B", json!({}), second_cb);
    handshake(&mut client, &connector, 0);

    connector.deliver(0, data_frame(format!("\"{}\"", b), "for-b"));
    client.process_pending().unwrap();

    assert!(first.lock().unwrap().is_empty());
    assert_eq!(*second.lock().unwrap(), vec![json!("for-b")]);
}

#[test]
fn data_for_unknown_id_is_dropped() {
    let connector = MemoryConnector::new();
    let mut client = reconnecting_lazy_client(&connector);
    let (received, callback) = recorder();
    client.subscribe("A", json!({}), callback);
    handshake(&mut client, &connector, 0);

    connector.deliver(0, data_frame(99, "nobody"));
    connector.deliver(0, r#"{"type":"data","id":"abc","payload":1}"#);

    assert_eq!(client.process_pending().unwrap(), 2);
    assert!(received.lock().unwrap().is_empty());
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[test]
fn informational_frames_change_nothing() {
    let connector = MemoryConnector::new();
    let mut client = reconnecting_lazy_client(&connector);
    client.subscribe("A", json!({}), |_| {});
    handshake(&mut client, &connector, 0);

    for frame in [
        r#"{"type":"ka"}"#,
        r#"{"type":"complete","id":1}"#,
        r#"{"type":"error","id":1,"payload":{"message":"boom"}}"#,
        r#"{"type":"connection_error","payload":{"message":"nope"}}"#,
        r#"{"type":"something_new"}"#,
    ] {
        connector.deliver(0, frame);
    }
    client.process_pending().unwrap();

    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(client.subscription_count(), 1);
}

// =============================================================================
// Laziness and unsubscribe
// =============================================================================

#[test]
fn lazy_client_opens_nothing_until_used() {
    let connector = MemoryConnector::new();
    let mut client = reconnecting_lazy_client(&connector);
    assert_eq!(connector.connection_count(), 0);
    assert_eq!(client.state(), ConnectionState::Disconnected);

    client.connect().unwrap();
    assert_eq!(connector.connection_count(), 1);
}

#[test]
fn unsubscribe_of_absent_id_keeps_others_intact() {
    let connector = MemoryConnector::new();
    let mut client = reconnecting_lazy_client(&connector);
    let a = client.subscribe("A", json!({}), |_| {});
    let b = client.subscribe("B", json!({}), |_| {});

    client.unsubscribe(SubscriptionId::new(42));

    assert_eq!(client.subscription_ids(), vec![a, b]);
    assert_eq!(client.pending_messages(), 2);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn subscribe_returns_pairwise_distinct_ids(
        ops in prop::collection::vec(any::<Option<prop::sample::Index>>(), 1..40)
    ) {
        let connector = MemoryConnector::new();
        let mut client = reconnecting_lazy_client(&connector);

        for op in ops {
            match op {
                None => {
                    client.subscribe("q", json!({}), |_| {});
                }
                Some(index) => {
                    let ids = client.subscription_ids();
                    if !ids.is_empty() {
                        client.unsubscribe(*index.get(&ids));
                    }
                }
            }

            let mut ids = client.subscription_ids();
            let total = ids.len();
            ids.sort_by_key(|id| id.get());
            ids.dedup();
            prop_assert_eq!(ids.len(), total);
        }
    }
}
