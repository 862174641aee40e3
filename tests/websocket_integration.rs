//! Integration tests for the WebSocket transport.
//!
//! A local axum server speaks just enough `graphql-ws` to exercise the
//! client over a real socket: it acknowledges `connection_init` and answers
//! every `start` with one `data` frame tagged with the connection number.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use gql_subscriber::adapters::WebSocketConnector;
use gql_subscriber::application::SubscriptionClient;
use gql_subscriber::config::{BackoffConfig, ClientConfig};

// =============================================================================
// Test Server
// =============================================================================

#[derive(Clone)]
struct ServerState {
    connections: Arc<AtomicUsize>,
    hang_up_after_first_data: bool,
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.protocols(["graphql-ws"])
        .on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(mut socket: WebSocket, state: ServerState) {
    let connection = state.connections.fetch_add(1, Ordering::SeqCst) + 1;

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(frame) = serde_json::from_str::<Value>(&text) else {
            continue;
        };

        match frame["type"].as_str() {
            Some("connection_init") => {
                let ack = json!({"type": "connection_ack"}).to_string();
                if socket.send(Message::Text(ack)).await.is_err() {
                    return;
                }
            }
            Some("start") => {
                let data = json!({
                    "type": "data",
                    "id": frame["id"],
                    "payload": {
                        "connection": connection,
                        "query": frame["payload"]["query"],
                    },
                })
                .to_string();
                if socket.send(Message::Text(data)).await.is_err() {
                    return;
                }
                if state.hang_up_after_first_data && connection == 1 {
                    let _ = socket.send(Message::Close(None)).await;
                    return;
                }
            }
            _ => {}
        }
    }
}

async fn spawn_server(hang_up_after_first_data: bool) -> (SocketAddr, Arc<AtomicUsize>) {
    let connections = Arc::new(AtomicUsize::new(0));
    let state = ServerState {
        connections: connections.clone(),
        hang_up_after_first_data,
    };
    let app = Router::new()
        .route("/graphql", get(upgrade))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, connections)
}

// =============================================================================
// Helpers
// =============================================================================

fn client_for(addr: SocketAddr, reconnect: bool) -> SubscriptionClient<WebSocketConnector> {
    let config = ClientConfig::new(format!("ws://{}/graphql", addr))
        .reconnect(reconnect)
        .backoff(BackoffConfig::immediate());
    let connector = WebSocketConnector::new(config.backoff.clone()).unwrap();
    SubscriptionClient::new(config, connector).unwrap()
}

/// Pumps the client until a payload arrives on `rx`.
async fn next_payload(
    client: &mut SubscriptionClient<WebSocketConnector>,
    rx: &mut mpsc::UnboundedReceiver<Value>,
) -> Value {
    let wait = async {
        loop {
            tokio::select! {
                Some(payload) = rx.recv() => return payload,
                result = client.next_event() => result.unwrap(),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(10), wait)
        .await
        .expect("payload within timeout")
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn subscription_round_trip_over_websocket() {
    let (addr, connections) = spawn_server(false).await;
    let mut client = client_for(addr, false);
    let (tx, mut rx) = mpsc::unbounded_channel();

    client.subscribe("subscription { ping }", json!({}), move |payload| {
        let _ = tx.send(payload);
    });

    let payload = next_payload(&mut client, &mut rx).await;

    assert_eq!(payload["connection"], 1);
    assert_eq!(payload["query"], "subscription { ping }");
    assert!(client.is_connected());
    assert_eq!(connections.load(Ordering::SeqCst), 1);

    client.disconnect();
}

#[tokio::test]
async fn dropped_socket_reconnects_and_replays() {
    let (addr, connections) = spawn_server(true).await;
    let mut client = client_for(addr, true);
    let (tx, mut rx) = mpsc::unbounded_channel();

    client.subscribe("subscription { ping }", json!({}), move |payload| {
        let _ = tx.send(payload);
    });

    let first = next_payload(&mut client, &mut rx).await;
    assert_eq!(first["connection"], 1);

    let second = next_payload(&mut client, &mut rx).await;
    assert_eq!(second["connection"], 2);
    assert_eq!(second["query"], "subscription { ping }");
    assert_eq!(connections.load(Ordering::SeqCst), 2);
    assert_eq!(client.subscription_count(), 1);

    client.disconnect();
}
