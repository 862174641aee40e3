//! Native WebSocket connector.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::Message;

use crate::config::BackoffConfig;
use crate::ports::{
    CloseReason, ConnectRequest, EventSink, Transport, TransportConnector, TransportError,
};

/// Opens one WebSocket per connection attempt on a tokio runtime.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    runtime: Handle,
    backoff: BackoffConfig,
}

impl WebSocketConnector {
    /// Creates a connector bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when called outside a runtime.
    pub fn new(backoff: BackoffConfig) -> Result<Self, TransportError> {
        let runtime = Handle::try_current()
            .map_err(|e| TransportError::Io(format!("no tokio runtime: {}", e)))?;
        Ok(Self::with_handle(runtime, backoff))
    }

    /// Creates a connector that spawns its socket tasks on `runtime`.
    pub fn with_handle(runtime: Handle, backoff: BackoffConfig) -> Self {
        Self { runtime, backoff }
    }
}

impl TransportConnector for WebSocketConnector {
    fn open(
        &self,
        request: ConnectRequest,
        events: EventSink,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let handshake = build_request(&request)?;
        let delay = self.backoff.delay_for_attempt(request.attempt);
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();

        let task = self
            .runtime
            .spawn(run_socket(handshake, delay, outgoing_rx, events));

        Ok(Box::new(WebSocketTransport {
            outgoing: Some(outgoing_tx),
            task,
        }))
    }
}

/// Client-side handle of one WebSocket.
///
/// Dropping or closing the handle ends the socket task, which sends a
/// close frame if the socket was open.
#[derive(Debug)]
pub struct WebSocketTransport {
    outgoing: Option<mpsc::UnboundedSender<String>>,
    task: JoinHandle<()>,
}

impl WebSocketTransport {
    /// True once the socket task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Transport for WebSocketTransport {
    fn send(&mut self, frame: String) -> Result<(), TransportError> {
        let outgoing = self.outgoing.as_ref().ok_or(TransportError::Closed)?;
        outgoing.send(frame).map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        self.outgoing = None;
    }
}

/// Builds the upgrade request, advertising the subprotocol.
fn build_request(request: &ConnectRequest) -> Result<Request, TransportError> {
    let invalid = |reason: String| TransportError::InvalidUrl {
        url: request.url.clone(),
        reason,
    };

    let mut handshake = request
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| invalid(e.to_string()))?;

    let protocol = http::HeaderValue::from_str(&request.protocol)
        .map_err(|e| invalid(format!("bad subprotocol: {}", e)))?;
    handshake
        .headers_mut()
        .insert(http::header::SEC_WEBSOCKET_PROTOCOL, protocol);

    Ok(handshake)
}

/// Owns one socket for its whole life and reports through `events`.
async fn run_socket(
    handshake: Request,
    delay: Duration,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    events: EventSink,
) {
    let connection_id = events.connection_id();

    let connect = async {
        if !delay.is_zero() {
            tracing::debug!(
                %connection_id,
                delay_ms = delay.as_millis() as u64,
                "Waiting before reconnect"
            );
            tokio::time::sleep(delay).await;
        }
        connect_async(handshake).await
    };
    tokio::pin!(connect);

    // Frames handed over before the socket opened are flushed right after.
    let mut early = Vec::new();
    let stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((stream, _response)) => break stream,
                Err(e) => {
                    tracing::warn!(%connection_id, "WebSocket connect failed: {}", e);
                    events.closed(CloseReason::ConnectFailed(e.to_string()));
                    return;
                }
            },
            frame = outgoing.recv() => match frame {
                Some(frame) => early.push(frame),
                None => {
                    tracing::debug!(%connection_id, "Handle dropped before open");
                    events.closed(CloseReason::Local);
                    return;
                }
            },
        }
    };

    tracing::debug!(%connection_id, "WebSocket open");
    events.opened();

    let (mut write, mut read) = stream.split();

    for frame in early {
        if let Err(e) = write.send(Message::Text(frame.into())).await {
            events.closed(CloseReason::Error(e.to_string()));
            return;
        }
    }

    let reason = loop {
        tokio::select! {
            frame = outgoing.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = write.send(Message::Text(frame.into())).await {
                        break CloseReason::Error(e.to_string());
                    }
                }
                None => {
                    let _ = write.send(Message::Close(None)).await;
                    break CloseReason::Local;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => events.message(text.as_str()),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => events.message(text),
                    Err(_) => tracing::warn!(%connection_id, "Dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    break CloseReason::Remote {
                        code: frame.as_ref().map(|f| u16::from(f.code)),
                        reason: frame.map(|f| f.reason.as_str().to_string()).unwrap_or_default(),
                    };
                }
                Some(Ok(_)) => {
                    // Ping/pong are answered by tungstenite
                }
                Some(Err(e)) => break CloseReason::Error(e.to_string()),
                None => {
                    break CloseReason::Remote {
                        code: None,
                        reason: "stream ended".to_string(),
                    };
                }
            },
        }
    };

    tracing::debug!(%connection_id, %reason, "WebSocket closed");
    events.closed(reason);
}
