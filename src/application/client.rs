//! The subscription client: connection state machine plus subscription
//! bookkeeping.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──connect()──▶ Connecting ──Opened──▶ send connection_init
//!      ▲                          │
//!      │                    connection_ack
//!      │                          ▼
//!      └────────Closed─────── Connected ──▶ drain outbound queue (FIFO)
//! ```
//!
//! Whenever a transport goes away, closed by the peer or by `disconnect()`,
//! a `start` for every registered subscription is queued so the next
//! handshake re-establishes it. With `reconnect` enabled, a peer close also
//! runs `connect()` again.
//!
//! Every change of `Link` is checked against [`ConnectionState`]'s
//! transition table first.
//!
//! # Event loop
//!
//! Transports report through a channel owned by the client. Nothing happens
//! until the caller pumps it with [`SubscriptionClient::next_event`] or
//! [`SubscriptionClient::process_pending`]; events are handled one at a time
//! in the order the transport emitted them.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::ClientConfig;
use crate::domain::foundation::{ConnectionId, ConnectionState, StateMachine, SubscriptionId};
use crate::domain::protocol::{encode, ClientMessage};
use crate::domain::subscription::{OutboundQueue, Subscription, SubscriptionRegistry};
use crate::ports::{
    CloseReason, ConnectRequest, EventSink, Transport, TransportConnector, TransportError,
    TransportEvent, TransportEventKind, TransportEventReceiver, TransportEventSender,
};

use super::dispatcher::{dispatch, Dispatch};
use super::error::ClientError;

/// The live transport, carried inside the state it belongs to.
enum Link {
    Disconnected,
    Connecting {
        connection_id: ConnectionId,
        transport: Box<dyn Transport>,
    },
    Connected {
        connection_id: ConnectionId,
        transport: Box<dyn Transport>,
    },
}

impl Link {
    fn state(&self) -> ConnectionState {
        match self {
            Link::Disconnected => ConnectionState::Disconnected,
            Link::Connecting { .. } => ConnectionState::Connecting,
            Link::Connected { .. } => ConnectionState::Connected,
        }
    }

    fn connection_id(&self) -> Option<ConnectionId> {
        match self {
            Link::Disconnected => None,
            Link::Connecting { connection_id, .. } | Link::Connected { connection_id, .. } => {
                Some(*connection_id)
            }
        }
    }

    fn transport(&mut self) -> Option<&mut Box<dyn Transport>> {
        match self {
            Link::Disconnected => None,
            Link::Connecting { transport, .. } | Link::Connected { transport, .. } => {
                Some(transport)
            }
        }
    }
}

/// Client for a reconnecting `graphql-ws` subscription connection.
///
/// # Example
///
/// ```no_run
/// use gql_subscriber::adapters::WebSocketConnector;
/// use gql_subscriber::application::SubscriptionClient;
/// use gql_subscriber::config::{BackoffConfig, ClientConfig};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::new("wss://api.example.com/graphql").reconnect(true);
/// let connector = WebSocketConnector::new(BackoffConfig::default())?;
/// let mut client = SubscriptionClient::new(config, connector)?;
///
/// let id = client.subscribe("subscription { ticks }", json!({}), |payload| {
///     println!("tick: {}", payload);
/// });
///
/// loop {
///     client.next_event().await?;
/// }
/// # }
/// ```
pub struct SubscriptionClient<C> {
    config: ClientConfig,
    connector: C,
    link: Link,
    registry: SubscriptionRegistry,
    outbound: OutboundQueue,
    /// Consecutive reconnects without an acknowledged handshake.
    reconnect_attempt: u32,
    events_tx: TransportEventSender,
    events_rx: TransportEventReceiver,
}

impl<C: TransportConnector> SubscriptionClient<C> {
    /// Creates a client. Connects immediately unless `config.lazy` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for an invalid configuration and
    /// [`ClientError::Transport`] if an eager connection cannot be opened.
    pub fn new(config: ClientConfig, connector: C) -> Result<Self, ClientError> {
        config.validate()?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut client = Self {
            config,
            connector,
            link: Link::Disconnected,
            registry: SubscriptionRegistry::new(),
            outbound: OutboundQueue::new(),
            reconnect_attempt: 0,
            events_tx,
            events_rx,
        };

        if !client.config.lazy {
            client.connect()?;
        }

        Ok(client)
    }

    pub fn state(&self) -> ConnectionState {
        self.link.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Id of the live transport handle, if any.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.link.connection_id()
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.registry.ids()
    }

    /// Number of messages waiting for the next handshake.
    pub fn pending_messages(&self) -> usize {
        self.outbound.len()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens a new transport unless one is already connecting or connected.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the connector refuses the
    /// attempt outright; the client stays disconnected.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        let state = self.state();
        if state.has_transport() {
            return Ok(());
        }
        state.transition_to(ConnectionState::Connecting)?;

        let connection_id = ConnectionId::new();
        let request = ConnectRequest {
            connection_id,
            url: self.config.url.clone(),
            protocol: self.config.protocol.clone(),
            attempt: self.reconnect_attempt,
        };
        let sink = EventSink::new(connection_id, self.events_tx.clone());

        let transport = self.connector.open(request, sink).map_err(|e| {
            tracing::warn!(
                %connection_id,
                url = %self.config.url,
                "Failed to open transport: {}",
                e
            );
            e
        })?;

        tracing::info!(
            %connection_id,
            url = %self.config.url,
            attempt = self.reconnect_attempt,
            "Connecting"
        );
        self.link = Link::Connecting {
            connection_id,
            transport,
        };
        Ok(())
    }

    /// Closes the live transport without reconnecting.
    ///
    /// Subscriptions stay registered and are started again after the next
    /// handshake; other queued messages stay queued. No-op when already
    /// disconnected.
    pub fn disconnect(&mut self) {
        self.reconnect_attempt = 0;
        if self
            .state()
            .transition_to(ConnectionState::Disconnected)
            .is_err()
        {
            return;
        }

        let previous = std::mem::replace(&mut self.link, Link::Disconnected);
        if let Some(connection_id) = previous.connection_id() {
            tracing::info!(%connection_id, "Disconnecting");
        }
        if let Link::Connecting { mut transport, .. } | Link::Connected { mut transport, .. } =
            previous
        {
            transport.close();
        }
        self.requeue_subscriptions();
    }

    /// Registers a subscription and returns its id.
    ///
    /// The `start` message is sent immediately when connected, otherwise it
    /// is queued and a connection is started if none is in progress.
    pub fn subscribe<F>(
        &mut self,
        query: impl Into<String>,
        variables: Value,
        callback: F,
    ) -> SubscriptionId
    where
        F: FnMut(Value) + Send + 'static,
    {
        let id = self.registry.next_id();
        let subscription = Subscription::new(id, query, variables, Box::new(callback));
        let start = subscription.start_message();
        self.registry.add(subscription);
        tracing::debug!(subscription_id = %id, state = %self.state(), "Subscribed");

        if self.is_connected() {
            self.send_logged(&start);
        } else {
            self.outbound.enqueue(start);
            if !self.state().has_transport() {
                if let Err(e) = self.connect() {
                    tracing::warn!(subscription_id = %id, "Start queued, connect failed: {}", e);
                }
            }
        }

        id
    }

    /// Removes a subscription.
    ///
    /// If its `start` has not left the queue yet it is withdrawn and the
    /// server is told nothing. Otherwise a `stop` is sent when connected;
    /// without a connection the `stop` is skipped. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        if self.registry.remove(id).is_none() {
            tracing::debug!(subscription_id = %id, "Unsubscribe for unknown subscription");
            return;
        }

        if self.outbound.remove_start(id) {
            tracing::debug!(subscription_id = %id, "Withdrew queued start");
            return;
        }

        if self.is_connected() {
            self.send_logged(&ClientMessage::stop(id));
        } else {
            tracing::debug!(
                subscription_id = %id,
                state = %self.state(),
                "Not connected, skipping stop"
            );
        }
    }

    /// Waits for the next transport event and handles it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] for an inbound frame that cannot be
    /// decoded. The client remains usable.
    pub async fn next_event(&mut self) -> Result<(), ClientError> {
        // The client holds a sender, so the channel never closes.
        let Some(event) = self.events_rx.recv().await else {
            return Ok(());
        };
        self.handle_event(event)
    }

    /// Handles every event already waiting, without blocking.
    ///
    /// Returns the number of events handled. Stops at the first event that
    /// yields an error, after handling it.
    pub fn process_pending(&mut self) -> Result<usize, ClientError> {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            handled += 1;
            self.handle_event(event)?;
        }
        Ok(handled)
    }

    /// Handles one transport event. Events from replaced transports are
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] for an undecodable frame and
    /// [`ClientError::Transition`] for a `connection_ack` on an already
    /// connected transport. Client state is unchanged in both cases.
    pub fn handle_event(&mut self, event: TransportEvent) -> Result<(), ClientError> {
        let TransportEvent {
            connection_id,
            kind,
        } = event;

        if self.link.connection_id() != Some(connection_id) {
            tracing::trace!(%connection_id, "Discarding event from stale transport");
            return Ok(());
        }

        match kind {
            TransportEventKind::Opened => {
                self.on_open(connection_id);
                Ok(())
            }
            TransportEventKind::Message(frame) => self.on_message(connection_id, &frame),
            TransportEventKind::Closed(reason) => self.on_close(connection_id, reason),
        }
    }

    fn on_open(&mut self, connection_id: ConnectionId) {
        tracing::debug!(%connection_id, "Transport open, sending connection_init");
        let init = ClientMessage::connection_init(self.config.init_payload.clone());
        self.send_logged(&init);
    }

    fn on_message(&mut self, connection_id: ConnectionId, frame: &str) -> Result<(), ClientError> {
        match dispatch(frame, &mut self.registry) {
            Ok(Dispatch::Acknowledged) => self.on_ack(connection_id),
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(%connection_id, "Discarding inbound frame: {}", e);
                Err(e.into())
            }
        }
    }

    fn on_ack(&mut self, connection_id: ConnectionId) -> Result<(), ClientError> {
        if let Err(e) = self.state().transition_to(ConnectionState::Connected) {
            tracing::warn!(%connection_id, "Unexpected connection_ack: {}", e);
            return Err(e.into());
        }

        let previous = std::mem::replace(&mut self.link, Link::Disconnected);
        self.link = match previous {
            Link::Connecting {
                connection_id,
                transport,
            } => Link::Connected {
                connection_id,
                transport,
            },
            other => other,
        };
        self.reconnect_attempt = 0;

        let pending = self.outbound.drain_in_order();
        tracing::info!(%connection_id, flushed = pending.len(), "Connected");
        for message in &pending {
            self.send_logged(message);
        }
        Ok(())
    }

    fn on_close(
        &mut self,
        connection_id: ConnectionId,
        reason: CloseReason,
    ) -> Result<(), ClientError> {
        self.state().transition_to(ConnectionState::Disconnected)?;
        self.link = Link::Disconnected;
        self.requeue_subscriptions();

        if !self.config.reconnect {
            tracing::warn!(%connection_id, %reason, "Connection closed");
            return Ok(());
        }

        self.reconnect_attempt = self.reconnect_attempt.saturating_add(1);
        tracing::warn!(
            %connection_id,
            %reason,
            attempt = self.reconnect_attempt,
            subscriptions = self.registry.len(),
            "Connection closed, reconnecting"
        );

        if let Err(e) = self.connect() {
            tracing::error!("Reconnect failed: {}", e);
        }
        Ok(())
    }

    /// Queues a `start` for every registered subscription, in registration
    /// order.
    fn requeue_subscriptions(&mut self) {
        for subscription in self.registry.all() {
            // A start still queued from before would otherwise go out twice.
            self.outbound.remove_start(subscription.id());
            self.outbound.enqueue(subscription.start_message());
        }
    }

    /// Sends over the live transport, logging instead of failing.
    fn send_logged(&mut self, message: &ClientMessage) {
        if let Err(e) = self.send(message) {
            tracing::warn!(
                kind = message.kind(),
                subscription_id = ?message.subscription_id(),
                "Send failed: {}",
                e
            );
        }
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        let frame = encode(message)?;
        let transport = self.link.transport().ok_or(TransportError::Closed)?;
        transport.send(frame)?;
        tracing::trace!(kind = message.kind(), "Sent");
        Ok(())
    }
}

impl<C> std::fmt::Debug for SubscriptionClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionClient")
            .field("url", &self.config.url)
            .field("state", &self.link.state())
            .field("subscriptions", &self.registry.len())
            .field("pending", &self.outbound.len())
            .finish()
    }
}
