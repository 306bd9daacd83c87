//! WebSocket event streaming.
//!
//! Serves `/ws` upgrades and streams registry topics (mints, clones, origin
//! updates) to subscribed clients. Each topic is a broadcast channel; each
//! active subscription gets its own forwarder task pumping that channel into
//! the client socket.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crest_types::{BadgeId, HolderAddress};

use crate::subscriptions::{ClientMessage, ClientSubscriptions, ServerMessage, SubscriptionTopic};

/// Shared state for the WebSocket server, holding broadcast channels for
/// each registry topic.
pub struct WsState {
    /// Broadcast channel for newly minted badges.
    pub minted_tx: broadcast::Sender<String>,
    /// Broadcast channel for newly drawn clones.
    pub cloned_tx: broadcast::Sender<String>,
    /// Broadcast channel for origin records whose issued count changed.
    pub origin_updated_tx: broadcast::Sender<String>,
    /// Connected-client gauge; `None` when metrics are disabled.
    pub clients_gauge: Option<prometheus::IntGauge>,
}

impl WsState {
    /// State with one broadcast channel of `channel_capacity` per topic.
    pub fn new(channel_capacity: usize) -> Self {
        let (minted_tx, _) = broadcast::channel(channel_capacity);
        let (cloned_tx, _) = broadcast::channel(channel_capacity);
        let (origin_updated_tx, _) = broadcast::channel(channel_capacity);

        Self {
            minted_tx,
            cloned_tx,
            origin_updated_tx,
            clients_gauge: None,
        }
    }

    /// Attach a gauge tracking the number of connected clients.
    pub fn with_client_gauge(mut self, gauge: prometheus::IntGauge) -> Self {
        self.clients_gauge = Some(gauge);
        self
    }

    /// The broadcast sender carrying a topic's events.
    pub fn sender_for(&self, topic: &SubscriptionTopic) -> &broadcast::Sender<String> {
        match topic {
            SubscriptionTopic::Minted => &self.minted_tx,
            SubscriptionTopic::Cloned => &self.cloned_tx,
            SubscriptionTopic::OriginUpdated => &self.origin_updated_tx,
        }
    }

    /// Publish a mint event.
    pub fn publish_minted(
        &self,
        badge_id: BadgeId,
        clone_quota: u64,
        clones_issued: u64,
        metadata_uri: &str,
        owner: &HolderAddress,
    ) {
        let event = serde_json::json!({
            "topic": "minted",
            "data": {
                "badge_id": badge_id.as_u64(),
                "clone_quota": clone_quota,
                "clones_issued": clones_issued,
                "metadata_uri": metadata_uri,
                "owner": owner.as_str(),
            },
            "timestamp": unix_timestamp_secs(),
        });
        let _ = self.minted_tx.send(event.to_string());
    }

    /// Publish a clone event.
    pub fn publish_cloned(
        &self,
        badge_id: BadgeId,
        origin_id: BadgeId,
        metadata_uri: &str,
        owner: &HolderAddress,
    ) {
        let event = serde_json::json!({
            "topic": "cloned",
            "data": {
                "badge_id": badge_id.as_u64(),
                "origin_id": origin_id.as_u64(),
                "metadata_uri": metadata_uri,
                "owner": owner.as_str(),
            },
            "timestamp": unix_timestamp_secs(),
        });
        let _ = self.cloned_tx.send(event.to_string());
    }

    /// Publish an origin update event.
    pub fn publish_origin_updated(&self, origin_id: BadgeId, clones_issued: u64) {
        let event = serde_json::json!({
            "topic": "origin_updated",
            "data": {
                "origin_id": origin_id.as_u64(),
                "clones_issued": clones_issued,
            },
            "timestamp": unix_timestamp_secs(),
        });
        let _ = self.origin_updated_tx.send(event.to_string());
    }
}

/// The WebSocket server, configured with a bind address and shared state.
pub struct WebSocketServer {
    pub listen_addr: String,
    pub port: u16,
    pub state: Arc<WsState>,
}

impl WebSocketServer {
    /// Server with its own state and the default per-topic capacity of 256.
    pub fn new(listen_addr: impl Into<String>, port: u16) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            port,
            state: Arc::new(WsState::new(256)),
        }
    }

    /// Server over externally owned state, so the node can publish into
    /// the same channels the server drains.
    pub fn with_state(listen_addr: impl Into<String>, port: u16, state: Arc<WsState>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            port,
            state,
        }
    }

    /// Router serving the `/ws` upgrade endpoint.
    pub fn router(state: Arc<WsState>) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .with_state(state)
    }

    /// Bind and serve upgrades until the task is cancelled.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let app = Self::router(self.state.clone());

        let addr = format!("{}:{}", self.listen_addr, self.port);
        info!("serving websocket upgrades on {addr}");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Upgrade handler for `GET /ws`.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| client_loop(socket, state))
}

/// Write half of a client socket, shared between the control loop and the
/// per-topic forwarder tasks.
type SharedSink = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Per-connection bookkeeping: the active topics and the forwarder task
/// feeding each one.
struct ClientSession {
    state: Arc<WsState>,
    sink: SharedSink,
    subscriptions: ClientSubscriptions,
    forwarders: HashMap<SubscriptionTopic, JoinHandle<()>>,
}

impl ClientSession {
    fn new(state: Arc<WsState>, sink: SharedSink) -> Self {
        Self {
            state,
            sink,
            subscriptions: ClientSubscriptions::new(),
            forwarders: HashMap::new(),
        }
    }

    /// Dispatch one parsed control message.
    async fn handle(&mut self, msg: ClientMessage) {
        match msg {
            ClientMessage::Subscribe { topic } => self.subscribe(topic).await,
            ClientMessage::Unsubscribe { topic } => self.unsubscribe(topic).await,
            ClientMessage::Ping => self.reply(&ServerMessage::Pong).await,
        }
    }

    async fn subscribe(&mut self, topic: SubscriptionTopic) {
        // Re-subscribing replaces the previous forwarder.
        if let Some(old) = self.forwarders.remove(&topic) {
            old.abort();
        }
        self.subscriptions.subscribe(topic);

        let rx = self.state.sender_for(&topic).subscribe();
        let sink = Arc::clone(&self.sink);
        self.forwarders
            .insert(topic, tokio::spawn(forward_topic(rx, sink, topic)));

        self.reply(&ServerMessage::Ack {
            action: "subscribe".to_string(),
            topic,
        })
        .await;
        debug!("client subscribed to {topic}");
    }

    async fn unsubscribe(&mut self, topic: SubscriptionTopic) {
        let was_subscribed = self.subscriptions.unsubscribe(&topic);
        if let Some(forwarder) = self.forwarders.remove(&topic) {
            forwarder.abort();
        }

        if was_subscribed {
            self.reply(&ServerMessage::Ack {
                action: "unsubscribe".to_string(),
                topic,
            })
            .await;
            debug!("client left topic {topic}");
        } else {
            self.reply(&ServerMessage::Error {
                message: format!("no active subscription for {topic}"),
            })
            .await;
        }
    }

    /// Serialize and send one control reply. Send failures are ignored
    /// here; the receive side of the loop sees the closed socket.
    async fn reply(&self, msg: &ServerMessage) {
        let text = serde_json::to_string(msg).unwrap();
        let _ = self.sink.lock().await.send(Message::Text(text)).await;
    }

    fn teardown(&mut self) {
        for (topic, forwarder) in self.forwarders.drain() {
            debug!("dropping forwarder for {topic}");
            forwarder.abort();
        }
    }
}

/// Run one client connection to completion.
async fn client_loop(socket: WebSocket, state: Arc<WsState>) {
    let (sink, mut stream) = socket.split();
    let mut session = ClientSession::new(Arc::clone(&state), Arc::new(Mutex::new(sink)));

    debug!("websocket client connected");
    if let Some(gauge) = &state.clients_gauge {
        gauge.inc();
    }

    while let Some(received) = stream.next().await {
        let frame = match received {
            Ok(frame) => frame,
            Err(e) => {
                warn!("websocket receive failed: {e}");
                break;
            }
        };

        match frame {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => session.handle(msg).await,
                Err(e) => {
                    session
                        .reply(&ServerMessage::Error {
                            message: format!("unreadable message: {e}"),
                        })
                        .await;
                }
            },
            Message::Ping(payload) => {
                let _ = session.sink.lock().await.send(Message::Pong(payload)).await;
            }
            Message::Close(_) => {
                debug!("client closed the connection");
                break;
            }
            _ => {}
        }
    }

    session.teardown();
    if let Some(gauge) = &state.clients_gauge {
        gauge.dec();
    }
    debug!("websocket session ended");
}

/// Pump one topic's broadcast channel into the client sink until either
/// side goes away. Lag drops the missed events and keeps streaming.
async fn forward_topic(
    mut rx: broadcast::Receiver<String>,
    sink: SharedSink,
    topic: SubscriptionTopic,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if sink.lock().await.send(Message::Text(event)).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("client lagging on {topic}, dropped {n} events");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("topic {topic} closed, stopping forwarder");
                break;
            }
        }
    }
}

/// Seconds since the UNIX epoch, for event envelopes.
fn unix_timestamp_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
