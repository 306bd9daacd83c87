//! Node orchestration: wires the badge registry to storage, metrics, and
//! the RPC and WebSocket servers.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crest_registry::{BadgeRegistry, RegistryEvent};
use crest_rpc::{RpcMetrics, RpcServer, RpcState};
use crest_store::{DynBadgeStore, StoreError};
use crest_store_lmdb::LmdbStore;
use crest_store_memory::MemoryStore;
use crest_websocket::{WebSocketServer, WsState};

use crate::config::RegistryConfig;
use crate::error::NodeError;
use crate::metrics::NodeMetrics;
use crate::shutdown::ShutdownController;

/// Broadcast capacity for each WebSocket topic channel.
const WS_CHANNEL_CAPACITY: usize = 256;

/// How long to wait for spawned tasks to finish during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A running registry node.
///
/// Owns the single write boundary (the registry) and fans its events out to
/// Prometheus counters and WebSocket subscribers.
pub struct RegistryNode {
    pub config: RegistryConfig,
    pub registry: Arc<BadgeRegistry<DynBadgeStore>>,
    pub metrics: Arc<NodeMetrics>,
    pub shutdown: Arc<ShutdownController>,
    pub ws_state: Arc<WsState>,
    /// Handles for spawned server tasks (joined during shutdown).
    task_handles: Vec<JoinHandle<()>>,
}

impl RegistryNode {
    /// Create and initialize a new registry node.
    ///
    /// Opens the LMDB environment at `config.data_dir` (or an in-memory
    /// store when `config.ephemeral` is set) and wires the event bridge.
    /// Call [`RegistryNode::start`] to begin serving requests.
    pub fn new(config: RegistryConfig) -> Result<Self, NodeError> {
        let metrics = Arc::new(NodeMetrics::new());

        // Topic channels exist even when the WS server is off; publishes to
        // them are simply dropped.
        let ws_state = Arc::new(
            WsState::new(WS_CHANNEL_CAPACITY).with_client_gauge(metrics.ws_clients.clone()),
        );

        // Badge storage
        let store: DynBadgeStore = if config.ephemeral {
            Box::new(MemoryStore::new())
        } else {
            let map_size = config.map_size_mb as usize * 1024 * 1024;
            let store =
                LmdbStore::open(&config.data_dir, map_size).map_err(StoreError::from)?;
            Box::new(store)
        };

        // Registry with the event bridge attached. Listeners run inline on
        // the writing thread, inside the write lock, so the metrics and
        // WebSocket publishes observe events in commit order.
        let mut registry = BadgeRegistry::new(store);
        {
            let metrics = Arc::clone(&metrics);
            let ws = Arc::clone(&ws_state);
            registry.subscribe(move |event: &RegistryEvent| match event {
                RegistryEvent::BadgeMinted {
                    badge_id,
                    clone_quota,
                    clones_issued,
                    metadata_uri,
                    owner,
                } => {
                    metrics.badges_minted.inc();
                    metrics.badge_count.inc();
                    ws.publish_minted(*badge_id, *clone_quota, *clones_issued, metadata_uri, owner);
                }
                RegistryEvent::OriginalBadgeUpdated {
                    origin_id,
                    clones_issued,
                } => {
                    ws.publish_origin_updated(*origin_id, *clones_issued);
                }
                RegistryEvent::BadgeCloned {
                    badge_id,
                    origin_id,
                    metadata_uri,
                    owner,
                } => {
                    metrics.badges_cloned.inc();
                    metrics.badge_count.inc();
                    ws.publish_cloned(*badge_id, *origin_id, metadata_uri, owner);
                }
            });
        }

        Ok(Self {
            config,
            registry: Arc::new(registry),
            metrics,
            shutdown: Arc::new(ShutdownController::new()),
            ws_state,
            task_handles: Vec::new(),
        })
    }

    /// Start the node: spawn the enabled servers and block until an OS
    /// shutdown signal arrives.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        tracing::info!(
            data_dir = %self.config.data_dir.display(),
            ephemeral = self.config.ephemeral,
            "registry node starting"
        );

        self.refresh_metrics();

        // ── RPC surface ───────────────────────────────────────────────────
        if self.config.enable_rpc {
            let mut rpc_state = RpcState::new(Arc::clone(&self.registry));
            if self.config.enable_metrics {
                rpc_state.metrics_registry = Some(self.metrics.registry.clone());
                rpc_state.metrics = Some(RpcMetrics {
                    requests_total: self.metrics.rpc_requests.clone(),
                    transfers_total: self.metrics.transfers.clone(),
                    clone_rejections_total: self.metrics.clone_rejections.clone(),
                    op_duration_ms: self.metrics.op_duration_ms.clone(),
                });
            }

            let rpc_server = RpcServer::with_state(
                self.config.listen_addr.clone(),
                self.config.rpc_port,
                Arc::new(rpc_state),
            );
            let mut shutdown_rx_rpc = self.shutdown.subscribe();

            let rpc_handle = tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = shutdown_rx_rpc.recv() => {
                        tracing::info!("stopping RPC server");
                    }
                    result = rpc_server.start() => {
                        match result {
                            Ok(()) => tracing::info!("RPC server finished"),
                            Err(e) => tracing::error!("RPC server failed: {e}"),
                        }
                    }
                }
            });
            self.task_handles.push(rpc_handle);
        }

        // ── WebSocket surface ─────────────────────────────────────────────
        if self.config.enable_websocket {
            let ws_server = WebSocketServer::with_state(
                self.config.listen_addr.clone(),
                self.config.websocket_port,
                Arc::clone(&self.ws_state),
            );
            let mut shutdown_rx_ws = self.shutdown.subscribe();

            let ws_handle = tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = shutdown_rx_ws.recv() => {
                        tracing::info!("stopping WebSocket server");
                    }
                    result = ws_server.start() => {
                        match result {
                            Ok(()) => tracing::info!("WebSocket server finished"),
                            Err(e) => tracing::error!("WebSocket server failed: {e}"),
                        }
                    }
                }
            });
            self.task_handles.push(ws_handle);
        }

        tracing::info!("registry node started");

        self.shutdown.wait_for_signal().await;

        Ok(())
    }

    /// Stop the node: signal every server task, join them under a timeout,
    /// and take a last badge-count reading.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("registry node stopping");

        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };

        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all)
            .await
            .is_err()
        {
            tracing::warn!(
                "tasks still running after {:?}, abandoning them",
                SHUTDOWN_TIMEOUT
            );
        }

        self.refresh_metrics();

        tracing::info!("registry node stopped");
        Ok(())
    }

    /// Sync the badge-count gauge with the store.
    fn refresh_metrics(&self) {
        if let Ok(count) = self.registry.badge_count() {
            self.metrics.badge_count.set(count as i64);
        }
    }
}
