//! Axum-based RPC server.

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use prometheus::{Histogram, IntCounter, Registry};
use tower_http::cors::CorsLayer;
use tracing::info;

use crest_registry::BadgeRegistry;
use crest_store::DynBadgeStore;

use crate::error::RpcError;
use crate::handlers;

/// Counter handles the RPC layer drives directly.
///
/// The node clones these out of its own metrics registry. Mint and clone
/// totals are not here: those are driven by the registry event bridge.
#[derive(Clone)]
pub struct RpcMetrics {
    pub requests_total: IntCounter,
    pub transfers_total: IntCounter,
    pub clone_rejections_total: IntCounter,
    /// Latency of successful mutations, in milliseconds.
    pub op_duration_ms: Histogram,
}

/// Shared state handed to every handler.
pub struct RpcState {
    pub registry: Arc<BadgeRegistry<DynBadgeStore>>,
    /// Source for the `/metrics` exposition endpoint; `None` disables it.
    pub metrics_registry: Option<Registry>,
    pub metrics: Option<RpcMetrics>,
    pub started_at: Instant,
}

impl RpcState {
    /// State with metrics disabled; the node fills in the metrics fields.
    pub fn new(registry: Arc<BadgeRegistry<DynBadgeStore>>) -> Self {
        Self {
            registry,
            metrics_registry: None,
            metrics: None,
            started_at: Instant::now(),
        }
    }

    pub(crate) fn count_request(&self) {
        if let Some(m) = &self.metrics {
            m.requests_total.inc();
        }
    }

    pub(crate) fn count_transfer(&self) {
        if let Some(m) = &self.metrics {
            m.transfers_total.inc();
        }
    }

    pub(crate) fn count_clone_rejection(&self) {
        if let Some(m) = &self.metrics {
            m.clone_rejections_total.inc();
        }
    }

    pub(crate) fn observe_op_duration(&self, elapsed: std::time::Duration) {
        if let Some(m) = &self.metrics {
            m.op_duration_ms.observe(elapsed.as_secs_f64() * 1000.0);
        }
    }
}

pub struct RpcServer {
    listen_addr: String,
    port: u16,
    state: Arc<RpcState>,
}

impl RpcServer {
    pub fn with_state(listen_addr: impl Into<String>, port: u16, state: Arc<RpcState>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            port,
            state,
        }
    }

    /// Router serving every registry endpoint.
    pub fn router(state: Arc<RpcState>) -> Router {
        Router::new()
            .route(
                "/v1/badges",
                post(handlers::mint).get(handlers::list_badges),
            )
            .route("/v1/badges/latest", get(handlers::latest_badge_id))
            .route("/v1/badges/:id", get(handlers::get_badge))
            .route("/v1/badges/:id/owner", get(handlers::owner_of))
            .route("/v1/badges/:id/uri", get(handlers::token_uri))
            .route("/v1/badges/:id/clones", post(handlers::clone_badge))
            .route("/v1/badges/:id/transfer", post(handlers::transfer))
            .route("/v1/status", get(handlers::status))
            .route("/health", get(handlers::health))
            .route("/metrics", get(handlers::metrics))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Start serving requests. This runs until the server is shut down.
    pub async fn start(&self) -> Result<(), RpcError> {
        let app = Self::router(Arc::clone(&self.state));
        let addr = format!("{}:{}", self.listen_addr, self.port);
        info!("RPC server listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {addr}: {e}")))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use crest_store_memory::MemoryStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> Arc<RpcState> {
        let store: DynBadgeStore = Box::new(MemoryStore::new());
        Arc::new(RpcState::new(Arc::new(BadgeRegistry::new(store))))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn mint_one(app: &Router, owner: &str, quota: i64, uri: &str) -> u64 {
        let (status, body) = send(
            app,
            post_json(
                "/v1/badges",
                json!({ "owner": owner, "clone_quota": quota, "metadata_uri": uri }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["badge_id"].as_u64().unwrap()
    }

    #[tokio::test]
    async fn mint_and_read_back() {
        let app = RpcServer::router(test_state());
        let id = mint_one(&app, "holder_a", 100, "http://sticlalux.ro/bedge.json").await;
        assert_eq!(id, 1);

        let (status, body) = send(&app, get("/v1/badges/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["badge_id"], 1);
        assert_eq!(body["owner"], "holder_a");
        assert_eq!(body["metadata_uri"], "http://sticlalux.ro/bedge.json");
        assert_eq!(body["clone_quota"], 100);
        assert_eq!(body["clones_issued"], 0);
        assert!(body.get("origin_id").is_none());
    }

    #[tokio::test]
    async fn mint_rejects_negative_quota() {
        let app = RpcServer::router(test_state());
        let (status, body) = send(
            &app,
            post_json(
                "/v1/badges",
                json!({ "owner": "holder_a", "clone_quota": -5, "metadata_uri": "" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn mint_rejects_empty_owner() {
        let app = RpcServer::router(test_state());
        let (status, body) = send(
            &app,
            post_json(
                "/v1/badges",
                json!({ "owner": "", "clone_quota": 1, "metadata_uri": "" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn clone_draws_down_origin_quota() {
        let app = RpcServer::router(test_state());
        mint_one(&app, "holder_a", 100, "http://sticlalux.ro/bedge.json").await;

        let (status, body) = send(
            &app,
            post_json(
                "/v1/badges/1/clones",
                json!({ "requester": "holder_a", "requested_clones": 50 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["badge_id"], 2);
        assert_eq!(body["origin_id"], 1);
        assert_eq!(body["owner"], "holder_a");
        assert_eq!(body["metadata_uri"], "http://sticlalux.ro/bedge.json");

        // One draw consumed, regardless of the clones requested.
        let (_, origin) = send(&app, get("/v1/badges/1")).await;
        assert_eq!(origin["clones_issued"], 1);
        let (_, clone) = send(&app, get("/v1/badges/2")).await;
        assert_eq!(clone["clone_quota"], 50);
        assert_eq!(clone["clones_issued"], 0);
        assert_eq!(clone["origin_id"], 1);
    }

    #[tokio::test]
    async fn clone_by_non_owner_is_forbidden() {
        let app = RpcServer::router(test_state());
        mint_one(&app, "holder_a", 100, "").await;

        let (status, body) = send(
            &app,
            post_json(
                "/v1/badges/1/clones",
                json!({ "requester": "holder_b", "requested_clones": 1 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "unauthorized");

        let (_, origin) = send(&app, get("/v1/badges/1")).await;
        assert_eq!(origin["clones_issued"], 0);
    }

    #[tokio::test]
    async fn clone_conflicts_when_quota_exhausted() {
        let app = RpcServer::router(test_state());
        mint_one(&app, "holder_a", 0, "").await;

        let (status, body) = send(
            &app,
            post_json(
                "/v1/badges/1/clones",
                json!({ "requester": "holder_a", "requested_clones": 10 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "quota_exceeded");
    }

    #[tokio::test]
    async fn unknown_badge_returns_not_found() {
        let app = RpcServer::router(test_state());

        let (status, body) = send(&app, get("/v1/badges/99")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = send(
            &app,
            post_json(
                "/v1/badges/99/clones",
                json!({ "requester": "holder_a", "requested_clones": 1 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transfer_moves_ownership() {
        let app = RpcServer::router(test_state());
        mint_one(&app, "holder_a", 100, "").await;

        let (status, body) = send(
            &app,
            post_json(
                "/v1/badges/1/transfer",
                json!({ "from": "holder_a", "to": "holder_b" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner"], "holder_b");

        let (status, body) = send(&app, get("/v1/badges/1/owner")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner"], "holder_b");
    }

    #[tokio::test]
    async fn transfer_with_wrong_sender_is_forbidden() {
        let app = RpcServer::router(test_state());
        mint_one(&app, "holder_a", 100, "").await;

        let (status, _) = send(
            &app,
            post_json(
                "/v1/badges/1/transfer",
                json!({ "from": "holder_b", "to": "holder_b" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, body) = send(&app, get("/v1/badges/1/owner")).await;
        assert_eq!(body["owner"], "holder_a");
    }

    #[tokio::test]
    async fn latest_badge_id_tracks_mints() {
        let app = RpcServer::router(test_state());

        let (status, body) = send(&app, get("/v1/badges/latest")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["latest_badge_id"], 0);

        mint_one(&app, "holder_a", 1, "").await;
        mint_one(&app, "holder_a", 2, "").await;
        let (_, body) = send(&app, get("/v1/badges/latest")).await;
        assert_eq!(body["latest_badge_id"], 2);
    }

    #[tokio::test]
    async fn token_uri_is_served() {
        let app = RpcServer::router(test_state());
        mint_one(&app, "holder_a", 1, "http://sticlalux.ro/bedge.json").await;

        let (status, body) = send(&app, get("/v1/badges/1/uri")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata_uri"], "http://sticlalux.ro/bedge.json");
    }

    #[tokio::test]
    async fn list_badges_pages_with_cursor() {
        let app = RpcServer::router(test_state());
        for i in 1..=3 {
            mint_one(&app, "holder_a", i, "").await;
        }

        let (status, body) = send(&app, get("/v1/badges?count=2")).await;
        assert_eq!(status, StatusCode::OK);
        let badges = body["badges"].as_array().unwrap();
        assert_eq!(badges.len(), 2);
        assert_eq!(badges[0]["badge_id"], 1);
        assert_eq!(badges[1]["badge_id"], 2);
        let cursor = body["pagination"]["cursor"].as_str().unwrap().to_owned();

        let (_, body) = send(&app, get(&format!("/v1/badges?count=2&cursor={cursor}"))).await;
        let badges = body["badges"].as_array().unwrap();
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0]["badge_id"], 3);
        assert!(body["pagination"].get("cursor").is_none());
    }

    #[tokio::test]
    async fn status_reports_counts() {
        let app = RpcServer::router(test_state());
        mint_one(&app, "holder_a", 1, "").await;
        mint_one(&app, "holder_b", 1, "").await;

        let (status, body) = send(&app, get("/v1/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["badge_count"], 2);
        assert_eq!(body["latest_badge_id"], 2);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn health_responds_ok() {
        let app = RpcServer::router(test_state());
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn metrics_require_enablement() {
        let app = RpcServer::router(test_state());
        let response = app.oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_exposition_reflects_registered_counters() {
        let registry = Registry::new();
        let counter = IntCounter::new("crest_probe_total", "probe counter").unwrap();
        registry.register(Box::new(counter.clone())).unwrap();
        counter.inc();

        let store: DynBadgeStore = Box::new(MemoryStore::new());
        let state = Arc::new(RpcState {
            metrics_registry: Some(registry),
            ..RpcState::new(Arc::new(BadgeRegistry::new(store)))
        });
        let app = RpcServer::router(state);

        let response = app.oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("crest_probe_total 1"), "{text}");
    }

    #[tokio::test]
    async fn rpc_layer_drives_its_counters() {
        let metrics = RpcMetrics {
            requests_total: IntCounter::new("requests_total", "requests").unwrap(),
            transfers_total: IntCounter::new("transfers_total", "transfers").unwrap(),
            clone_rejections_total: IntCounter::new("clone_rejections_total", "rejections")
                .unwrap(),
            op_duration_ms: Histogram::with_opts(prometheus::HistogramOpts::new(
                "op_duration_ms",
                "op duration",
            ))
            .unwrap(),
        };
        let store: DynBadgeStore = Box::new(MemoryStore::new());
        let state = Arc::new(RpcState {
            metrics: Some(metrics.clone()),
            ..RpcState::new(Arc::new(BadgeRegistry::new(store)))
        });
        let app = RpcServer::router(state);

        mint_one(&app, "holder_a", 0, "").await;
        let (status, _) = send(
            &app,
            post_json(
                "/v1/badges/1/clones",
                json!({ "requester": "holder_a", "requested_clones": 1 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = send(
            &app,
            post_json(
                "/v1/badges/1/transfer",
                json!({ "from": "holder_a", "to": "holder_b" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(metrics.requests_total.get(), 3);
        assert_eq!(metrics.clone_rejections_total.get(), 1);
        assert_eq!(metrics.transfers_total.get(), 1);
        // Mint and transfer succeeded; the rejected clone is not timed.
        assert_eq!(metrics.op_duration_ms.get_sample_count(), 2);
    }
}
