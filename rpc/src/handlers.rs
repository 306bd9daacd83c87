//! RPC request handlers and their wire DTOs.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};

use crest_registry::RegistryError;
use crest_types::{Badge, BadgeId, HolderAddress};
use crest_utils::format_duration;

use crate::error::RpcError;
use crate::pagination::{self, PaginationMeta, PaginationParams};
use crate::server::RpcState;

// ── Mint ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MintRequest {
    #[serde(default)]
    pub owner: String,
    /// Signed so a negative quota is rejected instead of wrapping.
    pub clone_quota: i64,
    #[serde(default)]
    pub metadata_uri: String,
}

#[derive(Serialize)]
pub struct MintResponse {
    pub badge_id: u64,
    pub owner: String,
    pub clone_quota: u64,
    pub metadata_uri: String,
}

/// `POST /v1/badges`: mint a new original badge.
pub async fn mint(
    State(state): State<Arc<RpcState>>,
    Json(req): Json<MintRequest>,
) -> Result<(StatusCode, Json<MintResponse>), RpcError> {
    state.count_request();
    let clone_quota = non_negative_quota(req.clone_quota)?;
    let owner = HolderAddress::new(req.owner);
    let started = Instant::now();
    let badge_id = state
        .registry
        .mint(owner.clone(), clone_quota, req.metadata_uri.clone())?;
    state.observe_op_duration(started.elapsed());
    Ok((
        StatusCode::CREATED,
        Json(MintResponse {
            badge_id: badge_id.as_u64(),
            owner: owner.as_str().to_owned(),
            clone_quota,
            metadata_uri: req.metadata_uri,
        }),
    ))
}

// ── Clone ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CloneRequest {
    #[serde(default)]
    pub requester: String,
    /// Quota granted to the new clone; signed so negatives are rejected.
    pub requested_clones: i64,
}

#[derive(Serialize)]
pub struct CloneResponse {
    pub badge_id: u64,
    pub origin_id: u64,
    pub owner: String,
    pub metadata_uri: String,
}

/// `POST /v1/badges/{id}/clones`: draw a clone against the origin's quota.
pub async fn clone_badge(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<u64>,
    Json(req): Json<CloneRequest>,
) -> Result<(StatusCode, Json<CloneResponse>), RpcError> {
    state.count_request();
    let requested_clones = non_negative_quota(req.requested_clones)?;
    let requester = HolderAddress::new(req.requester);
    let origin_id = BadgeId::new(id);

    let started = Instant::now();
    let clone_id = match state
        .registry
        .clone_badge(&requester, origin_id, requested_clones)
    {
        Ok(clone_id) => {
            state.observe_op_duration(started.elapsed());
            clone_id
        }
        Err(e) => {
            if matches!(
                e,
                RegistryError::Unauthorized { .. } | RegistryError::QuotaExceeded { .. }
            ) {
                state.count_clone_rejection();
            }
            return Err(e.into());
        }
    };
    let clone = state.registry.get_badge(clone_id)?;
    Ok((
        StatusCode::CREATED,
        Json(CloneResponse {
            badge_id: clone_id.as_u64(),
            origin_id: id,
            owner: clone.owner.as_str().to_owned(),
            metadata_uri: clone.metadata_uri,
        }),
    ))
}

// ── Transfer ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

#[derive(Serialize)]
pub struct TransferResponse {
    pub badge_id: u64,
    pub owner: String,
}

/// `POST /v1/badges/{id}/transfer`: move a badge to a new holder.
pub async fn transfer(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<u64>,
    Json(req): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, RpcError> {
    state.count_request();
    let from = HolderAddress::new(req.from);
    let to = HolderAddress::new(req.to);
    let started = Instant::now();
    state.registry.transfer(&from, to.clone(), BadgeId::new(id))?;
    state.observe_op_duration(started.elapsed());
    state.count_transfer();
    Ok(Json(TransferResponse {
        badge_id: id,
        owner: to.as_str().to_owned(),
    }))
}

// ── Badge queries ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct BadgeResponse {
    pub badge_id: u64,
    pub owner: String,
    pub metadata_uri: String,
    pub clone_quota: u64,
    pub clones_issued: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<u64>,
}

impl From<Badge> for BadgeResponse {
    fn from(badge: Badge) -> Self {
        Self {
            badge_id: badge.id.as_u64(),
            owner: badge.owner.as_str().to_owned(),
            metadata_uri: badge.metadata_uri,
            clone_quota: badge.clone_quota,
            clones_issued: badge.clones_issued,
            origin_id: badge.origin_id.map(|id| id.as_u64()),
        }
    }
}

#[derive(Serialize)]
pub struct OwnerResponse {
    pub badge_id: u64,
    pub owner: String,
}

#[derive(Serialize)]
pub struct TokenUriResponse {
    pub badge_id: u64,
    pub metadata_uri: String,
}

#[derive(Serialize)]
pub struct LatestBadgeIdResponse {
    pub latest_badge_id: u64,
}

/// `GET /v1/badges/{id}`: the full badge record.
pub async fn get_badge(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<u64>,
) -> Result<Json<BadgeResponse>, RpcError> {
    state.count_request();
    let badge = state.registry.get_badge(BadgeId::new(id))?;
    Ok(Json(badge.into()))
}

/// `GET /v1/badges/{id}/owner`: current holder of the badge.
pub async fn owner_of(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<u64>,
) -> Result<Json<OwnerResponse>, RpcError> {
    state.count_request();
    let owner = state.registry.owner_of(BadgeId::new(id))?;
    Ok(Json(OwnerResponse {
        badge_id: id,
        owner: owner.as_str().to_owned(),
    }))
}

/// `GET /v1/badges/{id}/uri`: metadata URI of the badge.
pub async fn token_uri(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<u64>,
) -> Result<Json<TokenUriResponse>, RpcError> {
    state.count_request();
    let metadata_uri = state.registry.token_uri(BadgeId::new(id))?;
    Ok(Json(TokenUriResponse {
        badge_id: id,
        metadata_uri,
    }))
}

/// `GET /v1/badges/latest`: highest id ever assigned; 0 when none minted.
pub async fn latest_badge_id(
    State(state): State<Arc<RpcState>>,
) -> Result<Json<LatestBadgeIdResponse>, RpcError> {
    state.count_request();
    let latest = state.registry.latest_badge_id()?;
    Ok(Json(LatestBadgeIdResponse {
        latest_badge_id: latest.as_u64(),
    }))
}

// ── Listing ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ListBadgesResponse {
    pub badges: Vec<BadgeResponse>,
    pub pagination: PaginationMeta,
}

/// `GET /v1/badges?cursor&count`: ascending id order, cursor-paginated.
pub async fn list_badges(
    State(state): State<Arc<RpcState>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ListBadgesResponse>, RpcError> {
    state.count_request();
    let count = params.page_size();
    let start = BadgeId::new(params.start_id());
    let page = state.registry.list_badges(start, count as usize)?;
    let cursor = page
        .last()
        .and_then(|last| pagination::next_cursor(last.id.as_u64(), page.len(), count));
    Ok(Json(ListBadgesResponse {
        badges: page.into_iter().map(BadgeResponse::from).collect(),
        pagination: PaginationMeta { cursor },
    }))
}

// ── Status ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub badge_count: u64,
    pub latest_badge_id: u64,
    pub uptime: String,
    pub version: String,
}

/// `GET /v1/status`: liveness plus coarse registry counters.
pub async fn status(State(state): State<Arc<RpcState>>) -> Result<Json<StatusResponse>, RpcError> {
    state.count_request();
    Ok(Json(StatusResponse {
        badge_count: state.registry.badge_count()?,
        latest_badge_id: state.registry.latest_badge_id()?.as_u64(),
        uptime: format_duration(state.started_at.elapsed().as_secs()),
        version: env!("CARGO_PKG_VERSION").to_owned(),
    }))
}

// ── Health and metrics ───────────────────────────────────────────────────

/// `GET /health`: plain liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// `GET /metrics`: Prometheus text exposition; 404 when metrics are
/// disabled.
pub async fn metrics(State(state): State<Arc<RpcState>>) -> Response {
    let registry = match state.metrics_registry.as_ref() {
        Some(registry) => registry,
        None => return (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    };
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buf) {
        return RpcError::Server(e.to_string()).into_response();
    }
    match String::from_utf8(buf) {
        Ok(body) => body.into_response(),
        Err(e) => RpcError::Server(e.to_string()).into_response(),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn non_negative_quota(value: i64) -> Result<u64, RpcError> {
    u64::try_from(value).map_err(|_| RpcError::from(RegistryError::InvalidQuota))
}
