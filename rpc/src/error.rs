//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crest_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("badge not found: {0}")]
    BadgeNotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("store error: {0}")]
    Store(String),
}

impl RpcError {
    /// Stable machine-readable kind for the JSON error body.
    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::BadgeNotFound(_) => "not_found",
            RpcError::InvalidRequest(_) => "invalid_request",
            RpcError::Unauthorized(_) => "unauthorized",
            RpcError::QuotaExceeded(_) => "quota_exceeded",
            RpcError::Server(_) => "server_error",
            RpcError::Store(_) => "store_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::BadgeNotFound(_) => StatusCode::NOT_FOUND,
            RpcError::Unauthorized(_) => StatusCode::FORBIDDEN,
            RpcError::QuotaExceeded(_) => StatusCode::CONFLICT,
            RpcError::Server(_) | RpcError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RegistryError> for RpcError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::InvalidOwner | RegistryError::InvalidQuota => {
                RpcError::InvalidRequest(e.to_string())
            }
            RegistryError::NotFound(id) => RpcError::BadgeNotFound(id.to_string()),
            RegistryError::Unauthorized { .. } => RpcError::Unauthorized(e.to_string()),
            RegistryError::QuotaExceeded { .. } => RpcError::QuotaExceeded(e.to_string()),
            RegistryError::Storage(inner) => RpcError::Store(inner.to_string()),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crest_types::BadgeId;

    #[test]
    fn registry_errors_map_to_http_statuses() {
        let cases = [
            (RegistryError::InvalidOwner, StatusCode::BAD_REQUEST),
            (RegistryError::InvalidQuota, StatusCode::BAD_REQUEST),
            (
                RegistryError::NotFound(BadgeId::new(7)),
                StatusCode::NOT_FOUND,
            ),
            (
                RegistryError::Unauthorized {
                    badge_id: BadgeId::new(7),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                RegistryError::QuotaExceeded {
                    badge_id: BadgeId::new(7),
                    clone_quota: 3,
                },
                StatusCode::CONFLICT,
            ),
        ];
        for (registry_error, expected) in cases {
            let rpc_error = RpcError::from(registry_error);
            assert_eq!(rpc_error.status_code(), expected, "{rpc_error}");
        }
    }

    #[test]
    fn not_found_carries_the_badge_id() {
        let e = RpcError::from(RegistryError::NotFound(BadgeId::new(42)));
        assert_eq!(e.kind(), "not_found");
        assert_eq!(e.to_string(), "badge not found: 42");
    }

    #[test]
    fn storage_faults_become_server_side_errors() {
        let e = RpcError::from(RegistryError::Storage(
            crest_store::StoreError::Backend("mdb_put failed".into()),
        ));
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.kind(), "store_error");
    }
}
