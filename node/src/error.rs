//! Node-level error type.

use crest_registry::RegistryError;
use crest_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the registry node lifecycle.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rpc server error: {0}")]
    Rpc(String),

    #[error("websocket server error: {0}")]
    WebSocket(String),
}
