//! HTTP API server for the Crest registry.
//!
//! Provides endpoints for:
//! - Minting original badges
//! - Drawing clones against an origin's quota
//! - Ownership transfer
//! - Badge queries (record, owner, metadata URI, latest id, paginated listing)
//! - Node status, health, and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod pagination;
pub mod server;

pub use error::RpcError;
pub use server::{RpcMetrics, RpcServer, RpcState};
