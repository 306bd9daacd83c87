//! Crest registry node: orchestrates the badge registry service.
//!
//! The node is the central coordinator that:
//! - Opens the configured store backend (LMDB or in-memory)
//! - Owns the badge registry and its single write boundary
//! - Bridges registry events to Prometheus metrics and WebSocket topics
//! - Runs the RPC and WebSocket servers
//! - Coordinates graceful shutdown

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;

pub use config::RegistryConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::RegistryNode;
pub use shutdown::ShutdownController;
