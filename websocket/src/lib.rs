//! WebSocket server for real-time registry updates.
//!
//! Clients can subscribe to:
//! - `minted`: new original badges
//! - `cloned`: clones drawn against an origin's quota
//! - `origin_updated`: origin records whose issued-clone count changed

pub mod server;
pub mod subscriptions;

pub use server::{WebSocketServer, WsState};
