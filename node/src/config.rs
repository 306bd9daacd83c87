//! Runtime configuration for a registry node, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::NodeError;

/// Everything a [`RegistryNode`](crate::RegistryNode) needs to run.
///
/// Usually assembled by the daemon from CLI flags layered over an optional
/// TOML file; tests build it directly and flip the fields they care about.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Data directory for badge storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Use the in-memory store instead of LMDB. Nothing survives a restart.
    #[serde(default)]
    pub ephemeral: bool,

    /// Serve the HTTP RPC API.
    #[serde(default = "default_true")]
    pub enable_rpc: bool,

    /// Port the RPC server listens on.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Serve the WebSocket event stream.
    #[serde(default)]
    pub enable_websocket: bool,

    /// Port the WebSocket server listens on.
    #[serde(default = "default_ws_port")]
    pub websocket_port: u16,

    /// Address the servers bind to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Whether to enable the Prometheus metrics endpoint.
    #[serde(default)]
    pub enable_metrics: bool,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: u64,

    /// Output format for logs, "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Field defaults ─────────────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./crest_data")
}

fn default_true() -> bool {
    true
}

fn default_rpc_port() -> u16 {
    7141
}

fn default_ws_port() -> u16 {
    7142
}

fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_map_size_mb() -> u64 {
    1024
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Loading ────────────────────────────────────────────────────────────

impl RegistryConfig {
    /// Read and parse a TOML config file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse a TOML document; absent keys fall back to the field defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Render the config back to TOML.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("RegistryConfig is always serializable to TOML")
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            ephemeral: false,
            enable_rpc: default_true(),
            rpc_port: default_rpc_port(),
            enable_websocket: false,
            websocket_port: default_ws_port(),
            listen_addr: default_listen_addr(),
            enable_metrics: false,
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
