//! Crest daemon: entry point for running a badge registry node.

use clap::Parser;
use crest_node::{LogFormat, RegistryConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "crest-daemon", about = "Crest badge registry node daemon")]
struct Cli {
    /// Data directory for badge storage.
    #[arg(long, default_value = "./crest_data", env = "CREST_DATA_DIR")]
    data_dir: PathBuf,

    /// Run against an in-memory store; nothing survives a restart.
    #[arg(long, env = "CREST_EPHEMERAL")]
    ephemeral: bool,

    /// Enable RPC server.
    #[arg(long, default_value_t = true, env = "CREST_ENABLE_RPC")]
    rpc: bool,

    /// RPC server port.
    #[arg(long, default_value_t = 7141, env = "CREST_RPC_PORT")]
    rpc_port: u16,

    /// Enable WebSocket server.
    #[arg(long, env = "CREST_ENABLE_WEBSOCKET")]
    websocket: bool,

    /// WebSocket server port.
    #[arg(long, default_value_t = 7142, env = "CREST_WS_PORT")]
    websocket_port: u16,

    /// Address the servers bind to.
    #[arg(long, default_value = "0.0.0.0", env = "CREST_LISTEN_ADDR")]
    listen_addr: String,

    /// Enable Prometheus metrics endpoint.
    #[arg(long, env = "CREST_ENABLE_METRICS")]
    metrics: bool,

    /// LMDB map size in MiB.
    #[arg(long, env = "CREST_MAP_SIZE_MB")]
    map_size_mb: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, default_value = "human", env = "CREST_LOG_FORMAT")]
    log_format: String,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "CREST_LOG_LEVEL")]
    log_level: String,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the node.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node.
    Run,
}

/// Read the optional TOML config file, logging and falling back to CLI-only
/// settings when it cannot be used.
fn load_file_config(path: &Path) -> Option<RegistryConfig> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(
                "Cannot read config file {}: {e}; continuing with CLI settings",
                path.display()
            );
            return None;
        }
    };
    match toml::from_str::<RegistryConfig>(&contents) {
        Ok(cfg) => {
            tracing::info!("Using config file {}", path.display());
            Some(cfg)
        }
        Err(e) => {
            tracing::warn!(
                "Cannot parse config file {}: {e}; continuing with CLI settings",
                path.display()
            );
            None
        }
    }
}

/// Layer CLI flags over the file config.
///
/// CLI values always carry (clap fills in the defaults), booleans are OR-ed
/// so either source can enable a surface, and `map_size_mb` falls back to
/// the file value, then 1024.
fn resolve_config(cli: &Cli, file: Option<RegistryConfig>) -> RegistryConfig {
    let (ephemeral, websocket, metrics, map_size_mb) = match file {
        Some(file_cfg) => (
            cli.ephemeral || file_cfg.ephemeral,
            cli.websocket || file_cfg.enable_websocket,
            cli.metrics || file_cfg.enable_metrics,
            cli.map_size_mb.unwrap_or(file_cfg.map_size_mb),
        ),
        None => (
            cli.ephemeral,
            cli.websocket,
            cli.metrics,
            cli.map_size_mb.unwrap_or(1024),
        ),
    };

    RegistryConfig {
        data_dir: cli.data_dir.clone(),
        ephemeral,
        enable_rpc: cli.rpc,
        rpc_port: cli.rpc_port,
        enable_websocket: websocket,
        websocket_port: cli.websocket_port,
        listen_addr: cli.listen_addr.clone(),
        enable_metrics: metrics,
        map_size_mb,
        log_format: cli.log_format.clone(),
        log_level: cli.log_level.clone(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_format = match cli.log_format.to_lowercase().as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Human,
    };
    crest_node::init_logging(log_format, &cli.log_level);

    let file_config = cli.config.as_deref().and_then(load_file_config);
    let config = resolve_config(&cli, file_config);

    match cli.command {
        Command::Node { action } => match action {
            NodeAction::Run => {
                tracing::info!(
                    "Starting registry node (data: {}, RPC:{}, WS:{})",
                    if config.ephemeral {
                        "in-memory".to_string()
                    } else {
                        config.data_dir.display().to_string()
                    },
                    if config.enable_rpc {
                        config.rpc_port.to_string()
                    } else {
                        "off".into()
                    },
                    if config.enable_websocket {
                        config.websocket_port.to_string()
                    } else {
                        "off".into()
                    },
                );

                let mut node = crest_node::RegistryNode::new(config)?;
                node.start().await?;

                tracing::info!("Shutdown signal received, stopping node");
                node.stop().await?;

                tracing::info!("crest daemon exited cleanly");
            }
        },
    }

    Ok(())
}
