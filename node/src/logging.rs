//! Structured logging setup for the registry node.
//!
//! Uses `tracing` with an env-filter so `RUST_LOG` can override the
//! configured level. Supports human-readable and JSON output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colorized output for terminals.
    Human,
    /// Newline-delimited JSON for log shippers.
    Json,
}

/// Initialize the global tracing subscriber.
///
/// `level` is used as the default filter when `RUST_LOG` is not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed.
pub fn init_logging(format: LogFormat, level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Human => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_thread_ids(true))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(true).with_thread_ids(true))
                .init();
        }
    }
}
