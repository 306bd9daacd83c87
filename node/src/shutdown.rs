//! Graceful shutdown coordination for the registry node.
//!
//! Listens for SIGINT/SIGTERM and broadcasts a shutdown signal to every
//! spawned server task.

use tokio::sync::broadcast;
use tracing::info;

/// Broadcasts a shutdown signal to all subscribed tasks.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(1);
        Self { tx }
    }

    /// Returns a receiver that resolves once shutdown is requested.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Requests shutdown of all subscribed tasks.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }

    /// Waits for SIGINT or SIGTERM, then broadcasts shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install ctrl-c handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received ctrl-c, shutting down"),
            _ = terminate => info!("received SIGTERM, shutting down"),
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_reaches_subscribers() {
        let controller = ShutdownController::new();
        let mut rx = controller.subscribe();
        controller.shutdown();
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn late_subscribers_do_not_see_earlier_signals() {
        let controller = ShutdownController::new();
        controller.shutdown();

        let mut rx = controller.subscribe();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));

        controller.shutdown();
        assert!(rx.recv().await.is_ok());
    }
}
