//! Unix signal handling: SIGTERM/SIGINT trigger graceful shutdown.
//!
//! The daemon has no reloadable configuration, so SIGHUP is left at its
//! default disposition.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

/// Installs signal listeners and exposes shutdown as a future.
pub struct SignalHandler {
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    /// Creates a new signal handler.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Spawns the listener task. Call once at daemon startup.
    #[cfg(unix)]
    pub fn spawn_listener(&self) {
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
            let mut sigint =
                signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                _ = sigint.recv() => info!("received SIGINT, initiating shutdown"),
            }
            let _ = shutdown_tx.send(true);
            debug!("signal listener stopped");
        });
    }

    /// Non-Unix fallback: Ctrl+C only.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) {
        let shutdown_tx = self.shutdown_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received Ctrl+C, initiating shutdown");
                let _ = shutdown_tx.send(true);
            }
        });
    }

    /// Returns a future that completes when a shutdown signal arrives.
    pub fn shutdown(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.shutdown_rx.clone(),
        }
    }

    /// Programmatic shutdown trigger (used by the Shutdown request).
    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Future wrapper around the shutdown watch channel.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits until shutdown is signalled.
    pub async fn wait(mut self) {
        // Already signalled before we started waiting.
        if *self.rx.borrow() {
            return;
        }
        while self.rx.changed().await.is_ok() {
            if *self.rx.borrow() {
                return;
            }
        }
        // Sender dropped: treat as shutdown.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_completes_waiters() {
        let handler = SignalHandler::new();
        let signal = handler.shutdown();

        let waiter = tokio::spawn(signal.wait());
        handler.trigger_shutdown();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should complete")
            .unwrap();
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_already_triggered() {
        let handler = SignalHandler::new();
        handler.trigger_shutdown();

        tokio::time::timeout(Duration::from_secs(1), handler.shutdown().wait())
            .await
            .expect("should not block");
    }

    #[tokio::test]
    async fn dropped_sender_unblocks_waiters() {
        let handler = SignalHandler::new();
        let signal = handler.shutdown();
        drop(handler);

        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .expect("should complete when sender is gone");
    }
}
