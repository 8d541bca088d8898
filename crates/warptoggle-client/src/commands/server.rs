//! Server command — starts the daemon in the foreground.
//!
//! Wiring order matters:
//! 1. presence check for the wrapped CLI (abort + notify when missing)
//! 2. PID file (one daemon per user)
//! 3. signal handler (SIGTERM/SIGINT)
//! 4. reconciler task
//! 5. socket server, running until either a signal or a client Shutdown

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use warptoggle_server::{
    DaemonContext, DesktopNotifier, ErrorNotifier, NotifyConfig, PidFile, Reconciler,
    ReconcilerConfig, ServerConfig, SignalHandler, SocketServer, VpnControl, WarpCli,
    default_pid_path, default_socket_path, find_in_path, make_connection_handler,
};

use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Starts the daemon in the foreground.
///
/// Blocks until a shutdown signal or a client Shutdown request arrives.
pub async fn run(cli: &Cli, config: &ClientConfig) -> ClientResult<()> {
    let notifier = Arc::new(DesktopNotifier::new(
        NotifyConfig::default().with_enabled(config.daemon.notifications),
    ));

    // 1. Pre-flight presence check. Absence is a startup abort surfaced
    // through the notifier, not a panic; nothing is constructed after it.
    let cli_name = config.daemon.cli_path.as_str();
    let Some(cli_path) = resolve_cli(cli_name) else {
        notifier.notify_error(
            "WARP toggle unavailable",
            &format!("`{}` was not found on PATH; install Cloudflare WARP first.", cli_name),
        );
        return Err(ClientError::Config(format!(
            "executable not found on PATH: {}",
            cli_name
        )));
    };
    info!(cli = %cli_path.display(), "using WARP CLI");

    // 2. PID file (prevents duplicate daemons).
    let _pid_file = PidFile::create(default_pid_path())
        .map_err(|e| ClientError::Config(format!("failed to create PID file: {}", e)))?;

    // 3. Signal handler.
    let signal_handler = SignalHandler::new();
    signal_handler.spawn_listener();

    // 4. Reconciler.
    let reconciler = Reconciler::new(
        ReconcilerConfig::new(Duration::from_secs(config.daemon.poll_interval_secs))
            .with_failure_threshold(config.daemon.failure_threshold),
    );
    let reconciler_handle = reconciler.handle();

    let runner: Arc<dyn VpnControl> = Arc::new(WarpCli::new(&cli_path));
    let reconciler_notifier: Arc<dyn ErrorNotifier> = notifier.clone();
    let reconciler_task = tokio::spawn(async move {
        reconciler.run(runner, reconciler_notifier).await;
    });

    // 5. Socket server.
    let socket_path = cli
        .socket_path
        .clone()
        .or_else(|| config.server.socket_path.clone())
        .unwrap_or_else(default_socket_path);

    let server = SocketServer::new(ServerConfig::new(&socket_path))
        .await
        .map_err(|e| ClientError::Config(format!("failed to start socket server: {}", e)))?;

    info!(path = %socket_path.display(), "daemon listening");

    let (ctx, mut client_shutdown) =
        DaemonContext::new(cli_path.to_string_lossy(), reconciler_handle.clone());
    let handler = make_connection_handler(ctx);

    let signal_shutdown = signal_handler.shutdown();
    let shutdown = async move {
        tokio::select! {
            _ = signal_shutdown.wait() => {}
            _ = async {
                while client_shutdown.changed().await.is_ok() {
                    if *client_shutdown.borrow() {
                        break;
                    }
                }
            } => {
                info!("shutdown requested by client");
            }
        }
    };

    server
        .run_until_shutdown(handler, shutdown)
        .await
        .map_err(|e| ClientError::Config(format!("server error: {}", e)))?;

    // Clean shutdown: stop the reconciler and give it a moment.
    info!("shutting down...");
    if let Err(e) = reconciler_handle.stop().await {
        warn!(error = %e, "failed to send stop command to reconciler");
    }
    let _ = tokio::time::timeout(Duration::from_secs(5), reconciler_task).await;

    info!("daemon stopped");
    Ok(())
}

/// Resolves the CLI setting to something spawnable: an explicit path is
/// used as-is (if it exists), a bare name goes through PATH lookup.
fn resolve_cli(name: &str) -> Option<std::path::PathBuf> {
    let as_path = std::path::Path::new(name);
    if as_path.components().count() > 1 {
        return as_path.is_file().then(|| as_path.to_path_buf());
    }
    find_in_path(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn missing_cli_aborts_startup() {
        // Startup abort: nothing past the presence check runs, no PID
        // file, no socket, no poll session.
        let cli = Cli::parse_from(["warptoggle", "server"]);
        let mut config = ClientConfig::default();
        config.daemon.cli_path = "warptoggle-no-such-tool".into();
        config.daemon.notifications = false;

        let err = run(&cli, &config).await.unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains("warptoggle-no-such-tool"));
    }

    #[test]
    fn resolve_bare_name_via_path() {
        assert!(resolve_cli("sh").is_some());
        assert!(resolve_cli("warptoggle-no-such-tool").is_none());
    }

    #[test]
    fn resolve_explicit_path() {
        assert_eq!(
            resolve_cli("/bin/sh"),
            Some(std::path::PathBuf::from("/bin/sh"))
        );
        assert!(resolve_cli("/bin/warptoggle-no-such-tool").is_none());
    }
}
