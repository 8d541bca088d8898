//! Request dispatch.
//!
//! Routes incoming protocol requests to the reconciler handle and
//! answers from the shared state. All failures are absorbed here and
//! answered as protocol errors; nothing propagates to the accept loop.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use warptoggle_protocol::{DaemonStatus, ErrorCode, ErrorResponse, Request, Response};

use crate::reconciler::ReconcilerHandle;
use crate::socket::Connection;

/// Context shared by all connection handlers.
pub struct DaemonContext {
    started_at: DateTime<Utc>,
    cli_path: String,
    reconciler: ReconcilerHandle,
    shutdown_tx: watch::Sender<bool>,
}

impl DaemonContext {
    /// Creates the context and the shutdown receiver the accept loop
    /// waits on.
    pub fn new(
        cli_path: impl Into<String>,
        reconciler: ReconcilerHandle,
    ) -> (Arc<Self>, watch::Receiver<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ctx = Arc::new(Self {
            started_at: Utc::now(),
            cli_path: cli_path.into(),
            reconciler,
            shutdown_tx,
        });
        (ctx, shutdown_rx)
    }

    fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    /// Produces the response for a single request.
    pub async fn dispatch(&self, request: Request) -> Response {
        debug!(request = ?request, "dispatching request");
        match request {
            Request::GetState => Response::State(self.reconciler.state_info().await),

            Request::Status => Response::Status(DaemonStatus {
                uptime_seconds: self.uptime_seconds(),
                cli_path: self.cli_path.clone(),
                state: self.reconciler.state_info().await,
            }),

            Request::Toggle { intent } => match self.reconciler.toggle(intent).await {
                Ok(()) => Response::Ack,
                Err(_) => Response::Error(ErrorResponse::new(
                    ErrorCode::ShuttingDown,
                    "reconciler is no longer running",
                )),
            },

            Request::CheckNow => match self.reconciler.check_now().await {
                Ok(()) => Response::Ack,
                Err(_) => Response::Error(ErrorResponse::new(
                    ErrorCode::ShuttingDown,
                    "reconciler is no longer running",
                )),
            },

            Request::Shutdown => {
                let _ = self.shutdown_tx.send(true);
                Response::Ack
            }

            Request::Ping => Response::Pong,
        }
    }
}

/// Builds the per-connection handler closure for the accept loop.
///
/// Each connection is served until clean EOF or the first protocol
/// error; errors are logged, never thrown upward.
pub fn make_connection_handler(
    ctx: Arc<DaemonContext>,
) -> impl Fn(Connection) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
+ Send
+ Sync
+ 'static {
    move |mut connection| {
        let ctx = ctx.clone();
        Box::pin(async move {
            loop {
                let envelope = match connection.read_request().await {
                    Ok(Some(envelope)) => envelope,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "failed to read request");
                        break;
                    }
                };

                let response = ctx.dispatch(envelope.payload).await;
                if let Err(e) = connection.respond(&envelope.request_id, response).await {
                    warn!(error = %e, "failed to write response");
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::{Reconciler, ReconcilerConfig};
    use warptoggle_core::ConnectionState;

    fn test_context() -> (Arc<DaemonContext>, watch::Receiver<bool>) {
        // A reconciler that is never run: the handle still serves state
        // snapshots, and command sends fail, which dispatch must absorb.
        let reconciler = Reconciler::new(ReconcilerConfig::default());
        DaemonContext::new("warp-cli", reconciler.handle())
    }

    #[tokio::test]
    async fn ping_pong() {
        let (ctx, _rx) = test_context();
        assert_eq!(ctx.dispatch(Request::Ping).await, Response::Pong);
    }

    #[tokio::test]
    async fn get_state_reflects_initial_belief() {
        let (ctx, _rx) = test_context();
        let Response::State(info) = ctx.dispatch(Request::GetState).await else {
            panic!("expected state response");
        };
        assert_eq!(info.state, ConnectionState::Disconnected);
        assert!(info.polling);
        assert!(info.last_check.is_none());
    }

    #[tokio::test]
    async fn status_carries_cli_path() {
        let (ctx, _rx) = test_context();
        let Response::Status(status) = ctx.dispatch(Request::Status).await else {
            panic!("expected status response");
        };
        assert_eq!(status.cli_path, "warp-cli");
    }

    #[tokio::test]
    async fn shutdown_flips_watch_channel() {
        let (ctx, rx) = test_context();
        assert!(!*rx.borrow());
        assert_eq!(ctx.dispatch(Request::Shutdown).await, Response::Ack);
        assert!(*rx.borrow());
    }
}
