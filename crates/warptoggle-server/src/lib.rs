//! Daemon: CLI runner, reconciler, notifications, socket IPC.
//!
//! The daemon wraps the `warp-cli` executable and keeps a belief about
//! the connection state current:
//! - spawns `warp-cli status` on a poll interval and classifies the output
//! - issues `warp-cli connect` / `warp-cli disconnect` on toggle intents
//! - escalates sustained failure via desktop notification
//! - serves the belief to clients over a Unix socket

mod config;
mod error;
mod handler;
mod notify;
mod pidfile;
mod reconciler;
mod runner;
mod signals;
mod socket;

pub use config::{ServerConfig, default_socket_path};
pub use error::{ServerError, ServerResult};
pub use handler::{DaemonContext, make_connection_handler};
pub use notify::{DesktopNotifier, ErrorNotifier, NotifyConfig};
pub use reconciler::{
    Reconciler, ReconcilerCommand, ReconcilerConfig, ReconcilerHandle, ReconcilerState,
    SharedReconcilerState,
};
pub use runner::{BoxFuture, CliError, VpnControl, WarpCli, find_in_path};
pub use signals::{ShutdownSignal, SignalHandler};
pub use socket::{Connection, SocketServer};

pub use pidfile::{PidFile, default_pid_path};
