//! Server error types.

use std::io;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the daemon.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (socket, file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol error (framing, encoding, etc.).
    #[error("protocol error: {0}")]
    Protocol(#[from] warptoggle_protocol::ProtocolError),

    /// Socket path already in use by a live daemon.
    #[error("socket path already in use: {path}")]
    SocketInUse { path: String },

    /// Socket path parent directory does not exist.
    #[error("socket path parent directory does not exist: {path}")]
    SocketPathInvalid { path: String },

    /// Daemon is already running.
    #[error("daemon is already running (PID file exists: {path})")]
    AlreadyRunning { path: String },

    /// The wrapped CLI executable was not found on PATH.
    ///
    /// Pre-flight abort condition: nothing is constructed when this fires.
    #[error("executable not found on PATH: {name}")]
    CliMissing { name: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a socket in use error.
    pub fn socket_in_use(path: impl Into<String>) -> Self {
        Self::SocketInUse { path: path.into() }
    }

    /// Creates a socket path invalid error.
    pub fn socket_path_invalid(path: impl Into<String>) -> Self {
        Self::SocketPathInvalid { path: path.into() }
    }

    /// Creates an already running error.
    pub fn already_running(path: impl Into<String>) -> Self {
        Self::AlreadyRunning { path: path.into() }
    }

    /// Creates a missing-executable error.
    pub fn cli_missing(name: impl Into<String>) -> Self {
        Self::CliMissing { name: name.into() }
    }
}
