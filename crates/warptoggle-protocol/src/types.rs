//! Request and response types for the warptoggle protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warptoggle_core::ConnectionState;

use crate::PROTOCOL_VERSION;

/// Message envelope wrapping all protocol messages.
///
/// Provides versioning and request correlation for every message
/// exchanged between client and daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Protocol version (always "1" for v1).
    pub protocol_version: String,
    /// Unique request ID for correlation.
    pub request_id: String,
    /// The actual payload.
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Creates a new envelope with the current protocol version.
    pub fn new(request_id: impl Into<String>, payload: T) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            request_id: request_id.into(),
            payload,
        }
    }

    /// Creates a request envelope.
    pub fn request(request_id: impl Into<String>, request: T) -> Self {
        Self::new(request_id, request)
    }

    /// Creates a response envelope.
    pub fn response(request_id: impl Into<String>, response: T) -> Self {
        Self::new(request_id, response)
    }

    /// Checks if this envelope uses a compatible protocol version.
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

/// A user-originated request to transition to a desired connection state,
/// independent of poll cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleIntent {
    Connect,
    Disconnect,
}

impl ToggleIntent {
    /// The `warp-cli` verb this intent maps to.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
        }
    }

    /// Intent that flips the given belief.
    pub fn flipping(state: ConnectionState) -> Self {
        if state.is_connected() {
            Self::Disconnect
        } else {
            Self::Connect
        }
    }
}

/// Requests the client can send to the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Get the daemon's current belief about the connection.
    GetState,

    /// Issue a connect or disconnect intent.
    Toggle { intent: ToggleIntent },

    /// Trigger an immediate status check.
    CheckNow,

    /// Get daemon status (uptime, CLI path, current belief).
    Status,

    /// Request daemon shutdown.
    Shutdown,

    /// Ping to check daemon liveness.
    Ping,
}

/// Snapshot of the reconciler's belief, served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInfo {
    /// Last observed connection state.
    pub state: ConnectionState,
    /// Whether a poll session is currently active.
    pub polling: bool,
    /// Consecutive non-Connected observations since the last reset.
    pub consecutive_failures: u32,
    /// When the last status check completed.
    pub last_check: Option<DateTime<Utc>>,
    /// Last runner error, if the most recent check failed.
    pub last_error: Option<String>,
}

/// Daemon status payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Seconds since the daemon started.
    pub uptime_seconds: u64,
    /// Path of the wrapped CLI executable.
    pub cli_path: String,
    /// Current reconciler snapshot.
    pub state: StateInfo,
}

/// Responses the daemon sends back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current belief snapshot.
    State(StateInfo),

    /// Daemon status.
    Status(DaemonStatus),

    /// Request accepted (toggle, check, shutdown).
    Ack,

    /// Liveness reply.
    Pong,

    /// Request failed.
    Error(ErrorResponse),
}

/// Error payload for failed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes for [`ErrorResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request could not be handled in the daemon's current state.
    Internal,
    /// Daemon is shutting down.
    ShuttingDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_version() {
        let env = Envelope::request("req-1", Request::Ping);
        assert_eq!(env.protocol_version, PROTOCOL_VERSION);
        assert!(env.is_compatible());
    }

    #[test]
    fn request_json_shape() {
        let json = serde_json::to_string(&Request::Toggle {
            intent: ToggleIntent::Connect,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"toggle","intent":"connect"}"#);
    }

    #[test]
    fn response_roundtrip() {
        let info = StateInfo {
            state: ConnectionState::Connecting,
            polling: true,
            consecutive_failures: 2,
            last_check: None,
            last_error: None,
        };
        let resp = Response::State(info.clone());
        let json = serde_json::to_string(&resp).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Response::State(info));
    }

    #[test]
    fn flipping_intent() {
        assert_eq!(
            ToggleIntent::flipping(ConnectionState::Connected),
            ToggleIntent::Disconnect
        );
        assert_eq!(
            ToggleIntent::flipping(ConnectionState::Disconnected),
            ToggleIntent::Connect
        );
        assert_eq!(
            ToggleIntent::flipping(ConnectionState::Connecting),
            ToggleIntent::Connect
        );
    }

    #[test]
    fn verbs_match_cli() {
        assert_eq!(ToggleIntent::Connect.verb(), "connect");
        assert_eq!(ToggleIntent::Disconnect.verb(), "disconnect");
    }
}
