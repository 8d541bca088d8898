//! IPC framing and request/response types for warptoggle.
//!
//! Client and daemon exchange length-prefixed JSON over a Unix socket:
//! 4 bytes message length (u32, big-endian) followed by the payload.
//! Every message is wrapped in an [`Envelope`] carrying the protocol
//! version and a request id for correlation.

mod error;
mod framing;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{decode_message, encode_message};
pub use types::{
    DaemonStatus, Envelope, ErrorCode, ErrorResponse, Request, Response, StateInfo, ToggleIntent,
};

/// Protocol version constant.
pub const PROTOCOL_VERSION: &str = "1";

/// Maximum message size (64 KiB). State payloads are tiny; anything
/// bigger is a framing error, not a legitimate message.
pub const MAX_MESSAGE_SIZE: u32 = 64 * 1024;
