//! Length-prefixed message framing for IPC.
//!
//! ```text
//! +----------------+------------------+
//! | length (4 BE)  |  JSON payload    |
//! +----------------+------------------+
//! ```

use serde::{Serialize, de::DeserializeOwned};

use crate::MAX_MESSAGE_SIZE;
use crate::error::{ProtocolError, ProtocolResult};

/// Encodes a message to bytes with length prefix, ready for transmission.
pub fn encode_message<T: Serialize>(message: &T) -> ProtocolResult<Vec<u8>> {
    let json = serde_json::to_vec(message)?;
    let len = json.len() as u32;

    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buffer = Vec::with_capacity(4 + json.len());
    buffer.extend_from_slice(&len.to_be_bytes());
    buffer.extend_from_slice(&json);
    Ok(buffer)
}

/// Decodes a complete framed message (length prefix + payload).
pub fn decode_message<T: DeserializeOwned>(data: &[u8]) -> ProtocolResult<T> {
    if data.len() < 4 {
        return Err(ProtocolError::IncompleteMessage {
            expected: 4,
            received: data.len(),
        });
    }

    let len_bytes: [u8; 4] = data[0..4].try_into().expect("sliced to 4 bytes");
    let len = u32::from_be_bytes(len_bytes) as usize;

    if len == 0 {
        return Err(ProtocolError::EmptyMessage);
    }
    if len > MAX_MESSAGE_SIZE as usize {
        return Err(ProtocolError::MessageTooLarge {
            size: len as u32,
            max: MAX_MESSAGE_SIZE,
        });
    }
    if data.len() < 4 + len {
        return Err(ProtocolError::IncompleteMessage {
            expected: 4 + len,
            received: data.len(),
        });
    }

    let message = serde_json::from_slice(&data[4..4 + len])?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Envelope, Request};

    #[test]
    fn roundtrip() {
        let envelope = Envelope::request("req-1", Request::Ping);
        let bytes = encode_message(&envelope).unwrap();
        assert_eq!(
            u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as usize,
            bytes.len() - 4
        );

        let decoded: Envelope<Request> = decode_message(&bytes).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn rejects_truncated_prefix() {
        let result: ProtocolResult<Envelope<Request>> = decode_message(&[0, 0]);
        assert!(matches!(
            result,
            Err(ProtocolError::IncompleteMessage { expected: 4, .. })
        ));
    }

    #[test]
    fn rejects_truncated_payload() {
        let envelope = Envelope::request("req-1", Request::GetState);
        let mut bytes = encode_message(&envelope).unwrap();
        bytes.truncate(bytes.len() - 1);

        let result: ProtocolResult<Envelope<Request>> = decode_message(&bytes);
        assert!(matches!(
            result,
            Err(ProtocolError::IncompleteMessage { .. })
        ));
    }

    #[test]
    fn rejects_empty_frame() {
        let bytes = 0u32.to_be_bytes();
        let result: ProtocolResult<Envelope<Request>> = decode_message(&bytes);
        assert!(matches!(result, Err(ProtocolError::EmptyMessage)));
    }

    #[test]
    fn rejects_oversized_length() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(MAX_MESSAGE_SIZE + 1).to_be_bytes());
        bytes.extend_from_slice(b"{}");

        let result: ProtocolResult<Envelope<Request>> = decode_message(&bytes);
        assert!(matches!(result, Err(ProtocolError::MessageTooLarge { .. })));
    }
}
