//! Unix socket client for communicating with the warptoggle daemon.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, warn};
use uuid::Uuid;

use warptoggle_protocol::{Envelope, MAX_MESSAGE_SIZE, Request, Response};

use crate::error::{ClientError, ClientResult};

/// Client for one-shot request/response exchanges with the daemon.
pub struct SocketClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl SocketClient {
    /// Creates a new socket client.
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout,
        }
    }

    /// Creates a socket client with the default socket path.
    pub fn with_defaults() -> Self {
        Self::new(
            warptoggle_server::default_socket_path(),
            Duration::from_secs(5),
        )
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Checks if the daemon socket exists.
    pub fn socket_exists(&self) -> bool {
        self.socket_path.exists()
    }

    /// Sends a request and waits for the response.
    pub async fn send(&self, request: Request) -> ClientResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        let envelope = Envelope::request(&request_id, request);

        debug!(
            socket = %self.socket_path.display(),
            request_id = %request_id,
            "connecting to daemon"
        );

        let mut stream =
            tokio::time::timeout(self.timeout, UnixStream::connect(&self.socket_path))
                .await
                .map_err(|_| {
                    ClientError::Timeout(format!(
                        "connecting to {}",
                        self.socket_path.display()
                    ))
                })?
                .map_err(|e| {
                    ClientError::Connection(format!(
                        "failed to connect to {}: {}",
                        self.socket_path.display(),
                        e
                    ))
                })?;

        let bytes = warptoggle_protocol::encode_message(&envelope)
            .map_err(|e| ClientError::Protocol(e.to_string()))?;

        tokio::time::timeout(self.timeout, async {
            stream.write_all(&bytes).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| ClientError::Timeout("sending request".into()))?
        .map_err(ClientError::Io)?;

        let payload = tokio::time::timeout(self.timeout, async {
            let mut len_buf = [0u8; 4];
            stream.read_exact(&mut len_buf).await?;
            let len = u32::from_be_bytes(len_buf);

            if len > MAX_MESSAGE_SIZE {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("response too large: {} bytes", len),
                ));
            }

            let mut payload = vec![0u8; len as usize];
            stream.read_exact(&mut payload).await?;
            Ok(payload)
        })
        .await
        .map_err(|_| ClientError::Timeout("reading response".into()))?
        .map_err(ClientError::Io)?;

        let response: Envelope<Response> = serde_json::from_slice(&payload)
            .map_err(|e| ClientError::Protocol(format!("failed to decode response: {}", e)))?;

        if response.request_id != request_id {
            warn!(
                expected = %request_id,
                received = %response.request_id,
                "response request_id mismatch"
            );
        }

        match response.payload {
            Response::Error(err) => Err(ClientError::Daemon(err.message)),
            payload => Ok(payload),
        }
    }

    /// Pings the daemon to check if it's alive.
    pub async fn ping(&self) -> bool {
        matches!(self.send(Request::Ping).await, Ok(Response::Pong))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_paths() {
        let client = SocketClient::new("/tmp/test.sock", Duration::from_secs(1));
        assert_eq!(client.socket_path(), Path::new("/tmp/test.sock"));
        assert!(!client.socket_exists());
    }

    #[test]
    fn default_client_uses_daemon_path() {
        let client = SocketClient::with_defaults();
        assert!(
            client
                .socket_path()
                .to_string_lossy()
                .contains("warptoggle")
        );
    }

    #[tokio::test]
    async fn connect_to_missing_socket_is_connection_error() {
        let client = SocketClient::new("/nonexistent/warptoggle.sock", Duration::from_secs(1));
        let err = client.send(Request::Ping).await.unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)));
    }
}
