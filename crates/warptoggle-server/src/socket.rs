//! Unix socket listener for IPC.
//!
//! Serves the framed warptoggle protocol to clients. The socket file is
//! owned by the daemon: stale files are cleaned up on bind (after
//! probing for a live peer) and the file is removed again on drop.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use warptoggle_protocol::{Envelope, MAX_MESSAGE_SIZE, ProtocolError, Request, Response};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Unix socket server for handling client connections.
pub struct SocketServer {
    config: ServerConfig,
    listener: UnixListener,
    connection_semaphore: Arc<Semaphore>,
}

impl SocketServer {
    /// Binds to the socket path in the configuration.
    ///
    /// An existing socket file is probed first: if something answers, a
    /// daemon is already running and binding fails; if nothing answers
    /// the stale file is removed (when `cleanup_stale_socket` is set).
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let socket_path = &config.socket_path;

        if let Some(parent) = socket_path.parent()
            && !parent.exists()
        {
            return Err(ServerError::socket_path_invalid(
                parent.to_string_lossy().to_string(),
            ));
        }

        if socket_path.exists() {
            if !config.cleanup_stale_socket {
                return Err(ServerError::socket_in_use(
                    socket_path.to_string_lossy().to_string(),
                ));
            }
            match UnixStream::connect(socket_path).await {
                Ok(_) => {
                    return Err(ServerError::socket_in_use(
                        socket_path.to_string_lossy().to_string(),
                    ));
                }
                Err(_) => {
                    info!(path = %socket_path.display(), "removing stale socket");
                    std::fs::remove_file(socket_path)?;
                }
            }
        }

        let listener = UnixListener::bind(socket_path)?;
        info!(path = %socket_path.display(), "socket server listening");

        let connection_semaphore = Arc::new(Semaphore::new(config.max_connections));

        Ok(Self {
            config,
            listener,
            connection_semaphore,
        })
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Accepts a single connection.
    pub async fn accept(&self) -> ServerResult<Connection> {
        let permit = self
            .connection_semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore never closed");

        let (stream, _addr) = self.listener.accept().await?;
        debug!("accepted connection");

        Ok(Connection {
            stream,
            timeout: self.config.connection_timeout,
            _permit: permit,
        })
    }

    /// Accept loop with a shutdown future; each connection is handled in
    /// its own task. Accept errors are logged and do not end the loop.
    pub async fn run_until_shutdown<F, Fut, S>(&self, handler: F, shutdown: S) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
        S: std::future::Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accepted = self.accept() => match accepted {
                    Ok(connection) => {
                        tokio::spawn(handler(connection));
                    }
                    Err(e) => {
                        error!(error = %e, "failed to accept connection");
                    }
                },
                _ = &mut shutdown => {
                    info!("shutdown signal received");
                    return Ok(());
                }
            }
        }
    }
}

impl Drop for SocketServer {
    fn drop(&mut self) {
        if self.config.socket_path.exists()
            && let Err(e) = std::fs::remove_file(&self.config.socket_path)
        {
            warn!(
                path = %self.config.socket_path.display(),
                error = %e,
                "failed to remove socket file"
            );
        }
    }
}

/// A client connection to the daemon.
pub struct Connection {
    stream: UnixStream,
    timeout: std::time::Duration,
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl Connection {
    /// Reads a request envelope.
    ///
    /// Returns `Ok(None)` if the peer closed the connection cleanly.
    pub async fn read_request(&mut self) -> ServerResult<Option<Envelope<Request>>> {
        let Some(payload) = self.read_frame().await? else {
            return Ok(None);
        };

        let envelope: Envelope<Request> =
            serde_json::from_slice(&payload).map_err(ProtocolError::from)?;

        if !envelope.is_compatible() {
            warn!(
                version = %envelope.protocol_version,
                "incompatible protocol version, answering anyway"
            );
        }

        Ok(Some(envelope))
    }

    /// Sends a response for the given request.
    pub async fn respond(
        &mut self,
        request_id: impl Into<String>,
        response: Response,
    ) -> ServerResult<()> {
        let envelope = Envelope::response(request_id, response);
        let bytes = warptoggle_protocol::encode_message(&envelope)?;

        match timeout(self.timeout, self.stream.write_all(&bytes)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ServerError::Protocol(ProtocolError::Timeout {
                operation: "write response".to_string(),
            })),
        }
    }

    /// Reads one length-prefixed frame, `None` on clean EOF.
    async fn read_frame(&mut self) -> ServerResult<Option<Vec<u8>>> {
        let mut len_buf = [0u8; 4];
        match timeout(self.timeout, self.stream.read_exact(&mut len_buf)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(ServerError::Protocol(ProtocolError::Timeout {
                    operation: "read request length".to_string(),
                }));
            }
        }

        let len = u32::from_be_bytes(len_buf);
        if len == 0 {
            return Err(ServerError::Protocol(ProtocolError::EmptyMessage));
        }
        if len > MAX_MESSAGE_SIZE {
            return Err(ServerError::Protocol(ProtocolError::MessageTooLarge {
                size: len,
                max: MAX_MESSAGE_SIZE,
            }));
        }

        let mut payload = vec![0u8; len as usize];
        match timeout(self.timeout, self.stream.read_exact(&mut payload)).await {
            Ok(Ok(_)) => Ok(Some(payload)),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ServerError::Protocol(ProtocolError::Timeout {
                operation: "read request payload".to_string(),
            })),
        }
    }
}
