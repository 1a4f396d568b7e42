//! Network infrastructure for the receiver application.
//!
//! The receiver is the passive end of the link: it listens on a TCP port,
//! feeds inbound bytes through the [`FrameDecoder`], acknowledges the
//! controller's handshake, and hands every batched event to the
//! [`Dispatcher`] in arrival order.
//!
//! Exactly one controller is served at a time. A new connection replaces the
//! previous one (the usual case: the controller reconnected after a network
//! hiccup before the old socket noticed it was dead).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use trackpad_core::protocol::messages::{ControlMessage, PROTOCOL_VERSION};
use trackpad_core::protocol::{encode_frame, FrameDecoder};

use crate::application::dispatch_events::Dispatcher;

/// Errors that can occur in the receiver network layer.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// The TCP listener could not be bound.
    #[error("failed to bind listener on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// The receiver's TCP server.
pub struct ReceiverServer {
    listener: TcpListener,
    server_name: String,
}

impl ReceiverServer {
    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverError::BindFailed`] if the address is unavailable.
    pub async fn bind(addr: SocketAddr, server_name: String) -> Result<Self, ReceiverError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ReceiverError::BindFailed { addr, source })?;
        info!(addr = %listener.local_addr().map(|a| a.to_string()).unwrap_or_default(),
              "receiver listening");
        Ok(Self {
            listener,
            server_name,
        })
    }

    /// The bound address. Useful when binding port 0 in tests.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// Accepts controllers forever, serving one at a time.
    pub async fn run(self, dispatcher: Arc<dyn Dispatcher>) {
        let mut active: Option<JoinHandle<()>> = None;
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    info!(%peer, "controller connected");
                    if let Some(previous) = active.take() {
                        // The newcomer wins; the old socket is usually a
                        // zombie left over from a reconnect.
                        debug!("replacing previous controller connection");
                        previous.abort();
                    }
                    let dispatcher = Arc::clone(&dispatcher);
                    let server_name = self.server_name.clone();
                    active = Some(tokio::spawn(serve_connection(
                        stream,
                        dispatcher,
                        server_name,
                    )));
                }
                Err(e) => {
                    warn!("accept failed: {e}");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

/// Serves one controller connection until EOF or error.
async fn serve_connection(
    mut stream: TcpStream,
    dispatcher: Arc<dyn Dispatcher>,
    server_name: String,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("could not set TCP_NODELAY: {e}");
    }

    let mut decoder = FrameDecoder::new();
    let mut read_buf = vec![0u8; 4096];

    loop {
        let n = match stream.read(&mut read_buf).await {
            Ok(0) => {
                info!("controller disconnected");
                return;
            }
            Ok(n) => n,
            Err(e) => {
                warn!("read error on controller connection: {e}");
                return;
            }
        };

        for msg in decoder.push(&read_buf[..n]) {
            match msg {
                ControlMessage::Handshake {
                    device_name,
                    protocol_version,
                } => {
                    info!(device = %device_name, version = protocol_version, "handshake received");
                    if protocol_version != PROTOCOL_VERSION {
                        warn!(
                            theirs = protocol_version,
                            ours = PROTOCOL_VERSION,
                            "protocol version mismatch"
                        );
                    }
                    let ack = ControlMessage::HandshakeAck {
                        success: true,
                        server_name: server_name.clone(),
                    };
                    match encode_frame(&ack) {
                        Ok(frame) => {
                            if let Err(e) = stream.write_all(&frame).await {
                                warn!("failed to send handshake ack: {e}");
                                return;
                            }
                        }
                        Err(e) => warn!("failed to encode handshake ack: {e}"),
                    }
                }
                ControlMessage::Batch { events, timestamp } => {
                    debug!(count = events.len(), timestamp, "dispatching batch");
                    for event in &events {
                        dispatcher.dispatch(event);
                    }
                }
                ControlMessage::HandshakeAck { .. } => {
                    warn!("unexpected handshake ack from controller, ignoring");
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_on_ephemeral_port_reports_local_addr() {
        // Arrange / Act
        let server = ReceiverServer::bind("127.0.0.1:0".parse().unwrap(), "test".to_string())
            .await
            .expect("bind must succeed");

        // Assert
        let addr = server.local_addr().expect("must expose the bound address");
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_same_port_twice_fails() {
        let first = ReceiverServer::bind("127.0.0.1:0".parse().unwrap(), "test".to_string())
            .await
            .unwrap();
        let addr = first.local_addr().unwrap();

        let second = ReceiverServer::bind(addr, "test".to_string()).await;

        assert!(matches!(second, Err(ReceiverError::BindFailed { .. })));
    }
}
