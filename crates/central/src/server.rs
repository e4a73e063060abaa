//! TCP front end
//!
//! One task per connection. Each connection carries exactly one request
//! line and one reply line. Bytes that are not JSON are logged and the
//! connection is dropped without a reply.

use garage_core::EventResponse;
use garage_gateway::{EventMessage, ResponseMessage, TransportError, read_frame, write_frame};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;

use crate::actor::CentralHandle;
use crate::authority::local_id;
use crate::error::Result;

/// How long a connection may stay silent before its request line arrives
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CentralServer {
    handle: CentralHandle,
    read_timeout: Duration,
}

impl CentralServer {
    pub fn new(handle: CentralHandle) -> Self {
        Self {
            handle,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn handle(&self) -> &CentralHandle {
        &self.handle
    }

    /// Bind the listening socket, e.g. `"127.0.0.1:8080"`
    pub async fn bind(address: &str) -> Result<TcpListener> {
        Ok(TcpListener::bind(address).await?)
    }

    /// Accept connections until `shutdown` flips to true
    ///
    /// Connections already accepted run to completion.
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!("Central server listening on {}", listener.local_addr()?);

        while !*shutdown.borrow() {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let handle = self.handle.clone();
                        let read_timeout = self.read_timeout;
                        tokio::spawn(async move {
                            handle_connection(handle, stream, peer, read_timeout).await;
                        });
                    }
                    Err(e) => warn!("Failed to accept connection: {}", e),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Central server stopped accepting connections");
        Ok(())
    }
}

async fn handle_connection(
    handle: CentralHandle,
    stream: TcpStream,
    peer: SocketAddr,
    read_timeout: Duration,
) {
    let _client = handle.track_client();
    debug!("Client connected: {}", peer);

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let frame = match timeout(read_timeout, read_frame(&mut reader)).await {
        Ok(Ok(Some(frame))) => frame,
        Ok(Ok(None)) => {
            debug!("Client {} closed without a request", peer);
            return;
        }
        Ok(Err(e)) => {
            warn!("Dropping connection from {}: {}", peer, e);
            return;
        }
        Err(_) => {
            warn!("Dropping connection from {}: no request within {:?}", peer, read_timeout);
            return;
        }
    };

    let reply = match EventMessage::decode(&frame) {
        Ok(msg) => match handle.process(msg.into()).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Cannot process request from {}: {}", peer, e);
                return;
            }
        },
        Err(TransportError::InvalidMessage(reason)) => {
            warn!("Invalid event from {}: {}", peer, reason);
            EventResponse::error(local_id()).with_message(reason)
        }
        Err(e) => {
            warn!("Malformed JSON from {}: {} ({})", peer, e, frame);
            return;
        }
    };

    if let Err(e) = write_frame(&mut write_half, &ResponseMessage::from(&reply)).await {
        warn!("Failed to reply to {}: {}", peer, e);
    }
    debug!("Client disconnected: {}", peer);
}
