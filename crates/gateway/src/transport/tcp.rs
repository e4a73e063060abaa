//! TCP requester
//!
//! Each request opens a new connection, writes one frame, reads one
//! frame and closes. The whole exchange runs under the configured timeout.

use crate::error::TransportError;
use crate::messages::{EventMessage, ResponseMessage};
use crate::transport::{ClientConfig, Requester, line};
use async_trait::async_trait;
use garage_core::{Event, EventResponse};
use log::debug;
use tokio::io::BufReader;
use tokio::net::TcpStream;

/// Sends lane events to the central authority over TCP
#[derive(Debug, Clone)]
pub struct TcpRequester {
    config: ClientConfig,
}

impl TcpRequester {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn exchange(&self, msg: &EventMessage) -> Result<ResponseMessage, TransportError> {
        let address = self.config.address();
        let stream = TcpStream::connect(&address)
            .await
            .map_err(|e| TransportError::Connection(format!("{address}: {e}")))?;
        let (read_half, mut write_half) = stream.into_split();

        line::write_frame(&mut write_half, msg).await?;

        let mut reader = BufReader::new(read_half);
        let frame = line::read_frame(&mut reader)
            .await?
            .ok_or(TransportError::ConnectionClosed)?;
        ResponseMessage::decode(&frame)
    }
}

#[async_trait]
impl Requester<Event, EventResponse> for TcpRequester {
    async fn request(&self, req: &Event) -> Result<EventResponse, TransportError> {
        let msg = EventMessage::from(req);
        debug!(
            "Sending {} for {} to {}",
            msg.tipo,
            msg.placa,
            self.config.address()
        );

        let reply = tokio::time::timeout(self.config.timeout, self.exchange(&msg))
            .await
            .map_err(|_| TransportError::Timeout)??;

        debug!("Reply for {}: {} ({})", msg.placa, reply.acao, reply.evento_id);
        Ok(reply.into())
    }
}
