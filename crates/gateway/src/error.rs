//! Error types for the gateway crate

use thiserror::Error;

/// Transport-level errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The bytes on the wire are not JSON
    #[error("Deserialization failed: {0}")]
    Deserialization(String),

    /// Valid JSON that does not describe the expected message
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Frame exceeds {limit} bytes")]
    FrameTooLong { limit: usize },

    #[error("Connection closed before a reply was received")]
    ConnectionClosed,

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Timeout waiting for response")]
    Timeout,
}

impl TransportError {
    /// Returns true if the peer sent bytes that matched no message at all
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            TransportError::Deserialization(_) | TransportError::FrameTooLong { .. }
        )
    }
}
