//! Transport abstraction layer
//!
//! Lanes talk to the central authority through `Requester`: one request,
//! one reply. The TCP requester opens a fresh connection per call; the
//! channel requester keeps everything in-process.

pub mod channel;
pub mod config;
pub mod line;
pub mod tcp;

pub use config::ClientConfig;

use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// Upper bound on a single frame, newline included
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Request/Reply pattern (one lane event, one decision)
#[async_trait]
pub trait Requester<Req, Res>: Send + Sync
where
    Req: Serialize + Send + Sync,
    Res: DeserializeOwned + Send,
{
    /// Send a request and wait for a response
    async fn request(&self, req: &Req) -> Result<Res, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use garage_core::{Event, EventResponse};

    // Ensure the trait is object-safe
    fn _assert_requester_object_safe(_: &dyn Requester<Event, EventResponse>) {}
}
