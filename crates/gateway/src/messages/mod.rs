//! Wire message types for lane <-> central communication
//!
//! Field names follow the JSON contract shared with the lanes, so these
//! types stay separate from the domain types in `garage-core`.

pub mod event;
pub mod response;
mod timestamp;

pub use event::EventMessage;
pub use response::ResponseMessage;

use crate::error::TransportError;
use serde::de::DeserializeOwned;

/// Decode one frame, separating "not JSON" from "JSON of the wrong shape"
pub(crate) fn decode<M: DeserializeOwned>(frame: &str) -> Result<M, TransportError> {
    let value: serde_json::Value = serde_json::from_str(frame)
        .map_err(|e| TransportError::Deserialization(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| TransportError::InvalidMessage(e.to_string()))
}
