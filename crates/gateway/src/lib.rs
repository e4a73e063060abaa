//! Garage Gateway
//!
//! Transport layer between the lane controllers and the central authority.
//! Provides:
//! - Wire message types (`EventMessage`, `ResponseMessage`) with the
//!   JSON field names the lanes and central agree on
//! - Line framing: one JSON object per line, one request and one reply
//!   per connection
//! - The `Requester` trait with a TCP implementation and an in-process
//!   channel implementation for tests
//!
//! ## Architecture
//!
//! ```text
//! Lane Controller (entry / exit)
//!         │  Event
//!    ┌────▼─────────┐
//!    │ TcpRequester │  connect → write line → read line → close
//!    └────┬─────────┘
//!         │ {"placa": ..., "tipo": "entrada", ...}\n
//!    ┌────▼─────────┐
//!    │ CentralServer│  (garage-central)
//!    └──────────────┘
//! ```

pub mod error;
pub mod messages;
pub mod transport;

// Re-export commonly used types
pub use error::TransportError;
pub use messages::{EventMessage, ResponseMessage};
pub use transport::{
    ClientConfig, MAX_FRAME_LEN, Requester,
    channel::{ChannelRequester, ChannelResponder},
    line::{encode_frame, read_frame, write_frame},
    tcp::TcpRequester,
};
