//! Error types for lane controllers
//!
//! Every variant is recoverable: the lane logs it, enters `Error` and
//! returns to `Idle` after the backoff.

use garage_core::PlateError;
use garage_gateway::TransportError;
use garage_ports::HardwareError;
use thiserror::Error;

/// Capture rejected locally; the central authority is never contacted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No plate recognized")]
    NoPlate,

    #[error("Confidence {confidence:.2} for {plate} below minimum {minimum:.2}")]
    LowConfidence {
        plate: String,
        confidence: f64,
        minimum: f64,
    },

    #[error("Invalid plate: {0}")]
    InvalidPlate(#[from] PlateError),
}

#[derive(Error, Debug)]
pub enum LaneError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Central authority unreachable: {0}")]
    Protocol(#[from] TransportError),

    #[error("Hardware failure: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Vehicle did not pass the gate in time")]
    PassageTimeout,
}

pub type Result<T> = std::result::Result<T, LaneError>;
