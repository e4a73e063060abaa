use async_trait::async_trait;
use std::time::Duration;

use crate::error::HardwareResult;

/// A plate as read by the recognition camera
#[derive(Debug, Clone, PartialEq)]
pub struct PlateReading {
    /// Raw plate text, not yet validated
    pub plate: String,
    /// Recognition confidence in `[0, 1]`
    pub confidence: f64,
}

impl PlateReading {
    pub fn new(plate: impl Into<String>, confidence: f64) -> Self {
        Self {
            plate: plate.into(),
            confidence,
        }
    }
}

/// Port for a lane's barrier gate and its passage sensor
#[async_trait]
pub trait GateDriver: Send + Sync {
    /// Drive the barrier open
    async fn open(&self) -> HardwareResult<()>;

    /// Drive the barrier closed
    async fn close(&self) -> HardwareResult<()>;

    /// Wait until a vehicle crosses the gate, up to `timeout`
    ///
    /// Returns `Ok(false)` when the timeout elapses without a passage.
    async fn sense_passage(&self, timeout: Duration) -> HardwareResult<bool>;
}

/// Port for the loop/presence sensor in front of a lane
#[async_trait]
pub trait PresenceSensor: Send + Sync {
    /// Returns true if a vehicle is waiting at the lane
    async fn detect(&self) -> HardwareResult<bool>;
}

/// Port for the licence plate recognition camera
#[async_trait]
pub trait PlateCapture: Send + Sync {
    /// Capture a plate; `Ok(None)` means nothing was recognized
    async fn capture(&self) -> HardwareResult<Option<PlateReading>>;
}

/// Port for the free-slot display at the garage entrance
#[async_trait]
pub trait DisplayPanel: Send + Sync {
    /// Show the current number of free slots
    async fn show(&self, free: usize, total: usize) -> HardwareResult<()>;
}
