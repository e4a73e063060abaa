use thiserror::Error;

/// Failures reported by gate, sensor, camera and display drivers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HardwareError {
    #[error("Device link not connected: {0}")]
    NotConnected(String),

    #[error("Device {device} failed: {reason}")]
    Device { device: String, reason: String },

    #[error("Bus read failed at address {address}: {reason}")]
    Read { address: u16, reason: String },

    #[error("Bus write failed at address {address}: {reason}")]
    Write { address: u16, reason: String },

    #[error("Device operation timed out: {0}")]
    Timeout(String),
}

pub type HardwareResult<T> = std::result::Result<T, HardwareError>;

/// Failures reported by the event/vehicle store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Storage I/O failed: {0}")]
    Io(String),

    #[error("Record encoding failed: {0}")]
    Encoding(String),

    #[error("Vehicle session not found: {plate} entered at {entry_time}")]
    SessionNotFound { plate: String, entry_time: String },
}

pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;
