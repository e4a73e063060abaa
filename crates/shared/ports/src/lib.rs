//! Garage Ports
//!
//! Port definitions (traits) for the parking garage system.
//! These define the boundaries between lane/central logic and the
//! hardware, persistence and time infrastructure behind them.

mod clock;
mod devices;
mod error;
mod link;
mod store;

pub use clock::Clock;
pub use devices::{DisplayPanel, GateDriver, PlateCapture, PlateReading, PresenceSensor};
pub use error::{HardwareError, HardwareResult, PersistenceError, PersistenceResult};
pub use link::{DeviceLink, LinkGuard};
pub use store::PersistenceStore;
