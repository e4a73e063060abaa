//! Garage Core Domain
//!
//! Pure domain types for the parking garage system.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Billing
    BillingConfig,
    DailyStats,
    // Lane transactions
    Event,
    EventKind,
    EventResponse,
    EventStatus,
    GateAction,
    // Identity
    Plate,
    PlateError,
    // Parking sessions
    Vehicle,
    VehicleError,
    VehicleStatus,
};
pub use values::{DEFAULT_FLOOR, Floor, Money, Timestamp};
