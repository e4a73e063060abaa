//! Garage Lane
//!
//! One `LaneController` per physical gate. Each controller is a state
//! machine that detects a vehicle, captures its plate, asks the central
//! authority for a decision and drives the gate cycle.
//!
//! ## State machine
//!
//! ```text
//!  Idle ──► VehicleDetected ──► CapturingPlate ──► AwaitingAuthorization
//!   ▲                                                 │            │
//!   │                                       authorized│            │denied
//!   │                                                 ▼            ▼
//!   ├──────────── Closing ◄── WaitingPassage ◄──── Opening       Denied
//!   │                                                              │
//!   ├──────────────────────────────────────────────────────────────┘
//!   │
//!   └── Error (after error_backoff) ◄── any failure
//! ```
//!
//! Entry and exit lanes share nothing but the [`garage_slots::SlotBoard`].

pub mod config;
pub mod controller;
pub mod devices;
pub mod display;
pub mod error;
pub mod state;

pub use config::{LaneConfig, SlotPolicy};
pub use controller::{LaneController, LaneDevices, LaneStatus};
pub use display::DisplayRefresher;
pub use error::{LaneError, Result, ValidationError};
pub use state::{LaneKind, LaneState};
