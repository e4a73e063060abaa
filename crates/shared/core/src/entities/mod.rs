mod billing;
mod event;
mod plate;
mod response;
mod stats;
mod vehicle;

pub use billing::BillingConfig;
pub use event::{Event, EventKind, EventStatus};
pub use plate::{Plate, PlateError};
pub use response::{EventResponse, GateAction};
pub use stats::DailyStats;
pub use vehicle::{Vehicle, VehicleError, VehicleStatus};
