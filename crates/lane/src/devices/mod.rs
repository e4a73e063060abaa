//! Device implementations behind the lane ports
//!
//! - [`simulated`]: randomized devices for running without hardware
//! - [`hardware`]: coil/register-mapped devices over a [`hardware::FieldBus`]

pub mod hardware;
pub mod simulated;

pub use hardware::{
    CoilGate, CoilPresenceSensor, FieldBus, GateCoils, MemoryBus, RegisterDisplay,
    RegisterPlateCapture,
};
pub use simulated::{
    LogDisplay, SimulatedGate, SimulatedLink, SimulatedPlateCapture, SimulatedPresenceSensor,
};
