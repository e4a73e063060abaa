use garage_core::{EventKind, GateAction};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneKind {
    Entry,
    Exit,
}

impl LaneKind {
    /// Kind of event this lane sends
    pub fn event_kind(&self) -> EventKind {
        match self {
            LaneKind::Entry => EventKind::Entry,
            LaneKind::Exit => EventKind::Exit,
        }
    }

    /// Action that lets a vehicle through this lane
    pub fn authorizing_action(&self) -> GateAction {
        match self {
            LaneKind::Entry => GateAction::OpenGate,
            LaneKind::Exit => GateAction::Charge,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LaneKind::Entry => "entry",
            LaneKind::Exit => "exit",
        }
    }
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lane controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneState {
    #[default]
    Idle,
    VehicleDetected,
    CapturingPlate,
    AwaitingAuthorization,
    Opening,
    WaitingPassage,
    Closing,
    Denied,
    Error,
}

impl LaneState {
    /// Returns true while the gate may be open
    pub fn in_gate_cycle(&self) -> bool {
        matches!(
            self,
            LaneState::Opening | LaneState::WaitingPassage | LaneState::Closing
        )
    }
}

impl fmt::Display for LaneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LaneState::Idle => "idle",
            LaneState::VehicleDetected => "vehicle_detected",
            LaneState::CapturingPlate => "capturing_plate",
            LaneState::AwaitingAuthorization => "awaiting_authorization",
            LaneState::Opening => "opening",
            LaneState::WaitingPassage => "waiting_passage",
            LaneState::Closing => "closing",
            LaneState::Denied => "denied",
            LaneState::Error => "error",
        };
        f.write_str(name)
    }
}
