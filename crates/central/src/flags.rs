//! Administrative flags and business-rule denials

use garage_core::{DEFAULT_FLOOR, EventKind, EventResponse, Floor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator commands, executed by the same actor that processes events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdminCommand {
    CloseGarage,
    OpenGarage,
    BlockFloor,
    UnblockFloor,
}

/// Garage-wide switches that gate every event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminFlags {
    pub closed: bool,
    pub floor_blocked: bool,
    /// Floor affected by `floor_blocked`
    pub blocked_floor: Floor,
}

impl AdminFlags {
    pub fn new(blocked_floor: impl Into<Floor>) -> Self {
        Self {
            closed: false,
            floor_blocked: false,
            blocked_floor: blocked_floor.into(),
        }
    }

    pub fn apply(&mut self, command: AdminCommand) {
        match command {
            AdminCommand::CloseGarage => self.closed = true,
            AdminCommand::OpenGarage => self.closed = false,
            AdminCommand::BlockFloor => self.floor_blocked = true,
            AdminCommand::UnblockFloor => self.floor_blocked = false,
        }
    }

    /// Denial imposed by the flags on an event for `floor`, if any
    ///
    /// A closed garage takes precedence over a blocked floor.
    pub fn check(&self, floor: &str) -> Option<Denial> {
        if self.closed {
            Some(Denial::GarageClosed)
        } else if self.floor_blocked && floor == self.blocked_floor {
            Some(Denial::FloorBlocked)
        } else {
            None
        }
    }
}

impl Default for AdminFlags {
    fn default() -> Self {
        Self::new(DEFAULT_FLOOR)
    }
}

/// Business-rule violations, answered with a denial rather than an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denial {
    AlreadyParked,
    NotParked,
    GarageClosed,
    FloorBlocked,
}

impl Denial {
    /// Text sent to the lane in `mensagem`
    pub fn message(&self) -> &'static str {
        match self {
            Denial::AlreadyParked => "Veículo já está estacionado",
            Denial::NotParked => "Veículo não encontrado",
            Denial::GarageClosed => "Estacionamento fechado",
            Denial::FloorBlocked => "Andar bloqueado",
        }
    }

    /// Denial response shaped for the direction of the event
    pub fn response(&self, event_id: impl Into<String>, kind: EventKind) -> EventResponse {
        let response = match kind {
            EventKind::Exit => EventResponse::deny_exit(event_id),
            _ => EventResponse::deny_entry(event_id),
        };
        response.with_message(self.message())
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garage_core::GateAction;

    #[test]
    fn test_default_flags_allow_everything() {
        let flags = AdminFlags::default();
        assert_eq!(flags.check("terreo"), None);
        assert_eq!(flags.blocked_floor, "terreo");
    }

    #[test]
    fn test_closed_wins_over_blocked_floor() {
        let mut flags = AdminFlags::default();
        flags.apply(AdminCommand::BlockFloor);
        flags.apply(AdminCommand::CloseGarage);
        assert_eq!(flags.check("terreo"), Some(Denial::GarageClosed));

        flags.apply(AdminCommand::OpenGarage);
        assert_eq!(flags.check("terreo"), Some(Denial::FloorBlocked));
        assert_eq!(flags.check("subsolo"), None);

        flags.apply(AdminCommand::UnblockFloor);
        assert_eq!(flags.check("terreo"), None);
    }

    #[test]
    fn test_denial_action_follows_event_kind() {
        let entry = Denial::GarageClosed.response("1", EventKind::Entry);
        assert_eq!(entry.action, GateAction::DenyEntry);
        assert_eq!(entry.message.as_deref(), Some("Estacionamento fechado"));

        let exit = Denial::FloorBlocked.response("2", EventKind::Exit);
        assert_eq!(exit.action, GateAction::DenyExit);
        assert!(!exit.success);
    }
}
