use serde::{Deserialize, Serialize};
use std::fmt;

use crate::values::Money;

/// Action the central authority instructs the lane to take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateAction {
    #[serde(rename = "abrir_cancela")]
    OpenGate,
    #[serde(rename = "cobrar_valor")]
    Charge,
    #[serde(rename = "negar_entrada")]
    DenyEntry,
    #[serde(rename = "negar_saida")]
    DenyExit,
    #[serde(rename = "erro")]
    Error,
}

impl GateAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenGate => "abrir_cancela",
            Self::Charge => "cobrar_valor",
            Self::DenyEntry => "negar_entrada",
            Self::DenyExit => "negar_saida",
            Self::Error => "erro",
        }
    }

    /// Returns true for the two denial actions
    pub fn is_denial(&self) -> bool {
        matches!(self, GateAction::DenyEntry | GateAction::DenyExit)
    }
}

impl fmt::Display for GateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision produced once per processed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    pub event_id: String,
    pub success: bool,
    pub action: GateAction,
    pub fee: Option<Money>,
    pub duration_minutes: Option<i64>,
    pub message: Option<String>,
}

impl EventResponse {
    fn new(event_id: impl Into<String>, success: bool, action: GateAction) -> Self {
        Self {
            event_id: event_id.into(),
            success,
            action,
            fee: None,
            duration_minutes: None,
            message: None,
        }
    }

    /// Authorized entry
    pub fn open_gate(event_id: impl Into<String>) -> Self {
        Self::new(event_id, true, GateAction::OpenGate)
    }

    /// Authorized exit with the amount due
    pub fn charge(event_id: impl Into<String>, fee: Money, duration_minutes: i64) -> Self {
        Self {
            fee: Some(fee),
            duration_minutes: Some(duration_minutes),
            ..Self::new(event_id, true, GateAction::Charge)
        }
    }

    pub fn deny_entry(event_id: impl Into<String>) -> Self {
        Self::new(event_id, false, GateAction::DenyEntry)
    }

    pub fn deny_exit(event_id: impl Into<String>) -> Self {
        Self::new(event_id, false, GateAction::DenyExit)
    }

    pub fn error(event_id: impl Into<String>) -> Self {
        Self::new(event_id, false, GateAction::Error)
    }

    /// Attach a human-readable message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
