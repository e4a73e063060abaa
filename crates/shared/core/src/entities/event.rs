use serde::{Deserialize, Serialize};
use std::fmt;

use crate::values::{DEFAULT_FLOOR, Floor, Money, Timestamp};

/// Kind of lane transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "entrada")]
    Entry,
    #[serde(rename = "saida")]
    Exit,
    #[serde(rename = "erro")]
    Error,
    #[serde(rename = "manutencao")]
    Maintenance,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entrada",
            Self::Exit => "saida",
            Self::Error => "erro",
            Self::Maintenance => "manutencao",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing status of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventStatus {
    #[default]
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "processando")]
    Processing,
    #[serde(rename = "concluido")]
    Completed,
    #[serde(rename = "erro")]
    Error,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pendente",
            Self::Processing => "processando",
            Self::Completed => "concluido",
            Self::Error => "erro",
        }
    }

    /// Returns true once the event will not change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Error)
    }
}

/// A single lane transaction attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identifier (None until persisted)
    pub id: Option<String>,
    /// Plate as captured by the lane
    pub plate: String,
    pub kind: EventKind,
    pub timestamp: Timestamp,
    /// Recognition confidence in `[0, 1]`
    pub confidence: f64,
    pub floor: Floor,
    pub status: EventStatus,
    pub fee: Option<Money>,
    pub duration_minutes: Option<i64>,
    pub error_description: Option<String>,
    /// Slot the entry lane reserved for the vehicle
    #[serde(default)]
    pub slot: Option<usize>,
}

impl Event {
    /// Create a pending event on the default floor
    pub fn new(plate: impl Into<String>, kind: EventKind, timestamp: Timestamp, confidence: f64) -> Self {
        Self {
            id: None,
            plate: plate.into(),
            kind,
            timestamp,
            confidence,
            floor: DEFAULT_FLOOR.to_string(),
            status: EventStatus::Pending,
            fee: None,
            duration_minutes: None,
            error_description: None,
            slot: None,
        }
    }

    /// Convenience constructor for an entry attempt
    pub fn entry(plate: impl Into<String>, timestamp: Timestamp, confidence: f64) -> Self {
        Self::new(plate, EventKind::Entry, timestamp, confidence)
    }

    /// Convenience constructor for an exit attempt
    pub fn exit(plate: impl Into<String>, timestamp: Timestamp, confidence: f64) -> Self {
        Self::new(plate, EventKind::Exit, timestamp, confidence)
    }

    /// Set the floor
    pub fn on_floor(mut self, floor: impl Into<Floor>) -> Self {
        self.floor = floor.into();
        self
    }

    pub fn in_slot(mut self, slot: Option<usize>) -> Self {
        self.slot = slot;
        self
    }

    /// Mark the event completed
    pub fn complete(&mut self) {
        self.status = EventStatus::Completed;
    }

    /// Mark the event completed with the computed charge
    pub fn complete_with_charge(&mut self, minutes: i64, fee: Money) {
        self.duration_minutes = Some(minutes);
        self.fee = Some(fee);
        self.status = EventStatus::Completed;
    }

    /// Mark the event failed with a reason
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.error_description = Some(reason.into());
        self.status = EventStatus::Error;
    }
}
