use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::billing::BillingConfig;
use crate::values::{Floor, Money, Timestamp};

/// Parking session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleStatus {
    /// Vehicle is inside the garage
    #[serde(rename = "estacionado")]
    Parked,
    /// Vehicle has left and was charged
    #[serde(rename = "saiu")]
    Departed,
    /// Vehicle is held by an operator
    #[serde(rename = "bloqueado")]
    Blocked,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parked => "estacionado",
            Self::Departed => "saiu",
            Self::Blocked => "bloqueado",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VehicleError {
    #[error("Vehicle {0} has already departed")]
    AlreadyDeparted(String),
}

/// A single parking session, from authorized entry to exit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub plate: String,
    pub entry_time: Timestamp,
    pub exit_time: Option<Timestamp>,
    pub floor: Floor,
    /// Slot index, when known
    pub slot: Option<usize>,
    pub status: VehicleStatus,
    pub fee: Option<Money>,
    pub duration_minutes: Option<i64>,
}

impl Vehicle {
    /// Start a new parking session
    pub fn park(plate: impl Into<String>, entry_time: Timestamp, floor: impl Into<Floor>) -> Self {
        Self {
            plate: plate.into(),
            entry_time,
            exit_time: None,
            floor: floor.into(),
            slot: None,
            status: VehicleStatus::Parked,
            fee: None,
            duration_minutes: None,
        }
    }

    /// Attach the slot the vehicle occupies
    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn is_parked(&self) -> bool {
        self.status == VehicleStatus::Parked
    }

    /// Close the session: stamps the exit, bills the stay and marks it departed
    ///
    /// An exit stamped before the entry is clamped to the entry time.
    /// Returns `(billed_minutes, fee)`.
    pub fn depart(
        &mut self,
        exit_time: Timestamp,
        billing: &BillingConfig,
    ) -> Result<(i64, Money), VehicleError> {
        if self.status == VehicleStatus::Departed {
            return Err(VehicleError::AlreadyDeparted(self.plate.clone()));
        }

        let exit_time = exit_time.max(self.entry_time);
        let (minutes, fee) = billing.charge(self.entry_time, exit_time);

        self.exit_time = Some(exit_time);
        self.duration_minutes = Some(minutes);
        self.fee = Some(fee);
        self.status = VehicleStatus::Departed;

        Ok((minutes, fee))
    }
}
