//! Lane controller configuration

use garage_core::{DEFAULT_FLOOR, Floor};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How an exit lane decides which slot to release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPolicy {
    /// Release the lowest occupied slot
    #[default]
    FirstOccupied,
    /// Bind the slot to the plate on entry and release that slot on exit,
    /// falling back to the lowest occupied slot
    PlateBound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaneConfig {
    /// Captures below this confidence are rejected locally
    pub min_confidence: f64,
    /// Bound on the round-trip to the central authority
    pub request_timeout: Duration,
    pub passage_timeout: Duration,
    /// Pause in `Error` before returning to `Idle`
    pub error_backoff: Duration,
    /// Pause between presence checks while `Idle`
    pub poll_interval: Duration,
    pub floor: Floor,
    pub slot_policy: SlotPolicy,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.8,
            request_timeout: Duration::from_secs(5),
            passage_timeout: Duration::from_secs(10),
            error_backoff: Duration::from_secs(10),
            poll_interval: Duration::from_secs(1),
            floor: DEFAULT_FLOOR.to_string(),
            slot_policy: SlotPolicy::default(),
        }
    }
}
