use garage_core::Timestamp;
use garage_ports::Clock;
use chrono::{Duration, Utc};
use std::sync::{Arc, RwLock};

/// Frozen clock that only advances when explicitly moved
///
/// Shared behind an `Arc` so a test can advance the time seen by a lane or
/// the central authority while they run.
pub struct ManualClock {
    current: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at the current wall time
    pub fn new() -> Arc<Self> {
        Self::starting_at(Utc::now())
    }

    /// Create a clock frozen at `time`
    pub fn starting_at(time: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(time),
        })
    }

    /// Move the clock forward (or backward, with a negative duration)
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }

    /// Jump to an explicit time
    pub fn set(&self, time: Timestamp) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
