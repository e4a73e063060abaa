use garage_core::Timestamp;

/// Port for time abstraction
///
/// Lanes stamp events with this clock and the central authority uses it to
/// decide what "today" means for statistics:
/// - Real system time for production
/// - Manually advanced time for deterministic tests
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
