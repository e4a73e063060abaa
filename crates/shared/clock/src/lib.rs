//! Garage Clock Infrastructure
//!
//! Provides time sources for lanes and the central authority:
//!
//! - [`SystemClock`]: wall-clock time for production
//! - [`ManualClock`]: frozen time that only moves when told to, for
//!   deterministic billing tests
//!
//! ## Usage
//!
//! ```ignore
//! use garage_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::starting_at(entry_time);
//! let t0 = clock.now();
//! clock.advance(Duration::minutes(30));
//! assert_eq!(clock.now() - t0, Duration::minutes(30));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use garage_ports::Clock;
