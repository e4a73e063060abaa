use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Monetary amount in the garage currency - uses Decimal for precision
pub type Money = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Floor identifier as reported by the lanes (e.g. "terreo")
pub type Floor = String;

/// Floor used when a lane does not report one
pub const DEFAULT_FLOOR: &str = "terreo";
