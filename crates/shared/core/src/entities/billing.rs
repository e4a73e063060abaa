use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{Money, Timestamp};

/// Seconds in a billed minute
const SECONDS_PER_MINUTE: i64 = 60;

/// Time-based tariff applied when a vehicle leaves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Price charged for each started minute
    pub rate_per_minute: Money,

    /// Floor applied to every charge
    pub minimum_fee: Money,
}

impl BillingConfig {
    /// Create a new tariff
    pub fn new(rate_per_minute: Money, minimum_fee: Money) -> Self {
        Self {
            rate_per_minute,
            minimum_fee,
        }
    }

    /// Minutes billed for a stay, rounding any started minute up
    ///
    /// An exit stamped before the entry bills zero minutes.
    pub fn billed_minutes(entry: Timestamp, exit: Timestamp) -> i64 {
        let elapsed = exit - entry;
        if elapsed <= chrono::Duration::zero() {
            return 0;
        }

        let seconds = elapsed.num_seconds();
        let minutes = seconds / SECONDS_PER_MINUTE;
        let has_remainder = seconds % SECONDS_PER_MINUTE > 0 || elapsed.subsec_nanos() > 0;

        if has_remainder { minutes + 1 } else { minutes }
    }

    /// Fee for a number of billed minutes: `max(minutes * rate, minimum)`
    pub fn fee_for(&self, minutes: i64) -> Money {
        let fee = Decimal::from(minutes.max(0)) * self.rate_per_minute;
        fee.max(self.minimum_fee).max(Decimal::ZERO)
    }

    /// Billed minutes and fee for a stay
    pub fn charge(&self, entry: Timestamp, exit: Timestamp) -> (i64, Money) {
        let minutes = Self::billed_minutes(entry, exit);
        (minutes, self.fee_for(minutes))
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            rate_per_minute: Decimal::new(15, 2), // 0.15 per minute
            minimum_fee: Decimal::new(200, 2),    // 2.00 minimum
        }
    }
}
