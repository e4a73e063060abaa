use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::Money;

/// Lane activity summary for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    /// Completed entries
    pub entries: u64,
    /// Completed exits
    pub exits: u64,
    /// Sum of fees charged on completed exits
    pub revenue: Money,
}

impl DailyStats {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            entries: 0,
            exits: 0,
            revenue: Decimal::ZERO,
        }
    }
}
