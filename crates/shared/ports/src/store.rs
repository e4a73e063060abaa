use async_trait::async_trait;
use chrono::NaiveDate;
use garage_core::{DailyStats, Event, Vehicle};

use crate::error::PersistenceResult;

/// Port for the event log and vehicle session records
///
/// Events are append-only. A vehicle record is written once on entry and
/// updated once on exit; it is identified by plate and entry time.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Append an event, returning its store-assigned id
    async fn save_event(&self, event: &Event) -> PersistenceResult<String>;

    /// Record a new parking session
    async fn save_vehicle(&self, vehicle: &Vehicle) -> PersistenceResult<()>;

    /// Overwrite the session matching the vehicle's plate and entry time
    async fn update_vehicle(&self, vehicle: &Vehicle) -> PersistenceResult<()>;

    /// Completed entries, exits and revenue for a calendar day
    async fn daily_stats(&self, date: NaiveDate) -> PersistenceResult<DailyStats>;

    fn name(&self) -> &str {
        "PersistenceStore"
    }
}
