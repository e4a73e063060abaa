use async_trait::async_trait;
use chrono::NaiveDate;
use garage_core::{DailyStats, Event, Vehicle};
use garage_ports::{PersistenceError, PersistenceResult, PersistenceStore};
use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::memory::InMemoryStore;

const EVENTS_FILE: &str = "events.jsonl";
const VEHICLES_FILE: &str = "vehicles.jsonl";

/// Append-only JSON-lines journal
///
/// `events.jsonl` holds one line per saved event; `vehicles.jsonl` holds
/// one line per session version, the last line for a plate and entry time
/// being current. Both files are replayed into an [`InMemoryStore`] on
/// open, which then answers reads.
pub struct JournalStore {
    dir: PathBuf,
    index: InMemoryStore,
    events: Mutex<File>,
    vehicles: Mutex<File>,
}

impl JournalStore {
    /// Open (or create) a journal in `dir`
    pub async fn open(dir: impl AsRef<Path>) -> PersistenceResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await.map_err(io_error)?;

        let index = InMemoryStore::new();
        let events: Vec<Event> = replay(&dir.join(EVENTS_FILE)).await?;
        let vehicles: Vec<Vehicle> = replay(&dir.join(VEHICLES_FILE)).await?;
        info!(
            "Journal {} replayed: {} events, {} session versions",
            dir.display(),
            events.len(),
            vehicles.len()
        );
        events.into_iter().for_each(|e| index.restore_event(e));
        vehicles.into_iter().for_each(|v| index.restore_vehicle(v));

        Ok(Self {
            events: Mutex::new(open_append(&dir.join(EVENTS_FILE)).await?),
            vehicles: Mutex::new(open_append(&dir.join(VEHICLES_FILE)).await?),
            dir,
            index,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replayed and written state
    pub fn index(&self) -> &InMemoryStore {
        &self.index
    }
}

#[async_trait]
impl PersistenceStore for JournalStore {
    async fn save_event(&self, event: &Event) -> PersistenceResult<String> {
        // Holding the file lock keeps ids in file order
        let mut file = self.events.lock().await;
        let id = self.index.allocate_id();
        let mut record = event.clone();
        record.id = Some(id.clone());

        append(&mut file, &record).await?;
        self.index.restore_event(record);
        Ok(id)
    }

    async fn save_vehicle(&self, vehicle: &Vehicle) -> PersistenceResult<()> {
        let mut file = self.vehicles.lock().await;
        append(&mut file, vehicle).await?;
        self.index.restore_vehicle(vehicle.clone());
        Ok(())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> PersistenceResult<()> {
        if !self.index.has_session(vehicle) {
            return Err(PersistenceError::SessionNotFound {
                plate: vehicle.plate.clone(),
                entry_time: vehicle.entry_time.to_rfc3339(),
            });
        }
        self.save_vehicle(vehicle).await
    }

    async fn daily_stats(&self, date: NaiveDate) -> PersistenceResult<DailyStats> {
        self.index.daily_stats(date).await
    }

    fn name(&self) -> &str {
        "JournalStore"
    }
}

fn io_error(e: std::io::Error) -> PersistenceError {
    PersistenceError::Io(e.to_string())
}

async fn open_append(path: &Path) -> PersistenceResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(io_error)
}

async fn append<T: Serialize>(file: &mut File, record: &T) -> PersistenceResult<()> {
    let mut line =
        serde_json::to_string(record).map_err(|e| PersistenceError::Encoding(e.to_string()))?;
    line.push('\n');
    file.write_all(line.as_bytes()).await.map_err(io_error)?;
    file.flush().await.map_err(io_error)
}

/// Read every record of a journal file, skipping lines that do not parse
async fn replay<T: DeserializeOwned>(path: &Path) -> PersistenceResult<Vec<T>> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(e)),
    };

    let mut records = Vec::new();
    for (number, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping {} line {}: {}", path.display(), number + 1, e),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use garage_core::{BillingConfig, Timestamp};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("garage-journal-{}", Uuid::new_v4()))
    }

    fn entry_time() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_reopen_restores_events_and_sessions() {
        let dir = temp_dir();

        {
            let store = JournalStore::open(&dir).await.unwrap();
            let mut entry = Event::entry("ABC1234", entry_time(), 0.9);
            entry.complete();
            assert_eq!(store.save_event(&entry).await.unwrap(), "1");

            let mut vehicle = Vehicle::park("ABC1234", entry_time(), "terreo");
            store.save_vehicle(&vehicle).await.unwrap();
            vehicle
                .depart(entry_time() + Duration::minutes(30), &BillingConfig::default())
                .unwrap();
            store.update_vehicle(&vehicle).await.unwrap();
        }

        let reopened = JournalStore::open(&dir).await.unwrap();
        assert_eq!(reopened.index().events().len(), 1);
        let sessions = reopened.index().vehicles();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].fee, Some(dec!(4.50)));

        // Ids continue after the replayed ones
        let next = reopened
            .save_event(&Event::exit("ABC1234", entry_time(), 0.9))
            .await
            .unwrap();
        assert_eq!(next, "2");

        let stats = reopened.daily_stats(entry_time().date_naive()).await.unwrap();
        assert_eq!(stats.entries, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_corrupt_lines_are_skipped() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(EVENTS_FILE), "not json\n\n").unwrap();

        let store = JournalStore::open(&dir).await.unwrap();
        assert!(store.index().events().is_empty());
        assert_eq!(
            store
                .save_event(&Event::entry("ABC1234", entry_time(), 0.9))
                .await
                .unwrap(),
            "1"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_update_unknown_session() {
        let dir = temp_dir();
        let store = JournalStore::open(&dir).await.unwrap();

        let vehicle = Vehicle::park("ABC1234", entry_time(), "terreo");
        let result = store.update_vehicle(&vehicle).await;
        assert!(matches!(result, Err(PersistenceError::SessionNotFound { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
