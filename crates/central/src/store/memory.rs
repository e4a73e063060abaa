use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use garage_core::{DailyStats, Event, EventKind, EventStatus, Timestamp, Vehicle};
use garage_ports::{PersistenceError, PersistenceResult, PersistenceStore};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// A session is identified by plate and entry time
type SessionKey = (String, Timestamp);

fn session_key(vehicle: &Vehicle) -> SessionKey {
    (vehicle.plate.clone(), vehicle.entry_time)
}

/// In-memory event log and session table
///
/// Ids are assigned sequentially from 1, like an autoincrement column.
pub struct InMemoryStore {
    next_id: AtomicU64,
    events: Mutex<Vec<Event>>,
    sessions: DashMap<SessionKey, Vehicle>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            events: Mutex::new(Vec::new()),
            sessions: DashMap::new(),
        }
    }

    /// All events in the order they were saved
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// All sessions, oldest entry first
    pub fn vehicles(&self) -> Vec<Vehicle> {
        let mut vehicles: Vec<Vehicle> = self.sessions.iter().map(|v| v.value().clone()).collect();
        vehicles.sort_by(|a, b| a.entry_time.cmp(&b.entry_time).then(a.plate.cmp(&b.plate)));
        vehicles
    }

    pub fn has_session(&self, vehicle: &Vehicle) -> bool {
        self.sessions.contains_key(&session_key(vehicle))
    }

    /// Reserve the next event id
    pub(crate) fn allocate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    /// Insert an event that already carries its id
    ///
    /// Numeric ids move the sequence past them so replayed logs keep
    /// handing out fresh ids.
    pub(crate) fn restore_event(&self, event: Event) {
        if let Some(id) = event.id.as_deref().and_then(|id| id.parse::<u64>().ok()) {
            self.next_id.fetch_max(id + 1, Ordering::SeqCst);
        }
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    /// Insert or overwrite a session
    pub(crate) fn restore_vehicle(&self, vehicle: Vehicle) {
        self.sessions.insert(session_key(&vehicle), vehicle);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceStore for InMemoryStore {
    async fn save_event(&self, event: &Event) -> PersistenceResult<String> {
        let id = self.allocate_id();
        let mut record = event.clone();
        record.id = Some(id.clone());
        self.restore_event(record);
        Ok(id)
    }

    async fn save_vehicle(&self, vehicle: &Vehicle) -> PersistenceResult<()> {
        self.restore_vehicle(vehicle.clone());
        Ok(())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> PersistenceResult<()> {
        match self.sessions.get_mut(&session_key(vehicle)) {
            Some(mut entry) => {
                *entry = vehicle.clone();
                Ok(())
            }
            None => Err(PersistenceError::SessionNotFound {
                plate: vehicle.plate.clone(),
                entry_time: vehicle.entry_time.to_rfc3339(),
            }),
        }
    }

    async fn daily_stats(&self, date: NaiveDate) -> PersistenceResult<DailyStats> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let mut stats = DailyStats::empty(date);

        for event in events
            .iter()
            .filter(|e| e.status == EventStatus::Completed && e.timestamp.date_naive() == date)
        {
            match event.kind {
                EventKind::Entry => stats.entries += 1,
                EventKind::Exit => {
                    stats.exits += 1;
                    if let Some(fee) = event.fee {
                        stats.revenue += fee;
                    }
                }
                _ => {}
            }
        }
        Ok(stats)
    }

    fn name(&self) -> &str {
        "InMemoryStore"
    }
}
