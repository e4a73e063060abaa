//! Authoritative vehicle state and the event decision procedure

use garage_core::{BillingConfig, DailyStats, Event, EventKind, EventResponse, Floor, Vehicle};
use garage_ports::{Clock, PersistenceStore};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::flags::{AdminCommand, AdminFlags, Denial};

/// Snapshot reported to operators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralStats {
    pub parked: usize,
    pub closed: bool,
    pub floor_blocked: bool,
    pub blocked_floor: Floor,
    pub today: DailyStats,
    pub connected_clients: usize,
}

/// Parked-vehicle map, admin flags and tariff
///
/// Not synchronized: exactly one task owns it (see [`crate::CentralActor`]).
pub struct CentralAuthority {
    parked: HashMap<String, Vehicle>,
    flags: AdminFlags,
    billing: BillingConfig,
    store: Arc<dyn PersistenceStore>,
    clock: Arc<dyn Clock>,
}

impl CentralAuthority {
    pub fn new(
        billing: BillingConfig,
        store: Arc<dyn PersistenceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            parked: HashMap::new(),
            flags: AdminFlags::default(),
            billing,
            store,
            clock,
        }
    }

    pub fn with_flags(mut self, flags: AdminFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn flags(&self) -> &AdminFlags {
        &self.flags
    }

    pub fn billing(&self) -> &BillingConfig {
        &self.billing
    }

    pub fn is_parked(&self, plate: &str) -> bool {
        self.parked.contains_key(plate)
    }

    /// Current sessions, oldest entry first
    pub fn parked_vehicles(&self) -> Vec<Vehicle> {
        let mut vehicles: Vec<Vehicle> = self.parked.values().cloned().collect();
        vehicles.sort_by_key(|v| v.entry_time);
        vehicles
    }

    /// Apply an operator command and return the resulting flags
    pub fn apply(&mut self, command: AdminCommand) -> AdminFlags {
        self.flags.apply(command);
        info!(
            "Admin {:?}: closed={} floor_blocked={} ({})",
            command, self.flags.closed, self.flags.floor_blocked, self.flags.blocked_floor
        );
        self.flags.clone()
    }

    /// Operator snapshot; connected clients are filled in by the server side
    pub async fn stats(&self) -> CentralStats {
        let date = self.clock.now().date_naive();
        let today = match self.store.daily_stats(date).await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Failed to read daily stats from {}: {}", self.store.name(), e);
                DailyStats::empty(date)
            }
        };

        CentralStats {
            parked: self.parked.len(),
            closed: self.flags.closed,
            floor_blocked: self.flags.floor_blocked,
            blocked_floor: self.flags.blocked_floor.clone(),
            today,
            connected_clients: 0,
        }
    }

    /// Decide on one lane event
    ///
    /// Never fails: business-rule violations become denials and store
    /// failures are logged without changing the decision.
    pub async fn process_event(&mut self, event: Event) -> EventResponse {
        info!("Processing {} for {} on {}", event.kind, event.plate, event.floor);

        if let Some(denial) = self.flags.check(&event.floor) {
            return self.reject(event, denial).await;
        }

        match event.kind {
            EventKind::Entry => self.process_entry(event).await,
            EventKind::Exit => self.process_exit(event).await,
            other => {
                warn!("Unsupported event kind {} for {}", other, event.plate);
                EventResponse::error(local_id())
                    .with_message(format!("Tipo de evento não suportado: {other}"))
            }
        }
    }

    async fn process_entry(&mut self, mut event: Event) -> EventResponse {
        if self.parked.contains_key(&event.plate) {
            warn!("Vehicle {} is already parked", event.plate);
            return self.reject(event, Denial::AlreadyParked).await;
        }

        let mut vehicle = Vehicle::park(event.plate.clone(), event.timestamp, event.floor.clone());
        if let Some(slot) = event.slot {
            vehicle = vehicle.with_slot(slot);
        }
        self.parked.insert(vehicle.plate.clone(), vehicle.clone());

        event.complete();
        let event_id = self.persist_event(&event).await;
        if let Err(e) = self.store.save_vehicle(&vehicle).await {
            error!("Failed to save vehicle {}: {}", vehicle.plate, e);
        }

        info!("Entry authorized for {}", vehicle.plate);
        EventResponse::open_gate(event_id).with_message("Entrada autorizada")
    }

    async fn process_exit(&mut self, mut event: Event) -> EventResponse {
        let Some(mut vehicle) = self.parked.remove(&event.plate) else {
            warn!("Vehicle {} not found in the garage", event.plate);
            return self.reject(event, Denial::NotParked).await;
        };

        let (minutes, fee) = match vehicle.depart(event.timestamp, &self.billing) {
            Ok(charge) => charge,
            Err(e) => {
                // Only parked vehicles are kept in the map
                error!("Inconsistent session for {}: {}", vehicle.plate, e);
                return self.reject(event, Denial::NotParked).await;
            }
        };

        event.complete_with_charge(minutes, fee);
        let event_id = self.persist_event(&event).await;
        if let Err(e) = self.store.update_vehicle(&vehicle).await {
            error!("Failed to update vehicle {}: {}", vehicle.plate, e);
        }

        info!(
            "Exit authorized for {} - {} min - R$ {:.2}",
            vehicle.plate, minutes, fee
        );
        EventResponse::charge(event_id, fee, minutes)
            .with_message(format!("Valor a pagar: R$ {fee:.2}"))
    }

    /// Record a denied attempt and answer it
    async fn reject(&self, mut event: Event, denial: Denial) -> EventResponse {
        event.fail(denial.message());
        let kind = event.kind;
        let event_id = self.persist_event(&event).await;
        debug!("Denied {} {}: {}", kind, event.plate, denial);
        denial.response(event_id, kind)
    }

    async fn persist_event(&self, event: &Event) -> String {
        match self.store.save_event(event).await {
            Ok(id) => {
                debug!("Event {} saved to {}", id, self.store.name());
                id
            }
            Err(e) => {
                error!("Failed to save event for {}: {}", event.plate, e);
                local_id()
            }
        }
    }
}

/// Identifier used when the store could not assign one
pub(crate) fn local_id() -> String {
    format!("evt_{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use garage_clock::ManualClock;
    use garage_core::{EventStatus, GateAction, Timestamp};
    use garage_ports::{PersistenceError, PersistenceResult};
    use rust_decimal_macros::dec;

    fn entry_time() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    fn authority() -> (CentralAuthority, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let clock = ManualClock::starting_at(entry_time());
        let authority = CentralAuthority::new(BillingConfig::default(), store.clone(), clock);
        (authority, store)
    }

    /// Store that rejects every write
    struct BrokenStore;

    #[async_trait]
    impl PersistenceStore for BrokenStore {
        async fn save_event(&self, _event: &Event) -> PersistenceResult<String> {
            Err(PersistenceError::Io("disk full".to_string()))
        }

        async fn save_vehicle(&self, _vehicle: &Vehicle) -> PersistenceResult<()> {
            Err(PersistenceError::Io("disk full".to_string()))
        }

        async fn update_vehicle(&self, _vehicle: &Vehicle) -> PersistenceResult<()> {
            Err(PersistenceError::Io("disk full".to_string()))
        }

        async fn daily_stats(&self, _date: NaiveDate) -> PersistenceResult<DailyStats> {
            Err(PersistenceError::Io("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_entry_then_exit_charges_stay() {
        let (mut authority, store) = authority();

        let entry = authority
            .process_event(Event::entry("ABC1234", entry_time(), 0.95))
            .await;
        assert!(entry.success);
        assert_eq!(entry.action, GateAction::OpenGate);
        assert_eq!(entry.event_id, "1");
        assert_eq!(entry.message.as_deref(), Some("Entrada autorizada"));
        assert!(authority.is_parked("ABC1234"));

        let exit = authority
            .process_event(Event::exit("ABC1234", entry_time() + Duration::minutes(30), 0.95))
            .await;
        assert!(exit.success);
        assert_eq!(exit.action, GateAction::Charge);
        assert_eq!(exit.fee, Some(dec!(4.50)));
        assert_eq!(exit.duration_minutes, Some(30));
        assert_eq!(exit.message.as_deref(), Some("Valor a pagar: R$ 4.50"));
        assert!(!authority.is_parked("ABC1234"));

        let sessions = store.vehicles();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].fee, Some(dec!(4.50)));
        assert!(!sessions[0].is_parked());
    }

    #[tokio::test]
    async fn test_entry_records_reserved_slot() {
        let (mut authority, store) = authority();

        authority
            .process_event(Event::entry("ABC1234", entry_time(), 0.95).in_slot(Some(3)))
            .await;
        authority
            .process_event(Event::entry("DEF5678", entry_time() + Duration::minutes(1), 0.95))
            .await;

        let parked = authority.parked_vehicles();
        assert_eq!(parked[0].slot, Some(3));
        assert_eq!(parked[1].slot, None);
        assert_eq!(store.vehicles()[0].slot, Some(3));
    }

    #[tokio::test]
    async fn test_duplicate_entry_is_denied() {
        let (mut authority, store) = authority();

        authority
            .process_event(Event::entry("ABC1234", entry_time(), 0.95))
            .await;
        let second = authority
            .process_event(Event::entry("ABC1234", entry_time() + Duration::minutes(1), 0.95))
            .await;

        assert!(!second.success);
        assert_eq!(second.action, GateAction::DenyEntry);
        assert_eq!(second.message.as_deref(), Some("Veículo já está estacionado"));
        assert_eq!(store.vehicles().len(), 1);

        // The attempt is still on the event log
        let events = store.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].status, EventStatus::Error);
    }

    #[tokio::test]
    async fn test_exit_of_unknown_plate_is_denied() {
        let (mut authority, _store) = authority();

        let response = authority
            .process_event(Event::exit("XYZ9876", entry_time(), 0.95))
            .await;

        assert!(!response.success);
        assert_eq!(response.action, GateAction::DenyExit);
        assert_eq!(response.message.as_deref(), Some("Veículo não encontrado"));
        assert!(response.fee.is_none());
    }

    #[tokio::test]
    async fn test_closed_garage_denies_by_direction() {
        let (mut authority, store) = authority();
        authority
            .process_event(Event::entry("ABC1234", entry_time(), 0.95))
            .await;
        authority.apply(AdminCommand::CloseGarage);

        let entry = authority
            .process_event(Event::entry("DEF5678", entry_time(), 0.95))
            .await;
        assert_eq!(entry.action, GateAction::DenyEntry);
        assert_eq!(entry.message.as_deref(), Some("Estacionamento fechado"));
        assert!(!authority.is_parked("DEF5678"));

        let exit = authority
            .process_event(Event::exit("ABC1234", entry_time(), 0.95))
            .await;
        assert_eq!(exit.action, GateAction::DenyExit);
        assert!(authority.is_parked("ABC1234"));

        let last = store.events().pop().unwrap();
        assert_eq!(last.status, EventStatus::Error);
        assert_eq!(last.error_description.as_deref(), Some("Estacionamento fechado"));
    }

    #[tokio::test]
    async fn test_blocked_floor_only_affects_that_floor() {
        let (mut authority, _store) = authority();
        authority.apply(AdminCommand::BlockFloor);

        let blocked = authority
            .process_event(Event::entry("ABC1234", entry_time(), 0.95))
            .await;
        assert_eq!(blocked.action, GateAction::DenyEntry);
        assert_eq!(blocked.message.as_deref(), Some("Andar bloqueado"));

        let other = authority
            .process_event(Event::entry("ABC1234", entry_time(), 0.95).on_floor("subsolo"))
            .await;
        assert_eq!(other.action, GateAction::OpenGate);

        authority.apply(AdminCommand::UnblockFloor);
        let reopened = authority
            .process_event(Event::entry("DEF5678", entry_time(), 0.95))
            .await;
        assert_eq!(reopened.action, GateAction::OpenGate);
    }

    #[tokio::test]
    async fn test_unsupported_kind_leaves_state_alone() {
        let (mut authority, store) = authority();

        let response = authority
            .process_event(Event::new(
                "ABC1234",
                EventKind::Maintenance,
                entry_time(),
                0.95,
            ))
            .await;

        assert_eq!(response.action, GateAction::Error);
        assert!(!response.success);
        assert_eq!(
            response.message.as_deref(),
            Some("Tipo de evento não suportado: manutencao")
        );
        assert!(response.event_id.starts_with("evt_"));
        assert!(store.events().is_empty());
        assert!(!authority.is_parked("ABC1234"));
    }

    #[tokio::test]
    async fn test_store_failure_does_not_change_decision() {
        let _ = env_logger::try_init();
        let mut authority = CentralAuthority::new(
            BillingConfig::default(),
            Arc::new(BrokenStore),
            ManualClock::starting_at(entry_time()),
        );

        let entry = authority
            .process_event(Event::entry("ABC1234", entry_time(), 0.95))
            .await;
        assert!(entry.success);
        assert!(entry.event_id.starts_with("evt_"));

        let exit = authority
            .process_event(Event::exit("ABC1234", entry_time() + Duration::minutes(10), 0.95))
            .await;
        assert_eq!(exit.action, GateAction::Charge);
        assert_eq!(exit.fee, Some(dec!(2.00)));

        let stats = authority.stats().await;
        assert_eq!(stats.today.entries, 0);
        assert_eq!(stats.parked, 0);
    }

    #[tokio::test]
    async fn test_stats_and_parked_listing() {
        let (mut authority, _store) = authority();
        authority
            .process_event(Event::entry("ABC1234", entry_time(), 0.95))
            .await;
        authority
            .process_event(Event::entry("DEF5678", entry_time() + Duration::minutes(2), 0.95))
            .await;
        authority
            .process_event(Event::exit("ABC1234", entry_time() + Duration::minutes(20), 0.95))
            .await;

        let parked = authority.parked_vehicles();
        assert_eq!(parked.len(), 1);
        assert_eq!(parked[0].plate, "DEF5678");

        let stats = authority.stats().await;
        assert_eq!(stats.parked, 1);
        assert!(!stats.closed);
        assert_eq!(stats.today.entries, 2);
        assert_eq!(stats.today.exits, 1);
        assert_eq!(stats.today.revenue, dec!(3.00));
    }
}
