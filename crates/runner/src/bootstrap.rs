//! Bootstrap - wiring configuration into running components
//!
//! - Central: store → authority → actor → TCP server, plus the stats logger
//! - Ground floor: slot board, entry and exit lanes, display refresher,
//!   occupancy logger
//!
//! Every spawned task watches the same shutdown signal.

use garage_central::{
    AdminFlags, CentralActor, CentralAuthority, CentralError, CentralHandle, CentralServer,
    InMemoryStore, JournalStore, actor::DEFAULT_CAPACITY,
};
use garage_core::{Event, EventResponse};
use garage_gateway::Requester;
use garage_lane::devices::{
    CoilGate, CoilPresenceSensor, FieldBus, GateCoils, LogDisplay, MemoryBus, RegisterDisplay,
    RegisterPlateCapture, SimulatedGate, SimulatedLink, SimulatedPlateCapture,
    SimulatedPresenceSensor,
};
use garage_lane::{DisplayRefresher, LaneController, LaneDevices, LaneKind, LaneStatus};
use garage_ports::{
    Clock, DeviceLink, DisplayPanel, HardwareError, PersistenceError, PersistenceStore,
};
use garage_slots::SlotBoard;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::config::{ConfigError, DeviceMode, GarageConfig};

/// Presence coil of a lane device block
pub const PRESENCE_COIL: u16 = 0;
/// Gate coils of a lane device block
pub const GATE_COILS: GateCoils = GateCoils {
    open: 1,
    close: 2,
    passage: 3,
};
/// First plate register (7 characters + confidence)
pub const PLATE_REGISTER_BASE: u16 = 10;
/// Free-count register on the display bus
pub const DISPLAY_REGISTER: u16 = 0;

/// Errors while starting a node
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Central error: {0}")]
    Central(#[from] CentralError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Journal store when a directory is configured, in-memory otherwise
pub async fn open_store(config: &GarageConfig) -> Result<Arc<dyn PersistenceStore>> {
    match &config.central.journal_dir {
        Some(dir) => {
            let store = JournalStore::open(dir).await?;
            info!("Using journal store at {}", store.dir().display());
            Ok(Arc::new(store))
        }
        None => {
            info!("Using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

/// A running central authority
pub struct CentralNode {
    pub handle: CentralHandle,
    /// Address the server actually bound (port 0 resolves here)
    pub address: SocketAddr,
    pub tasks: Vec<JoinHandle<()>>,
}

impl CentralNode {
    /// Open the store, spawn the actor and start serving on the configured address
    pub async fn start(
        config: &GarageConfig,
        clock: Arc<dyn Clock>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let store = open_store(config).await?;
        Self::start_with_store(config, store, clock, shutdown).await
    }

    pub async fn start_with_store(
        config: &GarageConfig,
        store: Arc<dyn PersistenceStore>,
        clock: Arc<dyn Clock>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let flags = AdminFlags::new(config.central.blocked_floor.clone());
        let authority = CentralAuthority::new(config.billing(), store, clock).with_flags(flags);
        let (handle, actor) = CentralActor::spawn(authority, DEFAULT_CAPACITY);

        let listener = CentralServer::bind(&config.central_address()).await?;
        let address = listener.local_addr().map_err(CentralError::from)?;
        let server = CentralServer::new(handle.clone()).with_read_timeout(config.read_timeout());
        let server_shutdown = shutdown.clone();
        let server_task = tokio::spawn(async move {
            if let Err(e) = server.serve(listener, server_shutdown).await {
                error!("Central server failed: {}", e);
            }
        });

        let stats_task = spawn_stats_logger(handle.clone(), config.stats_interval(), shutdown);

        info!(
            "Central authority ready on {} (R$ {} per minute, minimum R$ {})",
            address, config.central.rate_per_minute, config.central.minimum_fee
        );

        Ok(Self {
            handle,
            address,
            tasks: vec![actor, server_task, stats_task],
        })
    }
}

/// Periodically log the central statistics
pub fn spawn_stats_logger(
    handle: CentralHandle,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => match handle.stats().await {
                    Ok(stats) => info!(
                        "Stats: {} parked, {} entries / {} exits today, revenue R$ {}, {} clients, closed={}, floor blocked={}",
                        stats.parked,
                        stats.today.entries,
                        stats.today.exits,
                        stats.today.revenue,
                        stats.connected_clients,
                        stats.closed,
                        stats.floor_blocked,
                    ),
                    Err(e) => {
                        warn!("Stats unavailable: {}", e);
                        break;
                    }
                },
                _ = shutdown.changed() => break,
            }
        }
    })
}

fn lane_devices(kind: LaneKind, mode: DeviceMode) -> LaneDevices {
    match mode {
        DeviceMode::Simulation => LaneDevices {
            presence: Arc::new(SimulatedPresenceSensor::new(None)),
            camera: Arc::new(SimulatedPlateCapture::new(None)),
            gate: Arc::new(SimulatedGate::new()),
            link: Arc::new(SimulatedLink::new(format!("{kind}-link"))),
        },
        DeviceMode::Hardware => {
            let bus = Arc::new(MemoryBus::new(format!("{kind}-bus")));
            hardware_devices(bus)
        }
    }
}

/// Register-mapped devices on one lane's bus
pub fn hardware_devices(bus: Arc<MemoryBus>) -> LaneDevices {
    let field: Arc<dyn FieldBus> = bus.clone();
    LaneDevices {
        presence: Arc::new(CoilPresenceSensor::new(Arc::clone(&field), PRESENCE_COIL)),
        camera: Arc::new(RegisterPlateCapture::new(
            Arc::clone(&field),
            PLATE_REGISTER_BASE,
        )),
        gate: Arc::new(CoilGate::new(Arc::clone(&field), GATE_COILS)),
        link: bus,
    }
}

async fn display_panel(mode: DeviceMode) -> Result<Arc<dyn DisplayPanel>> {
    match mode {
        DeviceMode::Simulation => Ok(Arc::new(LogDisplay)),
        DeviceMode::Hardware => {
            let bus = Arc::new(MemoryBus::new("display-bus"));
            bus.connect().await?;
            Ok(Arc::new(RegisterDisplay::new(bus, DISPLAY_REGISTER)))
        }
    }
}

/// The ground floor: one entry lane, one exit lane, one slot board
pub struct GroundFloor {
    pub slots: Arc<SlotBoard>,
    pub entry: LaneController,
    pub exit: LaneController,
    pub display: DisplayRefresher,
}

impl GroundFloor {
    /// Build both lanes with devices for the configured mode
    pub async fn build(
        config: &GarageConfig,
        central: Arc<dyn Requester<Event, EventResponse>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mode = config.lanes.mode;
        let entry = lane_devices(LaneKind::Entry, mode);
        let exit = lane_devices(LaneKind::Exit, mode);
        let panel = display_panel(mode).await?;
        Ok(Self::with_devices(config, central, clock, entry, exit, panel))
    }

    pub fn with_devices(
        config: &GarageConfig,
        central: Arc<dyn Requester<Event, EventResponse>>,
        clock: Arc<dyn Clock>,
        entry_devices: LaneDevices,
        exit_devices: LaneDevices,
        panel: Arc<dyn DisplayPanel>,
    ) -> Self {
        let slots = Arc::new(SlotBoard::new(config.lanes.total_slots));
        let lane_config = config.lane_config();

        let entry = LaneController::new(
            LaneKind::Entry,
            lane_config.clone(),
            entry_devices,
            Arc::clone(&central),
            Arc::clone(&slots),
            Arc::clone(&clock),
        );
        let exit = LaneController::new(
            LaneKind::Exit,
            lane_config,
            exit_devices,
            central,
            Arc::clone(&slots),
            clock,
        );
        let display = DisplayRefresher::new(&slots, panel);

        info!(
            "Ground floor ready: {} slots, {} devices, {:?} slot policy",
            config.lanes.total_slots, config.lanes.mode, config.lanes.slot_policy
        );

        Self {
            slots,
            entry,
            exit,
            display,
        }
    }

    /// Spawn both lanes, the display refresher and the occupancy logger
    pub fn spawn(self, period: Duration, shutdown: watch::Receiver<bool>) -> GroundFloorTasks {
        let entry_status = self.entry.subscribe();
        let exit_status = self.exit.subscribe();

        let mut entry = self.entry;
        let entry_shutdown = shutdown.clone();
        let entry_task = tokio::spawn(async move { entry.run(entry_shutdown).await });

        let mut exit = self.exit;
        let exit_shutdown = shutdown.clone();
        let exit_task = tokio::spawn(async move { exit.run(exit_shutdown).await });

        let display_task = tokio::spawn(self.display.run(shutdown.clone()));

        let logger_task = spawn_occupancy_logger(
            Arc::clone(&self.slots),
            entry_status.clone(),
            exit_status.clone(),
            period,
            shutdown,
        );

        GroundFloorTasks {
            slots: self.slots,
            entry_status,
            exit_status,
            tasks: vec![entry_task, exit_task, display_task, logger_task],
        }
    }
}

/// Handles to a spawned ground floor
pub struct GroundFloorTasks {
    pub slots: Arc<SlotBoard>,
    pub entry_status: watch::Receiver<LaneStatus>,
    pub exit_status: watch::Receiver<LaneStatus>,
    pub tasks: Vec<JoinHandle<()>>,
}

fn spawn_occupancy_logger(
    slots: Arc<SlotBoard>,
    entry: watch::Receiver<LaneStatus>,
    exit: watch::Receiver<LaneStatus>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = slots.stats();
                    let entry = entry.borrow().clone();
                    let exit = exit.borrow().clone();
                    info!(
                        "Occupancy {}/{} ({:.1}%), entry {} ({} cycles, {} errors), exit {} ({} cycles, {} errors)",
                        stats.occupied,
                        stats.total,
                        stats.occupied_percent,
                        entry.state,
                        entry.cycles,
                        entry.errors,
                        exit.state,
                        exit.cycles,
                        exit.errors,
                    );
                }
                _ = shutdown.changed() => break,
            }
        }
    })
}

/// Wait for Ctrl-C and flip the shutdown signal
pub fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
        let _ = tx.send(true);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use garage_clock::SystemClock;

    fn config() -> GarageConfig {
        let mut config = GarageConfig::default();
        config.central.port = 0;
        config
    }

    #[tokio::test]
    async fn test_open_store_without_dir_is_memory() {
        let store = open_store(&config()).await.unwrap();
        assert_eq!(store.name(), "InMemoryStore");
    }

    #[tokio::test]
    async fn test_open_store_with_dir_is_journal() {
        let dir = std::env::temp_dir().join(format!("garage-bootstrap-{}", std::process::id()));
        let mut config = config();
        config.central.journal_dir = Some(dir.clone());

        let store = open_store(&config).await.unwrap();
        assert!(dir.join("events.jsonl").exists());
        assert_eq!(store.name(), "JournalStore");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_central_node_binds_ephemeral_port() {
        let (tx, rx) = watch::channel(false);
        let node = CentralNode::start(&config(), Arc::new(SystemClock::new()), rx)
            .await
            .unwrap();

        assert_ne!(node.address.port(), 0);
        assert_eq!(node.handle.stats().await.unwrap().parked, 0);

        tx.send(true).unwrap();
    }

    #[tokio::test]
    async fn test_hardware_devices_share_one_bus() {
        let bus = Arc::new(MemoryBus::new("entry-bus"));
        let devices = hardware_devices(Arc::clone(&bus));

        devices.link.connect().await.unwrap();
        assert!(bus.is_connected());

        bus.set_coil(PRESENCE_COIL, true);
        assert!(devices.presence.detect().await.unwrap());

        bus.load_plate(PLATE_REGISTER_BASE, "ABC1234", 0.93);
        let reading = devices.camera.capture().await.unwrap().unwrap();
        assert_eq!(reading.plate, "ABC1234");
    }

    #[tokio::test]
    async fn test_ground_floor_build_uses_configured_slots() {
        let (tx, rx) = watch::channel(false);
        let node = CentralNode::start(&config(), Arc::new(SystemClock::new()), rx)
            .await
            .unwrap();

        let mut config = config();
        config.lanes.total_slots = 3;
        let floor = GroundFloor::build(
            &config,
            Arc::new(node.handle.clone()),
            Arc::new(SystemClock::new()),
        )
        .await
        .unwrap();

        assert_eq!(floor.slots.total(), 3);
        assert_eq!(floor.entry.kind(), LaneKind::Entry);
        assert_eq!(floor.exit.kind(), LaneKind::Exit);

        tx.send(true).unwrap();
    }
}
