//! Lane controller state machine

use garage_core::{Event, EventResponse, Plate};
use garage_gateway::{Requester, TransportError};
use garage_ports::{
    Clock, DeviceLink, GateDriver, HardwareError, LinkGuard, PlateCapture, PresenceSensor,
};
use garage_slots::SlotBoard;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::config::{LaneConfig, SlotPolicy};
use crate::error::{LaneError, Result, ValidationError};
use crate::state::{LaneKind, LaneState};

/// Hardware a lane drives
#[derive(Clone)]
pub struct LaneDevices {
    pub presence: Arc<dyn PresenceSensor>,
    pub camera: Arc<dyn PlateCapture>,
    pub gate: Arc<dyn GateDriver>,
    /// Connection carrying the device traffic, held while the lane runs
    pub link: Arc<dyn DeviceLink>,
}

/// Published after every step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneStatus {
    pub state: LaneState,
    /// Gate cycles completed with a passage
    pub cycles: u64,
    pub denials: u64,
    pub errors: u64,
    pub last_error: Option<String>,
}

/// Data carried across the states of one vehicle's transaction
#[derive(Debug, Default)]
struct Transaction {
    plate: Option<Plate>,
    confidence: f64,
    response: Option<EventResponse>,
    passed: bool,
    /// Slot announced to the central authority on entry
    reserved_slot: Option<usize>,
    /// Passage sensor failure, raised once the gate is closed
    sensor_fault: Option<HardwareError>,
}

pub struct LaneController {
    kind: LaneKind,
    config: LaneConfig,
    devices: LaneDevices,
    central: Arc<dyn Requester<Event, EventResponse>>,
    slots: Arc<SlotBoard>,
    clock: Arc<dyn Clock>,
    state: LaneState,
    transaction: Transaction,
    status_tx: watch::Sender<LaneStatus>,
}

impl LaneController {
    pub fn new(
        kind: LaneKind,
        config: LaneConfig,
        devices: LaneDevices,
        central: Arc<dyn Requester<Event, EventResponse>>,
        slots: Arc<SlotBoard>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (status_tx, _) = watch::channel(LaneStatus::default());
        Self {
            kind,
            config,
            devices,
            central,
            slots,
            clock,
            state: LaneState::Idle,
            transaction: Transaction::default(),
            status_tx,
        }
    }

    pub fn kind(&self) -> LaneKind {
        self.kind
    }

    pub fn state(&self) -> LaneState {
        self.state
    }

    pub fn status(&self) -> LaneStatus {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LaneStatus> {
        self.status_tx.subscribe()
    }

    /// Run until `shutdown` flips to true (or its sender is dropped)
    ///
    /// The device link is acquired first and released when this returns.
    /// Any in-flight wait is cancelled on shutdown.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting {} lane", self.kind);

        let _guard = loop {
            if *shutdown.borrow() {
                return;
            }
            tokio::select! {
                acquired = LinkGuard::acquire(Arc::clone(&self.devices.link)) => match acquired {
                    Ok(guard) => break guard,
                    Err(e) => {
                        error!("{} lane cannot connect devices: {}", self.kind, e);
                        self.record_error(LaneError::Hardware(e));
                        self.publish();
                        tokio::select! {
                            _ = sleep(self.config.error_backoff) => {}
                            _ = shutdown.changed() => {}
                        }
                    }
                },
                _ = shutdown.changed() => return,
            }
        };

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = self.step() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        if self.state.in_gate_cycle() {
            warn!("{} lane stopped during the gate cycle ({})", self.kind, self.state);
        }
        info!("{} lane stopped", self.kind);
    }

    /// Perform exactly one transition and return the new state
    ///
    /// Failures never escape: they move the lane to `Error`.
    pub async fn step(&mut self) -> LaneState {
        let next = match self.advance().await {
            Ok(next) => next,
            Err(e) => {
                error!("{} lane failed in {}: {}", self.kind, self.state, e);
                self.record_error(e);
                LaneState::Error
            }
        };

        if next != self.state {
            debug!("{} lane: {} -> {}", self.kind, self.state, next);
        }
        self.state = next;
        self.publish();
        next
    }

    async fn advance(&mut self) -> Result<LaneState> {
        match self.state {
            LaneState::Idle => {
                if self.devices.presence.detect().await? {
                    info!("Vehicle detected at {} lane", self.kind);
                    self.transaction = Transaction::default();
                    Ok(LaneState::VehicleDetected)
                } else {
                    sleep(self.config.poll_interval).await;
                    Ok(LaneState::Idle)
                }
            }
            LaneState::VehicleDetected => Ok(LaneState::CapturingPlate),
            LaneState::CapturingPlate => {
                self.capture_plate().await?;
                Ok(LaneState::AwaitingAuthorization)
            }
            LaneState::AwaitingAuthorization => self.authorize().await,
            LaneState::Opening => {
                self.devices.gate.open().await?;
                Ok(LaneState::WaitingPassage)
            }
            LaneState::WaitingPassage => {
                match self
                    .devices
                    .gate
                    .sense_passage(self.config.passage_timeout)
                    .await
                {
                    Ok(true) => self.transaction.passed = true,
                    Ok(false) => warn!(
                        "No passage at {} lane within {:?}",
                        self.kind, self.config.passage_timeout
                    ),
                    Err(e) => {
                        warn!("Passage sensor failed at {} lane, closing gate: {}", self.kind, e);
                        self.transaction.sensor_fault = Some(e);
                    }
                }
                Ok(LaneState::Closing)
            }
            LaneState::Closing => {
                self.devices.gate.close().await?;
                if let Some(fault) = self.transaction.sensor_fault.take() {
                    return Err(LaneError::Hardware(fault));
                }
                if !self.transaction.passed {
                    return Err(LaneError::PassageTimeout);
                }
                self.finish_cycle();
                Ok(LaneState::Idle)
            }
            LaneState::Denied => {
                if let Some(response) = &self.transaction.response {
                    info!(
                        "{} denied for {}: {}",
                        self.kind,
                        self.plate_label(),
                        response.message.as_deref().unwrap_or(response.action.as_str())
                    );
                }
                self.transaction = Transaction::default();
                Ok(LaneState::Idle)
            }
            LaneState::Error => {
                info!("{} lane recovering in {:?}", self.kind, self.config.error_backoff);
                sleep(self.config.error_backoff).await;
                self.transaction = Transaction::default();
                Ok(LaneState::Idle)
            }
        }
    }

    async fn capture_plate(&mut self) -> Result<()> {
        let reading = self
            .devices
            .camera
            .capture()
            .await?
            .ok_or(ValidationError::NoPlate)?;

        if reading.confidence < self.config.min_confidence {
            return Err(ValidationError::LowConfidence {
                plate: reading.plate,
                confidence: reading.confidence,
                minimum: self.config.min_confidence,
            }
            .into());
        }
        let plate = Plate::parse(&reading.plate).map_err(ValidationError::from)?;

        info!(
            "Plate {} captured at {} lane ({:.2})",
            plate, self.kind, reading.confidence
        );
        self.transaction.plate = Some(plate);
        self.transaction.confidence = reading.confidence;
        Ok(())
    }

    async fn authorize(&mut self) -> Result<LaneState> {
        let plate = self
            .transaction
            .plate
            .as_ref()
            .ok_or(ValidationError::NoPlate)?;
        let reserved_slot = match self.kind {
            LaneKind::Entry => self.slots.find_free_slot(),
            LaneKind::Exit => None,
        };
        let event = Event::new(
            plate.as_str(),
            self.kind.event_kind(),
            self.clock.now(),
            self.transaction.confidence,
        )
        .on_floor(self.config.floor.clone())
        .in_slot(reserved_slot);

        let response = tokio::time::timeout(self.config.request_timeout, self.central.request(&event))
            .await
            .map_err(|_| TransportError::Timeout)??;

        let authorized = response.success && response.action == self.kind.authorizing_action();
        if authorized {
            match (response.fee, response.duration_minutes) {
                (Some(fee), Some(minutes)) => {
                    info!("Charge for {}: R$ {:.2} ({} min)", plate, fee, minutes)
                }
                _ => info!("{} authorized for {}", self.kind, plate),
            }
        }
        self.transaction.response = Some(response);
        self.transaction.reserved_slot = reserved_slot;

        Ok(if authorized {
            LaneState::Opening
        } else {
            LaneState::Denied
        })
    }

    /// Slot bookkeeping after a vehicle went through and the gate closed
    fn finish_cycle(&mut self) {
        let plate = self.transaction.plate.as_ref().map(|p| p.as_str().to_string());
        match self.kind {
            LaneKind::Entry => {
                let bound = match self.config.slot_policy {
                    SlotPolicy::PlateBound => plate.as_deref(),
                    SlotPolicy::FirstOccupied => None,
                };
                let reserved = self.transaction.reserved_slot.filter(|&index| match bound {
                    Some(plate) => self.slots.occupy_for(index, plate),
                    None => self.slots.occupy(index),
                });
                if reserved.is_none() && self.slots.occupy_next(bound).is_none() {
                    warn!("No free slot left for {}", self.plate_label());
                }
            }
            LaneKind::Exit => {
                let slot = match self.config.slot_policy {
                    SlotPolicy::PlateBound => plate
                        .as_deref()
                        .and_then(|p| self.slots.slot_of(p))
                        .or_else(|| self.slots.first_occupied()),
                    SlotPolicy::FirstOccupied => self.slots.first_occupied(),
                };
                match slot {
                    Some(index) => {
                        self.slots.free(index);
                    }
                    None => warn!("No occupied slot to release for {}", self.plate_label()),
                }
            }
        }

        info!("{} cycle completed for {}", self.kind, self.plate_label());
        self.status_tx.send_modify(|status| status.cycles += 1);
        self.transaction = Transaction::default();
    }

    fn plate_label(&self) -> String {
        self.transaction
            .plate
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown plate".to_string())
    }

    fn record_error(&mut self, e: LaneError) {
        let message = e.to_string();
        self.status_tx.send_modify(|status| {
            status.errors += 1;
            status.last_error = Some(message);
        });
    }

    fn publish(&self) {
        let state = self.state;
        let denied = state == LaneState::Denied;
        self.status_tx.send_modify(|status| {
            if denied && status.state != LaneState::Denied {
                status.denials += 1;
            }
            status.state = state;
        });
    }
}
