use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// A numbered parking slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub index: usize,
    pub occupied: bool,
    /// Plate bound to the slot by the entry lane, when known
    pub plate: Option<String>,
}

/// Occupancy snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotStats {
    pub total: usize,
    pub free: usize,
    pub occupied: usize,
    /// Occupied share in `[0, 100]`
    pub occupied_percent: f64,
    pub full: bool,
    pub occupied_slots: Vec<usize>,
    pub free_slots: Vec<usize>,
}

struct Ledger {
    slots: Box<[Slot]>,
    free: usize,
}

impl Ledger {
    fn stats(&self) -> SlotStats {
        let total = self.slots.len();
        let occupied = total - self.free;
        let (occupied_slots, free_slots): (Vec<&Slot>, Vec<&Slot>) =
            self.slots.iter().partition(|s| s.occupied);

        SlotStats {
            total,
            free: self.free,
            occupied,
            occupied_percent: if total == 0 {
                0.0
            } else {
                occupied as f64 / total as f64 * 100.0
            },
            full: self.free == 0,
            occupied_slots: occupied_slots.iter().map(|s| s.index).collect(),
            free_slots: free_slots.iter().map(|s| s.index).collect(),
        }
    }
}

/// Occupancy ledger for a fixed number of slots
///
/// Shared between lanes behind an `Arc`; all operations are serialized by an
/// internal lock and keep `occupied + free == total`.
pub struct SlotBoard {
    ledger: Mutex<Ledger>,
    refresh_tx: watch::Sender<SlotStats>,
}

impl SlotBoard {
    /// Create a board with `total` free slots, indexed `0..total`
    pub fn new(total: usize) -> Self {
        let slots = (0..total)
            .map(|index| Slot {
                index,
                occupied: false,
                plate: None,
            })
            .collect();
        let ledger = Ledger { slots, free: total };
        let (refresh_tx, _) = watch::channel(ledger.stats());

        Self {
            ledger: Mutex::new(ledger),
            refresh_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn total(&self) -> usize {
        self.lock().slots.len()
    }

    /// Mark a slot occupied; returns false if out of range or already occupied
    pub fn occupy(&self, index: usize) -> bool {
        self.occupy_slot(index, None)
    }

    /// Mark a slot occupied and bind it to `plate`
    pub fn occupy_for(&self, index: usize, plate: &str) -> bool {
        self.occupy_slot(index, Some(plate.to_string()))
    }

    fn occupy_slot(&self, index: usize, plate: Option<String>) -> bool {
        let mut ledger = self.lock();

        let Some(slot) = ledger.slots.get_mut(index) else {
            warn!("Slot {} out of range", index);
            return false;
        };
        if slot.occupied {
            warn!("Slot {} already occupied", index);
            return false;
        }

        slot.occupied = true;
        slot.plate = plate;
        ledger.free -= 1;
        info!("Slot {} occupied ({} free)", index, ledger.free);

        self.publish(&ledger);
        true
    }

    /// Mark a slot free; returns false if out of range or already free
    pub fn free(&self, index: usize) -> bool {
        let mut ledger = self.lock();

        let Some(slot) = ledger.slots.get_mut(index) else {
            warn!("Slot {} out of range", index);
            return false;
        };
        if !slot.occupied {
            warn!("Slot {} already free", index);
            return false;
        }

        slot.occupied = false;
        slot.plate = None;
        ledger.free += 1;
        info!("Slot {} freed ({} free)", index, ledger.free);

        self.publish(&ledger);
        true
    }

    /// Lowest free slot index
    pub fn find_free_slot(&self) -> Option<usize> {
        self.lock()
            .slots
            .iter()
            .find(|s| !s.occupied)
            .map(|s| s.index)
    }

    /// Lowest occupied slot index
    pub fn first_occupied(&self) -> Option<usize> {
        self.lock()
            .slots
            .iter()
            .find(|s| s.occupied)
            .map(|s| s.index)
    }

    /// Slot bound to `plate`, if any
    pub fn slot_of(&self, plate: &str) -> Option<usize> {
        self.lock()
            .slots
            .iter()
            .find(|s| s.occupied && s.plate.as_deref() == Some(plate))
            .map(|s| s.index)
    }

    /// Occupy the lowest free slot, returning its index
    ///
    /// Find and occupy happen under one lock, so two lanes never claim the
    /// same slot.
    pub fn occupy_next(&self, plate: Option<&str>) -> Option<usize> {
        let mut ledger = self.lock();
        let index = ledger.slots.iter().position(|s| !s.occupied)?;

        let slot = &mut ledger.slots[index];
        slot.occupied = true;
        slot.plate = plate.map(str::to_string);
        ledger.free -= 1;
        info!("Slot {} occupied ({} free)", index, ledger.free);

        self.publish(&ledger);
        Some(index)
    }

    pub fn slot(&self, index: usize) -> Option<Slot> {
        self.lock().slots.get(index).cloned()
    }

    pub fn stats(&self) -> SlotStats {
        self.lock().stats()
    }

    /// Receive a snapshot after every successful mutation
    pub fn subscribe(&self) -> watch::Receiver<SlotStats> {
        self.refresh_tx.subscribe()
    }

    fn publish(&self, ledger: &Ledger) {
        let stats = ledger.stats();
        debug!("Display refresh: {}/{} free", stats.free, stats.total);
        self.refresh_tx.send_replace(stats);
    }
}
