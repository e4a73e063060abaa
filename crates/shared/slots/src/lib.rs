//! Garage Slots
//!
//! Fixed-size occupancy ledger shared by the entry and exit lanes.
//! Every successful mutation publishes a fresh [`SlotStats`] snapshot so the
//! occupancy display can be refreshed without polling.

mod board;

pub use board::{Slot, SlotBoard, SlotStats};
