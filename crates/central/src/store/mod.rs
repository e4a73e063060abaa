//! Event log and vehicle session stores
//!
//! - [`InMemoryStore`]: process-lifetime store with sequential ids
//! - [`JournalStore`]: append-only JSON-lines files replayed on open

mod journal;
mod memory;

pub use journal::JournalStore;
pub use memory::InMemoryStore;
