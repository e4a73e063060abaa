//! Garage Central
//!
//! The central authority owns the authoritative parking state: which
//! vehicles are inside, the administrative flags, the tariff, and every
//! write to the event and vehicle stores.
//!
//! ## Architecture
//!
//! ```text
//!  lane (entry)   lane (exit)   admin / stats
//!       │  TCP        │  TCP          │
//!  ┌────▼─────────────▼────┐          │
//!  │     CentralServer     │ one task per connection
//!  └──────────┬────────────┘          │
//!             │ CentralHandle (mpsc + oneshot)
//!  ┌──────────▼───────────────────────▼─┐
//!  │ CentralActor → CentralAuthority     │ single owner
//!  └──────────┬──────────────────────────┘
//!             │
//!     PersistenceStore (memory / journal)
//! ```
//!
//! All mutations go through the actor, so two concurrent entries for the
//! same plate are linearized: the first wins and the second is denied.

pub mod actor;
pub mod authority;
pub mod error;
pub mod flags;
pub mod server;
pub mod store;

pub use actor::{CentralActor, CentralHandle};
pub use authority::{CentralAuthority, CentralStats};
pub use error::{CentralError, Result};
pub use flags::{AdminCommand, AdminFlags, Denial};
pub use server::CentralServer;
pub use store::{InMemoryStore, JournalStore};
