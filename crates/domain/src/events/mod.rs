//! Domain Events
//!
//! Events representing occupancy changes in the shared world. They are
//! published to the broker as-is and relayed to streaming clients.

pub mod presence;

pub use presence::{CellChange, PresenceEvent, PresenceEventKind};
