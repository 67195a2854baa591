//! Adventure Terminal domain types.
//!
//! Identifiers, the world-cell model, and the presence events exchanged
//! between movement logic, the broker, and streaming clients.

pub mod common;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use entities::{CellTemplate, User, WorldCell};
pub use error::DomainError;
pub use events::{CellChange, PresenceEvent, PresenceEventKind};
pub use ids::{UserId, WorldCellId};
pub use value_objects::{Coordinates, Direction};
