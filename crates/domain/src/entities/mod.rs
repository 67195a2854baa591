//! Domain entities - Core business objects with identity

mod user;
mod world_cell;

pub use user::User;
pub use world_cell::{CellTemplate, WorldCell};
