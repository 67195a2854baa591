//! Value objects - Immutable objects defined by their attributes

mod coordinates;
mod direction;

pub use coordinates::Coordinates;
pub use direction::Direction;
