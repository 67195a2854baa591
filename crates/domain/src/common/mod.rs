//! Common utility functions shared across the engine and its clients.
//!
//! Pure functions only: no side effects, no I/O.

pub mod datetime;
pub mod string;

pub use datetime::{format_iso8601, parse_datetime};
pub use string::{none_if_blank, some_if_not_blank};
