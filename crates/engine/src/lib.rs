//! Adventure Terminal engine library.
//!
//! Server-side code for the shared world: user placement and movement, and
//! the presence pipeline that fans cell entry/exit out to live SSE clients.
//!
//! ## Structure
//!
//! - `use_cases/` - World mutations (create, move, teleport)
//! - `infrastructure/` - Ports and adapters (broker, presence bus, stores, config)
//! - `api/` - HTTP routes and the presence stream
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// End-to-end tests driving a live server over HTTP.
#[cfg(test)]
mod e2e_tests;

pub use app::App;
