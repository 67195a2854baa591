//! End-to-end tests against a live server.
//!
//! Each test binds the full router to an ephemeral port on loopback, backed
//! by the in-memory broker, and talks to it over real HTTP with `reqwest`.
//! Presence streams are read frame by frame from the raw SSE body.

mod e2e_helpers;

pub use e2e_helpers::*;
