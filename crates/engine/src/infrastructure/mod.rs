//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod config;
pub mod kafka;
pub mod memory_broker;
pub mod memory_store;
pub mod partitioner;
pub mod ports;
pub mod presence;
