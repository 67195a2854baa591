//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - The message broker (could swap Kafka -> in-memory)
//! - Presence publishing (mocked by use case tests)
//! - World storage (users and cells)
//! - Clock (for testing)

mod broker;
mod error;
mod repos;
mod testing;

// =============================================================================
// Broker Ports
// =============================================================================
pub use broker::{
    BrokerPort, ConsumerPort, Delivery, InboundRecord, OutboundRecord, PresenceEventPort,
    ProducerPort, StartOffset, TopicSpec,
};

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{UserRepo, WorldCellRepo};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use broker::MockPresenceEventPort;

#[cfg(test)]
pub use repos::{MockUserRepo, MockWorldCellRepo};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{BrokerError, PublishError, RepoError};
