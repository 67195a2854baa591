//! Presence fan-out: publish occupancy changes to the broker and relay them
//! back to local streaming clients.
//!
//! ```text
//! use case -> PresencePublisher -> topic -> PresenceBridge -> PresenceBus -> SSE streams
//! ```

pub mod bridge;
pub mod broker;
pub mod bus;
pub mod publisher;

pub use bridge::{BridgeStats, PresenceBridge};
pub use broker::PresenceBroker;
pub use bus::{PresenceBus, PresenceSubscriber, SubscriberError, Subscription};
pub use publisher::PresencePublisher;
