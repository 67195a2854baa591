//! Message broker ports.
//!
//! A deliberately small slice of a Kafka-style client: topic provisioning,
//! keyed sends, and group subscriptions that yield records one at a time.

use std::sync::Arc;

use async_trait::async_trait;

use adventure_domain::PresenceEvent;

use super::error::{BrokerError, PublishError};

/// Desired shape of a topic. Provisioning is create-if-absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: u32,
    pub replication: u32,
}

/// Where a new consumer group begins reading. History is never replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOffset {
    /// Only records produced after the subscription is established.
    Latest,
}

impl StartOffset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRecord {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

/// Broker acknowledgement for a sent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRecord {
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
}

/// Connection factory for one broker cluster.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Create the topic if it does not exist. An existing topic is success.
    async fn ensure_topic(&self, topic: &TopicSpec) -> Result<(), BrokerError>;

    async fn connect_producer(&self) -> Result<Arc<dyn ProducerPort>, BrokerError>;

    /// Join `group_id` on `topic`. Returns once the group join has completed
    /// and partitions are assigned, so every record produced afterwards is
    /// seen by the group.
    async fn subscribe(
        &self,
        group_id: &str,
        topic: &str,
        start: StartOffset,
    ) -> Result<Box<dyn ConsumerPort>, BrokerError>;
}

#[async_trait]
pub trait ProducerPort: Send + Sync {
    async fn send(&self, record: OutboundRecord) -> Result<Delivery, BrokerError>;
}

#[async_trait]
pub trait ConsumerPort: Send {
    /// Next record for this group member. `BrokerError::Closed` is terminal.
    async fn recv(&mut self) -> Result<InboundRecord, BrokerError>;
}

/// Outbound seam for occupancy changes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceEventPort: Send + Sync {
    async fn publish(&self, event: &PresenceEvent) -> Result<Delivery, PublishError>;
}
