//! Presence event publisher with reconnect-once retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use adventure_domain::PresenceEvent;

use crate::infrastructure::ports::{
    BrokerError, Delivery, OutboundRecord, PresenceEventPort, ProducerPort, PublishError,
};

use super::broker::PresenceBroker;

struct CachedProducer {
    generation: u64,
    producer: Arc<dyn ProducerPort>,
}

/// Publishes presence events keyed by world cell.
///
/// The producer is created on first use and reused. When a send fails because
/// the connection was lost, the producer is rebuilt and the send is retried
/// exactly once.
pub struct PresencePublisher {
    broker: Arc<PresenceBroker>,
    producer: Mutex<Option<CachedProducer>>,
    /// Generation for the next producer. Never reused.
    generations: AtomicU64,
}

impl PresencePublisher {
    pub fn new(broker: Arc<PresenceBroker>) -> Self {
        Self {
            broker,
            producer: Mutex::new(None),
            generations: AtomicU64::new(0),
        }
    }

    async fn producer(&self) -> Result<(u64, Arc<dyn ProducerPort>), BrokerError> {
        self.broker.ready().await?;

        let mut cached = self.producer.lock().await;
        if let Some(current) = cached.as_ref() {
            return Ok((current.generation, Arc::clone(&current.producer)));
        }

        let producer = self.broker.client().connect_producer().await?;
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            topic = %self.broker.topic().name,
            generation,
            "Presence producer connected"
        );
        *cached = Some(CachedProducer {
            generation,
            producer: Arc::clone(&producer),
        });
        Ok((generation, producer))
    }

    /// Replace the producer that failed. If another caller already replaced
    /// it, reuse theirs instead of connecting again.
    async fn reconnect(&self, failed_generation: u64) -> Result<Arc<dyn ProducerPort>, BrokerError> {
        let mut cached = self.producer.lock().await;
        if let Some(current) = cached.as_ref() {
            if current.generation != failed_generation {
                return Ok(Arc::clone(&current.producer));
            }
        }

        // Not ready until the new producer exists.
        *cached = None;
        let producer = self.broker.client().connect_producer().await?;
        *cached = Some(CachedProducer {
            generation: self.generations.fetch_add(1, Ordering::Relaxed),
            producer: Arc::clone(&producer),
        });
        Ok(producer)
    }
}

#[async_trait]
impl PresenceEventPort for PresencePublisher {
    async fn publish(&self, event: &PresenceEvent) -> Result<Delivery, PublishError> {
        let record = OutboundRecord {
            topic: self.broker.topic().name.clone(),
            key: event.partition_key().to_string(),
            payload: serde_json::to_vec(event)?,
        };

        let (generation, producer) = self.producer().await.map_err(PublishError::NotReady)?;

        let error = match producer.send(record.clone()).await {
            Ok(delivery) => return Ok(delivery),
            Err(e) if e.is_disconnected() => e,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    world_cell_id = %event.world_cell_id,
                    kind = %event.kind,
                    "Presence publish failed"
                );
                return Err(PublishError::Send(e));
            }
        };

        tracing::warn!(
            error = %error,
            world_cell_id = %event.world_cell_id,
            "Presence producer disconnected, reconnecting and retrying once"
        );

        let retried = match self.reconnect(generation).await {
            Ok(producer) => producer.send(record).await,
            Err(e) => Err(e),
        };

        match retried {
            Ok(delivery) => {
                tracing::info!(
                    world_cell_id = %event.world_cell_id,
                    partition = delivery.partition,
                    "Presence publish succeeded after reconnect"
                );
                Ok(delivery)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    world_cell_id = %event.world_cell_id,
                    kind = %event.kind,
                    "Presence publish failed after reconnect"
                );
                Err(PublishError::RetryFailed(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::infrastructure::memory_broker::InMemoryBroker;
    use crate::infrastructure::partitioner::partition_for_key;
    use crate::infrastructure::ports::TopicSpec;
    use adventure_domain::{UserId, WorldCellId};

    const TOPIC: &str = "presence.events";

    fn publisher(memory: &InMemoryBroker) -> PresencePublisher {
        let broker = PresenceBroker::new(
            Arc::new(memory.clone()),
            TopicSpec {
                name: TOPIC.to_string(),
                partitions: 6,
                replication: 1,
            },
        );
        PresencePublisher::new(Arc::new(broker))
    }

    fn entered(cell: &str, user: &str) -> PresenceEvent {
        PresenceEvent::entered(
            WorldCellId::new(cell).unwrap(),
            UserId::new(user).unwrap(),
            Utc::now(),
        )
    }

    fn left(cell: &str, user: &str) -> PresenceEvent {
        PresenceEvent::left(
            WorldCellId::new(cell).unwrap(),
            UserId::new(user).unwrap(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn events_for_a_cell_share_a_partition_in_publish_order() {
        let memory = InMemoryBroker::new();
        let publisher = publisher(&memory);

        let first = publisher.publish(&entered("cell-42", "A")).await.unwrap();
        let second = publisher.publish(&left("cell-42", "A")).await.unwrap();

        assert_eq!(first.partition, second.partition);
        assert_eq!(first.partition, partition_for_key(b"cell-42", 6));

        let log = memory.records(TOPIC, first.partition).await;
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|r| r.key == "cell-42"));
        let kinds: Vec<PresenceEvent> = log
            .iter()
            .map(|r| serde_json::from_slice(&r.payload).unwrap())
            .collect();
        assert_eq!(kinds[0].kind.as_str(), "user_entered");
        assert_eq!(kinds[1].kind.as_str(), "user_left");
    }

    #[tokio::test]
    async fn producer_is_reused_across_publishes() {
        let memory = InMemoryBroker::new();
        let publisher = publisher(&memory);

        for i in 0..5 {
            publisher.publish(&entered(&format!("cell-{i}"), "A")).await.unwrap();
        }

        assert_eq!(memory.producer_connections(), 1);
    }

    #[tokio::test]
    async fn one_disconnect_is_recovered_without_duplicates() {
        let memory = InMemoryBroker::new();
        let publisher = publisher(&memory);
        publisher.publish(&entered("warmup", "A")).await.unwrap();

        memory
            .inject_send_failures([BrokerError::Disconnected("connection reset".into())])
            .await;
        publisher.publish(&entered("cell-42", "B")).await.unwrap();

        assert_eq!(memory.producer_connections(), 2);
        assert_eq!(memory.record_count(TOPIC).await, 2);
    }

    #[tokio::test]
    async fn second_disconnect_surfaces_the_error() {
        let memory = InMemoryBroker::new();
        let publisher = publisher(&memory);

        memory
            .inject_send_failures([
                BrokerError::Disconnected("first".into()),
                BrokerError::Disconnected("second".into()),
            ])
            .await;
        let err = publisher.publish(&entered("cell-42", "B")).await.unwrap_err();

        assert!(matches!(err, PublishError::RetryFailed(BrokerError::Disconnected(_))));
        assert_eq!(memory.record_count(TOPIC).await, 0);
    }

    #[tokio::test]
    async fn non_connection_errors_are_not_retried() {
        let memory = InMemoryBroker::new();
        let publisher = publisher(&memory);

        memory
            .inject_send_failures([BrokerError::Send("message too large".into())])
            .await;
        let err = publisher.publish(&entered("cell-42", "B")).await.unwrap_err();

        assert!(matches!(err, PublishError::Send(_)));
        assert_eq!(memory.producer_connections(), 1);
    }

    #[tokio::test]
    async fn stale_failure_keeps_a_newer_producer() {
        let memory = InMemoryBroker::new();
        let publisher = publisher(&memory);
        let (stale, _) = publisher.producer().await.unwrap();

        // Reconnecting after that failure finds the cluster down: no producer is cached.
        memory.set_unavailable(true);
        assert!(publisher.reconnect(stale).await.is_err());
        memory.set_unavailable(false);

        let (fresh, _) = publisher.producer().await.unwrap();
        assert_ne!(fresh, stale);
        assert_eq!(memory.producer_connections(), 2);

        // A late report against the first producer reuses the healthy one.
        publisher.reconnect(stale).await.unwrap();
        assert_eq!(memory.producer_connections(), 2);
        let (current, _) = publisher.producer().await.unwrap();
        assert_eq!(current, fresh);
    }

    #[tokio::test]
    async fn unavailable_broker_is_not_ready() {
        let memory = InMemoryBroker::new();
        memory.set_unavailable(true);
        let publisher = publisher(&memory);

        let err = publisher.publish(&entered("cell-42", "B")).await.unwrap_err();
        assert!(matches!(err, PublishError::NotReady(BrokerError::Unavailable(_))));
    }
}
