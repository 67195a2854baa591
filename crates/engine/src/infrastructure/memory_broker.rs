//! In-memory broker for development and testing
//!
//! Partitioned, keyed, and group-aware like the real cluster, but process-local:
//! a presence event only reaches subscribers in the same process. It does not
//! persist records beyond the process lifetime and is never used as a silent
//! fallback when Kafka is unreachable.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};

use crate::infrastructure::partitioner::partition_for_key;
use crate::infrastructure::ports::{
    BrokerError, BrokerPort, ConsumerPort, Delivery, InboundRecord, OutboundRecord, ProducerPort,
    StartOffset, TopicSpec,
};

/// A record as held in a partition log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub offset: i64,
    pub key: String,
    pub payload: Vec<u8>,
}

/// In-process broker cluster.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<BrokerState>,
}

#[derive(Default)]
struct BrokerState {
    topics: DashMap<String, Arc<Mutex<TopicState>>>,
    unavailable: AtomicBool,
    injected_send_failures: Mutex<VecDeque<BrokerError>>,
    producer_connections: AtomicUsize,
    consumer_subscriptions: AtomicUsize,
    next_member_id: AtomicU64,
    assignment_delay_ms: AtomicU64,
}

struct TopicState {
    partitions: Vec<Vec<StoredRecord>>,
    members: Vec<GroupMember>,
}

struct GroupMember {
    id: u64,
    group_id: String,
    sender: mpsc::UnboundedSender<InboundRecord>,
}

impl TopicState {
    fn new(partitions: u32) -> Self {
        Self {
            partitions: vec![Vec::new(); partitions.max(1) as usize],
            members: Vec::new(),
        }
    }

    fn append(&mut self, record: OutboundRecord) -> Delivery {
        let partition = partition_for_key(record.key.as_bytes(), self.partitions.len() as u32);
        let log = &mut self.partitions[partition as usize];
        let offset = log.len() as i64;
        log.push(StoredRecord {
            offset,
            key: record.key.clone(),
            payload: record.payload.clone(),
        });

        self.route(InboundRecord {
            partition,
            offset,
            key: Some(record.key.into_bytes()),
            payload: Some(record.payload),
        });

        Delivery { partition, offset }
    }

    /// Every group receives the record once, on the member that owns the partition.
    fn route(&mut self, record: InboundRecord) {
        self.members.retain(|member| !member.sender.is_closed());

        let mut groups: BTreeMap<&str, Vec<&GroupMember>> = BTreeMap::new();
        for member in &self.members {
            groups.entry(member.group_id.as_str()).or_default().push(member);
        }

        for members in groups.values() {
            let owner = members[record.partition as usize % members.len()];
            if owner.sender.send(record.clone()).is_err() {
                tracing::debug!(member_id = owner.id, "Dropped record for departed group member");
            }
        }
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail as if the cluster were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail the next sends, in order, with the given errors.
    pub async fn inject_send_failures(&self, errors: impl IntoIterator<Item = BrokerError>) {
        self.state.injected_send_failures.lock().await.extend(errors);
    }

    /// Delay every group join by `delay` before partitions are assigned.
    ///
    /// Records produced while a member is joining are not delivered to it.
    pub fn set_assignment_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.state.assignment_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of producers handed out so far.
    pub fn producer_connections(&self) -> usize {
        self.state.producer_connections.load(Ordering::SeqCst)
    }

    /// Number of consumer subscriptions created so far.
    pub fn consumer_subscriptions(&self) -> usize {
        self.state.consumer_subscriptions.load(Ordering::SeqCst)
    }

    pub async fn partition_count(&self, topic: &str) -> Option<usize> {
        let topic = self.topic(topic)?;
        let state = topic.lock().await;
        Some(state.partitions.len())
    }

    /// Snapshot of one partition log.
    pub async fn records(&self, topic: &str, partition: i32) -> Vec<StoredRecord> {
        let Some(topic) = self.topic(topic) else {
            return Vec::new();
        };
        let state = topic.lock().await;
        usize::try_from(partition)
            .ok()
            .and_then(|p| state.partitions.get(p).cloned())
            .unwrap_or_default()
    }

    /// Total records across all partitions of a topic.
    pub async fn record_count(&self, topic: &str) -> usize {
        let Some(topic) = self.topic(topic) else {
            return 0;
        };
        let state = topic.lock().await;
        state.partitions.iter().map(Vec::len).sum()
    }

    /// Drop every group member so their next `recv` reports `Closed`.
    pub async fn close_consumers(&self) {
        let topics: Vec<_> = self.state.topics.iter().map(|t| Arc::clone(t.value())).collect();
        for topic in topics {
            topic.lock().await.members.clear();
        }
    }

    fn topic(&self, name: &str) -> Option<Arc<Mutex<TopicState>>> {
        self.state.topics.get(name).map(|t| Arc::clone(t.value()))
    }

    fn check_available(&self) -> Result<(), BrokerError> {
        if self.state.unavailable.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable(
                "in-memory broker marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerPort for InMemoryBroker {
    async fn ensure_topic(&self, topic: &TopicSpec) -> Result<(), BrokerError> {
        self.check_available()?;
        if topic.partitions == 0 {
            return Err(BrokerError::Config(format!(
                "topic {} needs at least one partition",
                topic.name
            )));
        }

        self.state
            .topics
            .entry(topic.name.clone())
            .or_insert_with(|| Arc::new(Mutex::new(TopicState::new(topic.partitions))));
        Ok(())
    }

    async fn connect_producer(&self) -> Result<Arc<dyn ProducerPort>, BrokerError> {
        self.check_available()?;
        self.state.producer_connections.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryProducer {
            broker: self.clone(),
        }))
    }

    async fn subscribe(
        &self,
        group_id: &str,
        topic: &str,
        start: StartOffset,
    ) -> Result<Box<dyn ConsumerPort>, BrokerError> {
        self.check_available()?;
        let topic_state = self
            .topic(topic)
            .ok_or_else(|| BrokerError::Receive(format!("unknown topic {topic}")))?;

        let delay = self.state.assignment_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        // The live tail starts at assignment.
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = topic_state.lock().await;

        let id = self.state.next_member_id.fetch_add(1, Ordering::SeqCst);
        state.members.push(GroupMember {
            id,
            group_id: group_id.to_string(),
            sender,
        });
        self.state.consumer_subscriptions.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(
            group_id,
            topic,
            member_id = id,
            offset = start.as_str(),
            "In-memory consumer subscribed"
        );
        Ok(Box::new(InMemoryConsumer { receiver }))
    }
}

struct InMemoryProducer {
    broker: InMemoryBroker,
}

#[async_trait]
impl ProducerPort for InMemoryProducer {
    async fn send(&self, record: OutboundRecord) -> Result<Delivery, BrokerError> {
        if self.broker.state.unavailable.load(Ordering::SeqCst) {
            return Err(BrokerError::Disconnected(
                "in-memory broker marked unavailable".to_string(),
            ));
        }
        if let Some(error) = self.broker.state.injected_send_failures.lock().await.pop_front() {
            return Err(error);
        }

        let topic = self
            .broker
            .topic(&record.topic)
            .ok_or_else(|| BrokerError::Send(format!("unknown topic {}", record.topic)))?;
        let mut state = topic.lock().await;
        Ok(state.append(record))
    }
}

struct InMemoryConsumer {
    receiver: mpsc::UnboundedReceiver<InboundRecord>,
}

#[async_trait]
impl ConsumerPort for InMemoryConsumer {
    async fn recv(&mut self) -> Result<InboundRecord, BrokerError> {
        self.receiver.recv().await.ok_or(BrokerError::Closed)
    }
}
