//! Kafka broker adapter (librdkafka via `rdkafka`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::BorrowedMessage;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::Message;

use crate::infrastructure::ports::{
    BrokerError, BrokerPort, ConsumerPort, Delivery, InboundRecord, OutboundRecord, ProducerPort,
    StartOffset, TopicSpec,
};

/// Upper bound for admin round-trips so an unreachable cluster fails fast.
const ADMIN_TIMEOUT: Duration = Duration::from_secs(10);
/// How long a send may wait for space in the local producer queue.
const SEND_QUEUE_TIMEOUT: Duration = Duration::from_secs(5);
const MESSAGE_TIMEOUT_MS: &str = "10000";
/// How long each poll lasts while a new consumer waits for its assignment.
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Kafka cluster connection factory.
pub struct KafkaBroker {
    brokers: Vec<String>,
    client_id: String,
}

impl KafkaBroker {
    pub fn new(brokers: Vec<String>, client_id: impl Into<String>) -> Result<Self, BrokerError> {
        let brokers: Vec<String> = brokers
            .into_iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        if brokers.is_empty() {
            return Err(BrokerError::Config(
                "at least one bootstrap broker is required".to_string(),
            ));
        }

        Ok(Self {
            brokers,
            client_id: client_id.into(),
        })
    }

    fn base_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", self.brokers.join(","))
            .set("client.id", &self.client_id);
        config
    }
}

#[async_trait]
impl BrokerPort for KafkaBroker {
    async fn ensure_topic(&self, topic: &TopicSpec) -> Result<(), BrokerError> {
        let admin: AdminClient<DefaultClientContext> = self
            .base_config()
            .create()
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        let new_topic = NewTopic::new(
            &topic.name,
            topic.partitions as i32,
            TopicReplication::Fixed(topic.replication as i32),
        );
        let options = AdminOptions::new()
            .operation_timeout(Some(ADMIN_TIMEOUT))
            .request_timeout(Some(ADMIN_TIMEOUT));

        let results = admin
            .create_topics(&[new_topic], &options)
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        for result in results {
            match result {
                Ok(name) => {
                    tracing::info!(
                        topic = %name,
                        partitions = topic.partitions,
                        replication = topic.replication,
                        "Created Kafka topic"
                    );
                }
                Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    tracing::debug!(topic = %name, "Kafka topic already exists");
                }
                Err((name, code)) => {
                    return Err(BrokerError::Unavailable(format!(
                        "failed to create topic {name}: {code}"
                    )));
                }
            }
        }
        Ok(())
    }

    async fn connect_producer(&self) -> Result<Arc<dyn ProducerPort>, BrokerError> {
        let producer: FutureProducer = self
            .base_config()
            .set("partitioner", "murmur2_random")
            .set("message.timeout.ms", MESSAGE_TIMEOUT_MS)
            .create()
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        tracing::debug!(brokers = %self.brokers.join(","), "Kafka producer created");
        Ok(Arc::new(KafkaProducer { producer }))
    }

    async fn subscribe(
        &self,
        group_id: &str,
        topic: &str,
        start: StartOffset,
    ) -> Result<Box<dyn ConsumerPort>, BrokerError> {
        let consumer: StreamConsumer = self
            .base_config()
            .set("group.id", group_id)
            .set("auto.offset.reset", start.as_str())
            // Offsets are never committed, so every start is a fresh live tail.
            .set("enable.auto.commit", "false")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        consumer
            .subscribe(&[topic])
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        let pending = wait_for_assignment(&consumer, group_id, topic).await?;

        tracing::info!(group_id, topic, offset = start.as_str(), "Kafka consumer subscribed");
        Ok(Box::new(KafkaConsumer { consumer, pending }))
    }
}

struct KafkaProducer {
    producer: FutureProducer,
}

#[async_trait]
impl ProducerPort for KafkaProducer {
    async fn send(&self, record: OutboundRecord) -> Result<Delivery, BrokerError> {
        let future_record = FutureRecord::to(&record.topic)
            .key(record.key.as_str())
            .payload(record.payload.as_slice());

        let (partition, offset) = self
            .producer
            .send(future_record, SEND_QUEUE_TIMEOUT)
            .await
            .map_err(|(e, _message)| classify(e, BrokerError::Send))?;

        Ok(Delivery { partition, offset })
    }
}

struct KafkaConsumer {
    consumer: StreamConsumer,
    /// Record received while the group join was being driven.
    pending: Option<InboundRecord>,
}

#[async_trait]
impl ConsumerPort for KafkaConsumer {
    async fn recv(&mut self) -> Result<InboundRecord, BrokerError> {
        if let Some(record) = self.pending.take() {
            return Ok(record);
        }

        let message = self
            .consumer
            .recv()
            .await
            .map_err(|e| classify(e, BrokerError::Receive))?;
        Ok(inbound(&message))
    }
}

fn inbound(message: &BorrowedMessage<'_>) -> InboundRecord {
    InboundRecord {
        partition: message.partition(),
        offset: message.offset(),
        key: message.key().map(<[u8]>::to_vec),
        payload: message.payload().map(<[u8]>::to_vec),
    }
}

/// Poll `consumer` until the group join has assigned it partitions.
///
/// The rebalance only progresses while the consumer is polled, and `latest`
/// is resolved against the log end at assignment. A record that arrives
/// during the join is returned for the first `recv`. A group with more
/// members than partitions can leave this member empty; after
/// [`ADMIN_TIMEOUT`] it is returned idle rather than failed.
async fn wait_for_assignment(
    consumer: &StreamConsumer,
    group_id: &str,
    topic: &str,
) -> Result<Option<InboundRecord>, BrokerError> {
    let deadline = tokio::time::Instant::now() + ADMIN_TIMEOUT;
    loop {
        let assigned = consumer
            .assignment()
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?
            .count();
        if assigned > 0 {
            tracing::debug!(group_id, topic, partitions = assigned, "Kafka consumer assigned");
            return Ok(None);
        }
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!(group_id, topic, "Kafka consumer joined without partitions");
            return Ok(None);
        }

        match tokio::time::timeout(JOIN_POLL_INTERVAL, consumer.recv()).await {
            Ok(Ok(message)) => return Ok(Some(inbound(&message))),
            Ok(Err(e)) => return Err(classify(e, BrokerError::Unavailable)),
            Err(_) => {}
        }
    }
}

/// Lost-connection failures become `Disconnected`; everything else uses `fallback`.
///
/// librdkafka retries in-flight sends internally, so a lost broker usually
/// shows up as a delivery timeout or a full local queue rather than a
/// transport error.
fn classify(error: KafkaError, fallback: fn(String) -> BrokerError) -> BrokerError {
    match error.rdkafka_error_code() {
        Some(
            RDKafkaErrorCode::BrokerTransportFailure
            | RDKafkaErrorCode::AllBrokersDown
            | RDKafkaErrorCode::NetworkException
            | RDKafkaErrorCode::MessageTimedOut
            | RDKafkaErrorCode::QueueFull,
        ) => BrokerError::Disconnected(error.to_string()),
        _ => fallback(error.to_string()),
    }
}
