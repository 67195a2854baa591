//! Broker-to-bus relay.
//!
//! One consumer per process, in a fixed consumer group, reading from the live
//! tail of the presence topic. Every well-formed event is pushed to the local
//! bus. Started lazily by the first streaming client and never stopped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use adventure_domain::PresenceEvent;

use crate::infrastructure::ports::{BrokerError, ConsumerPort, InboundRecord, StartOffset};

use super::broker::PresenceBroker;
use super::bus::PresenceBus;

/// Pause after a consumer error before polling again.
const CONSUMER_ERROR_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Default)]
struct BridgeCounters {
    running: AtomicBool,
    delivered: AtomicU64,
    malformed: AtomicU64,
    consumer_errors: AtomicU64,
}

/// Point-in-time view of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BridgeStats {
    pub started: bool,
    pub running: bool,
    pub delivered: u64,
    pub malformed: u64,
    pub consumer_errors: u64,
}

pub struct PresenceBridge {
    broker: Arc<PresenceBroker>,
    bus: PresenceBus,
    group_id: String,
    started: OnceCell<()>,
    counters: Arc<BridgeCounters>,
}

impl PresenceBridge {
    pub fn new(broker: Arc<PresenceBroker>, bus: PresenceBus, group_id: impl Into<String>) -> Self {
        Self {
            broker,
            bus,
            group_id: group_id.into(),
            started: OnceCell::new(),
            counters: Arc::new(BridgeCounters::default()),
        }
    }

    /// Start the relay if it is not already running.
    ///
    /// Concurrent first callers all wait on one start attempt and exactly one
    /// consumer is created. A failed start is not remembered.
    pub async fn ensure_started(&self) -> Result<(), BrokerError> {
        self.started.get_or_try_init(|| self.start()).await.map(|_| ())
    }

    async fn start(&self) -> Result<(), BrokerError> {
        self.broker.ready().await?;

        let topic = &self.broker.topic().name;
        // Resolves only once this member holds its partitions.
        let consumer = self
            .broker
            .client()
            .subscribe(&self.group_id, topic, StartOffset::Latest)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, group_id = %self.group_id, "Presence bridge failed to subscribe");
                e
            })?;

        self.counters.running.store(true, Ordering::SeqCst);
        tokio::spawn(relay_loop(
            consumer,
            self.bus.clone(),
            Arc::clone(&self.counters),
        ));

        tracing::info!(group_id = %self.group_id, topic = %topic, "Presence bridge started");
        Ok(())
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            started: self.started.initialized(),
            running: self.counters.running.load(Ordering::SeqCst),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            malformed: self.counters.malformed.load(Ordering::Relaxed),
            consumer_errors: self.counters.consumer_errors.load(Ordering::Relaxed),
        }
    }
}

async fn relay_loop(mut consumer: Box<dyn ConsumerPort>, bus: PresenceBus, counters: Arc<BridgeCounters>) {
    loop {
        match consumer.recv().await {
            Ok(record) => relay(&record, &bus, &counters),
            Err(BrokerError::Closed) => {
                tracing::error!("Presence consumer closed, bridge stopped");
                break;
            }
            Err(e) => {
                counters.consumer_errors.fetch_add(1, Ordering::Relaxed);
                tracing::error!(error = %e, "Presence consumer error");
                tokio::time::sleep(CONSUMER_ERROR_BACKOFF).await;
            }
        }
    }
    counters.running.store(false, Ordering::SeqCst);
}

fn relay(record: &InboundRecord, bus: &PresenceBus, counters: &BridgeCounters) {
    let Some(payload) = record.payload.as_deref() else {
        tracing::debug!(partition = record.partition, offset = record.offset, "Skipping empty presence record");
        return;
    };

    match serde_json::from_slice::<PresenceEvent>(payload) {
        Ok(event) => {
            counters.delivered.fetch_add(1, Ordering::Relaxed);
            let subscribers = bus.push(&event);
            tracing::debug!(
                world_cell_id = %event.world_cell_id,
                kind = %event.kind,
                subscribers,
                "Relayed presence event"
            );
        }
        Err(e) => {
            counters.malformed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                error = %e,
                partition = record.partition,
                offset = record.offset,
                "Skipping malformed presence record"
            );
        }
    }
}
