//! Process-wide handle to the presence topic.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::infrastructure::ports::{BrokerError, BrokerPort, TopicSpec};

/// Broker client plus the one-time topic provisioning that guards it.
///
/// Publisher and bridge share one instance so the topic is provisioned once
/// per process. A failed provisioning attempt is not cached: the next caller
/// tries again.
pub struct PresenceBroker {
    client: Arc<dyn BrokerPort>,
    topic: TopicSpec,
    ready: OnceCell<()>,
}

impl PresenceBroker {
    pub fn new(client: Arc<dyn BrokerPort>, topic: TopicSpec) -> Self {
        Self {
            client,
            topic,
            ready: OnceCell::new(),
        }
    }

    pub fn client(&self) -> &Arc<dyn BrokerPort> {
        &self.client
    }

    pub fn topic(&self) -> &TopicSpec {
        &self.topic
    }

    /// Ensure the presence topic exists. Concurrent callers share one attempt.
    pub async fn ready(&self) -> Result<(), BrokerError> {
        self.ready
            .get_or_try_init(|| async {
                self.client.ensure_topic(&self.topic).await.map_err(|e| {
                    tracing::error!(
                        error = %e,
                        topic = %self.topic.name,
                        "Failed to provision presence topic"
                    );
                    e
                })?;
                tracing::info!(
                    topic = %self.topic.name,
                    partitions = self.topic.partitions,
                    "Presence topic ready"
                );
                Ok::<(), BrokerError>(())
            })
            .await
            .map(|_| ())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }
}
