//! In-process presence bus.
//!
//! Maps a world cell to the set of local subscribers watching it. Delivery is
//! synchronous and best-effort: a failing subscriber is logged and skipped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use adventure_domain::{PresenceEvent, WorldCellId};

/// Why a subscriber could not take an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriberError {
    #[error("Subscriber closed")]
    Closed,
    #[error("Subscriber lagging, event dropped")]
    Lagging,
    #[error("Subscriber failed: {0}")]
    Failed(String),
}

/// Local recipient of presence events.
///
/// `notify` runs on the bridge task while the bus holds its read lock for the
/// cell, so it must not block and must not call back into the bus.
pub trait PresenceSubscriber: Send + Sync {
    fn notify(&self, event: &PresenceEvent) -> Result<(), SubscriberError>;
}

/// Identity of a registration. Subscribers are compared by allocation.
type SubscriberKey = usize;

fn subscriber_key(subscriber: &Arc<dyn PresenceSubscriber>) -> SubscriberKey {
    Arc::as_ptr(subscriber) as *const () as usize
}

/// One subscriber in one cell, shared by every live guard for that pair.
struct Registration {
    subscriber: Arc<dyn PresenceSubscriber>,
    guards: usize,
}

#[derive(Default)]
struct BusInner {
    cells: DashMap<WorldCellId, HashMap<SubscriberKey, Registration>>,
}

impl BusInner {
    /// Release one guard. Returns `true` when that was the last one and the
    /// subscriber is gone from the cell.
    fn release(&self, world_cell_id: &WorldCellId, key: SubscriberKey) -> bool {
        match self.cells.entry(world_cell_id.clone()) {
            Entry::Occupied(mut entry) => {
                let subscribers = entry.get_mut();
                let last = match subscribers.get_mut(&key) {
                    Some(registration) if registration.guards > 1 => {
                        registration.guards -= 1;
                        false
                    }
                    Some(_) => true,
                    None => false,
                };
                if last {
                    subscribers.remove(&key);
                }
                if subscribers.is_empty() {
                    entry.remove();
                }
                last
            }
            Entry::Vacant(_) => false,
        }
    }
}

/// Process-wide fan-out registry. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct PresenceBus {
    inner: Arc<BusInner>,
}

impl PresenceBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` for events about `world_cell_id`.
    ///
    /// Registering the same subscriber twice for a cell keeps one registration
    /// (one delivery per event) that lasts until every returned guard has
    /// unsubscribed or been dropped.
    pub fn subscribe(
        &self,
        world_cell_id: WorldCellId,
        subscriber: Arc<dyn PresenceSubscriber>,
    ) -> Subscription {
        let key = subscriber_key(&subscriber);
        self.inner
            .cells
            .entry(world_cell_id.clone())
            .or_default()
            .entry(key)
            .and_modify(|registration| registration.guards += 1)
            .or_insert_with(|| Registration {
                subscriber,
                guards: 1,
            });

        tracing::debug!(world_cell_id = %world_cell_id, "Presence subscriber registered");
        Subscription {
            bus: Arc::clone(&self.inner),
            world_cell_id,
            key,
            active: AtomicBool::new(true),
        }
    }

    /// Deliver `event` to every subscriber of its cell. Returns how many accepted it.
    pub fn push(&self, event: &PresenceEvent) -> usize {
        let Some(subscribers) = self.inner.cells.get(&event.world_cell_id) else {
            return 0;
        };

        let mut delivered = 0;
        for registration in subscribers.values() {
            match registration.subscriber.notify(event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        world_cell_id = %event.world_cell_id,
                        kind = %event.kind,
                        "Presence subscriber rejected event"
                    );
                }
            }
        }
        delivered
    }

    pub fn subscriber_count(&self, world_cell_id: &WorldCellId) -> usize {
        self.inner
            .cells
            .get(world_cell_id)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Registrations across all cells.
    pub fn total_subscriptions(&self) -> usize {
        self.inner.cells.iter().map(|entry| entry.value().len()).sum()
    }
}

/// Registration guard returned by [`PresenceBus::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Arc<BusInner>,
    world_cell_id: WorldCellId,
    key: SubscriberKey,
    active: AtomicBool,
}

impl Subscription {
    pub fn world_cell_id(&self) -> &WorldCellId {
        &self.world_cell_id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Release this guard. Only the first call has an effect and returns `true`.
    ///
    /// When no other guard shares the registration, once this returns no
    /// delivery to the subscriber is in flight and none will start.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        let removed = self.bus.release(&self.world_cell_id, self.key);
        tracing::debug!(
            world_cell_id = %self.world_cell_id,
            removed,
            "Presence subscriber unregistered"
        );
        true
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
