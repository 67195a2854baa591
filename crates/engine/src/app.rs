//! Application composition.

use std::sync::Arc;

use crate::infrastructure::ports::{
    BrokerPort, ClockPort, PresenceEventPort, TopicSpec, UserRepo, WorldCellRepo,
};
use crate::infrastructure::presence::{
    PresenceBridge, PresenceBroker, PresenceBus, PresencePublisher,
};
use crate::use_cases::movement::{CreateUser, MoveUser, TeleportUser};
use crate::use_cases::MovementUseCases;

/// Presence pipeline shared by every request in this process.
pub struct PresenceServices {
    pub broker: Arc<PresenceBroker>,
    pub publisher: Arc<PresencePublisher>,
    pub bridge: Arc<PresenceBridge>,
    pub bus: PresenceBus,
}

impl PresenceServices {
    pub fn new(client: Arc<dyn BrokerPort>, topic: TopicSpec, group_id: impl Into<String>) -> Self {
        let broker = Arc::new(PresenceBroker::new(client, topic));
        let bus = PresenceBus::new();
        let publisher = Arc::new(PresencePublisher::new(Arc::clone(&broker)));
        let bridge = Arc::new(PresenceBridge::new(
            Arc::clone(&broker),
            bus.clone(),
            group_id,
        ));

        Self {
            broker,
            publisher,
            bridge,
            bus,
        }
    }
}

/// Container for all use cases.
pub struct UseCases {
    pub movement: MovementUseCases,
}

/// Main application state.
pub struct App {
    pub presence: PresenceServices,
    pub use_cases: UseCases,
}

impl App {
    pub fn new(
        presence: PresenceServices,
        users: Arc<dyn UserRepo>,
        cells: Arc<dyn WorldCellRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let publisher: Arc<dyn PresenceEventPort> = presence.publisher.clone();

        let movement = MovementUseCases::new(
            Arc::new(CreateUser::new(
                users.clone(),
                cells.clone(),
                publisher.clone(),
                clock.clone(),
            )),
            Arc::new(MoveUser::new(
                users.clone(),
                cells.clone(),
                publisher.clone(),
                clock.clone(),
            )),
            Arc::new(TeleportUser::new(users, cells, publisher, clock)),
        );

        Self {
            presence,
            use_cases: UseCases { movement },
        }
    }
}
