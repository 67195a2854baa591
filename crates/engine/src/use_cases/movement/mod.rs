//! Movement use cases.
//!
//! Every confirmed change of the cell a user occupies is announced on the
//! presence topic after the world store has been updated.

mod create_user;
mod move_user;
mod teleport_user;

pub use create_user::{CreateUser, CreateUserError, CreateUserResult};
pub use move_user::{MoveUser, MoveUserError, MoveUserResult};
pub use teleport_user::{TeleportTarget, TeleportUser, TeleportUserError, TeleportUserResult};

use std::sync::Arc;

use chrono::{DateTime, Utc};

use adventure_domain::CellChange;

use crate::infrastructure::ports::PresenceEventPort;

/// Container for movement use cases.
pub struct MovementUseCases {
    pub create_user: Arc<CreateUser>,
    pub move_user: Arc<MoveUser>,
    pub teleport_user: Arc<TeleportUser>,
}

impl MovementUseCases {
    pub fn new(
        create_user: Arc<CreateUser>,
        move_user: Arc<MoveUser>,
        teleport_user: Arc<TeleportUser>,
    ) -> Self {
        Self {
            create_user,
            move_user,
            teleport_user,
        }
    }
}

/// Publish the presence events for `change`, in order.
///
/// Best-effort: the world mutation has already happened, so a failed publish
/// is logged and the next event is still attempted.
pub(crate) async fn announce_cell_change(
    presence: &dyn PresenceEventPort,
    change: &CellChange,
    at: DateTime<Utc>,
) {
    for event in change.presence_events(at) {
        if let Err(e) = presence.publish(&event).await {
            tracing::warn!(
                error = %e,
                kind = %event.kind,
                world_cell_id = %event.world_cell_id,
                user_id = %event.user_id,
                "Presence notification dropped"
            );
        }
    }
}
