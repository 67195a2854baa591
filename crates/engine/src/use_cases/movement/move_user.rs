//! Move user use case.
//!
//! Steps a placed user one cell in a cardinal direction, creating the
//! destination cell on demand.

use std::sync::Arc;

use adventure_domain::{CellChange, CellTemplate, Direction, UserId, WorldCell};

use crate::infrastructure::ports::{
    ClockPort, PresenceEventPort, RepoError, UserRepo, WorldCellRepo,
};

use super::announce_cell_change;

#[derive(Debug, Clone)]
pub struct MoveUserResult {
    pub new_cell: WorldCell,
    pub previous_cell: WorldCell,
}

pub struct MoveUser {
    users: Arc<dyn UserRepo>,
    cells: Arc<dyn WorldCellRepo>,
    presence: Arc<dyn PresenceEventPort>,
    clock: Arc<dyn ClockPort>,
}

impl MoveUser {
    pub fn new(
        users: Arc<dyn UserRepo>,
        cells: Arc<dyn WorldCellRepo>,
        presence: Arc<dyn PresenceEventPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            users,
            cells,
            presence,
            clock,
        }
    }

    /// Execute the move.
    ///
    /// # Returns
    /// * `Ok(MoveUserResult)` - user now occupies the neighbouring cell
    /// * `Err(MoveUserError::UserNotReady)` - unknown user, or user not yet placed
    pub async fn execute(
        &self,
        user_id: &UserId,
        direction: Direction,
    ) -> Result<MoveUserResult, MoveUserError> {
        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or(MoveUserError::UserNotReady)?;
        let current_id = user
            .world_cell_id
            .clone()
            .ok_or(MoveUserError::UserNotReady)?;
        let previous_cell = self
            .cells
            .get(&current_id)
            .await?
            .ok_or(MoveUserError::UserNotReady)?;

        let destination = previous_cell.coordinates.step(direction);
        let new_cell = self
            .cells
            .get_or_create_at(destination, CellTemplate::default())
            .await?;

        user.relocate(new_cell.id.clone());
        self.users.save(&user).await?;

        tracing::info!(
            user_id = %user.id,
            direction = %direction,
            from = %previous_cell.id,
            to = %new_cell.id,
            "User moved"
        );

        let change = CellChange::new(
            user.id.clone(),
            Some(previous_cell.id.clone()),
            new_cell.id.clone(),
        );
        announce_cell_change(self.presence.as_ref(), &change, self.clock.now()).await;

        Ok(MoveUserResult {
            new_cell,
            previous_cell,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MoveUserError {
    #[error("User not found or not placed in the world")]
    UserNotReady,
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
