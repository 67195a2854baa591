//! Create user use case.
//!
//! Registers a player and places them at the world origin, creating the
//! origin cell on first use.

use std::sync::Arc;

use adventure_domain::common::some_if_not_blank;
use adventure_domain::{CellChange, CellTemplate, Coordinates, User, UserId, WorldCell};

use crate::infrastructure::ports::{
    ClockPort, PresenceEventPort, RepoError, UserRepo, WorldCellRepo,
};

use super::announce_cell_change;

#[derive(Debug, Clone)]
pub struct CreateUserResult {
    pub user: User,
    pub cell: WorldCell,
}

pub struct CreateUser {
    users: Arc<dyn UserRepo>,
    cells: Arc<dyn WorldCellRepo>,
    presence: Arc<dyn PresenceEventPort>,
    clock: Arc<dyn ClockPort>,
}

impl CreateUser {
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

    /// Blank or missing `name`/`email` get generated placeholder values.
    pub async fn execute(
        &self,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<CreateUserResult, CreateUserError> {
        let now = self.clock.now();
        let id = UserId::generate();

        let name = some_if_not_blank(name).unwrap_or_else(|| {
            let suffix: String = id.as_str().chars().take(6).collect();
            format!("Tester {suffix}")
        });
        let email = some_if_not_blank(email)
            .unwrap_or_else(|| format!("tester+{}@local.dev", now.timestamp_millis()));

        let cell = self
            .cells
            .get_or_create_at(Coordinates::ORIGIN, CellTemplate::default())
            .await?;

        let mut user = User::new(id, name, email, now);
        user.relocate(cell.id.clone());
        self.users.save(&user).await?;

        tracing::info!(
            user_id = %user.id,
            world_cell_id = %cell.id,
            "Created user at origin"
        );

        let change = CellChange::new(user.id.clone(), None, cell.id.clone());
        announce_cell_change(self.presence.as_ref(), &change, now).await;

        Ok(CreateUserResult { user, cell })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
