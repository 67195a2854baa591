//! Teleport user use case.
//!
//! Places a user directly into a cell, either an existing one by id or the
//! cell at given coordinates (created from a template if absent).

use std::sync::Arc;

use adventure_domain::{CellChange, CellTemplate, Coordinates, UserId, WorldCell, WorldCellId};

use crate::infrastructure::ports::{
    ClockPort, PresenceEventPort, RepoError, UserRepo, WorldCellRepo,
};

use super::announce_cell_change;

/// Where a teleport lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeleportTarget {
    Cell(WorldCellId),
    Coordinates {
        coordinates: Coordinates,
        template: CellTemplate,
    },
}

#[derive(Debug, Clone)]
pub struct TeleportUserResult {
    pub user_id: UserId,
    pub cell: WorldCell,
    /// Cell the user left. `None` for a user who had not been placed yet.
    pub from: Option<WorldCell>,
}

pub struct TeleportUser {
    users: Arc<dyn UserRepo>,
    cells: Arc<dyn WorldCellRepo>,
    presence: Arc<dyn PresenceEventPort>,
    clock: Arc<dyn ClockPort>,
}

impl TeleportUser {
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

    pub async fn execute(
        &self,
        user_id: &UserId,
        target: Option<TeleportTarget>,
    ) -> Result<TeleportUserResult, TeleportUserError> {
        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or(TeleportUserError::UserNotFound)?;

        let target = target.ok_or(TeleportUserError::MissingCoordinates)?;
        let cell = match target {
            TeleportTarget::Cell(id) => self
                .cells
                .get(&id)
                .await?
                .ok_or(TeleportUserError::CellNotFound)?,
            TeleportTarget::Coordinates {
                coordinates,
                template,
            } => self.cells.get_or_create_at(coordinates, template).await?,
        };

        let from = match &user.world_cell_id {
            Some(id) => self.cells.get(id).await?,
            None => None,
        };

        let change = CellChange::new(user.id.clone(), user.world_cell_id.clone(), cell.id.clone());
        if change.is_noop() {
            tracing::debug!(user_id = %user.id, world_cell_id = %cell.id, "Teleport to current cell");
            return Ok(TeleportUserResult {
                user_id: user.id,
                cell,
                from,
            });
        }

        user.relocate(cell.id.clone());
        self.users.save(&user).await?;

        tracing::info!(
            user_id = %user.id,
            to = %cell.id,
            coordinates = %cell.coordinates,
            "User teleported"
        );

        announce_cell_change(self.presence.as_ref(), &change, self.clock.now()).await;

        Ok(TeleportUserResult {
            user_id: user.id,
            cell,
            from,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TeleportUserError {
    #[error("User not found")]
    UserNotFound,
    #[error("World cell not found")]
    CellNotFound,
    #[error("Neither a world cell id nor coordinates were given")]
    MissingCoordinates,
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;

    use super::*;
    use crate::infrastructure::memory_store::InMemoryWorldStore;
    use crate::infrastructure::ports::MockPresenceEventPort;
    use crate::use_cases::movement::test_support::{clock, delivery, now, store};
    use adventure_domain::{PresenceEventKind, User};

    async fn user_at(store: &InMemoryWorldStore, at: Option<Coordinates>) -> User {
        let mut user = User::new(UserId::generate(), "Tester", "t@local.dev", now());
        if let Some(at) = at {
            let cell = store
                .get_or_create_at(at, CellTemplate::default())
                .await
                .unwrap();
            user.relocate(cell.id);
        }
        store.save(&user).await.unwrap();
        user
    }

    fn coordinates(x: i32, y: i32) -> Option<TeleportTarget> {
        Some(TeleportTarget::Coordinates {
            coordinates: Coordinates::new(x, y),
            template: CellTemplate::from_parts(Some("#"), Some("Vault"), Some("Cold stone")),
        })
    }

    #[tokio::test]
    async fn creates_target_cell_from_template() {
        let store = store();
        let user = user_at(&store, Some(Coordinates::ORIGIN)).await;

        let mut presence = MockPresenceEventPort::new();
        let mut seq = Sequence::new();
        presence
            .expect_publish()
            .withf(|event| event.kind == PresenceEventKind::UserLeft)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(delivery()));
        presence
            .expect_publish()
            .withf(|event| event.kind == PresenceEventKind::UserEntered)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(delivery()));

        let use_case = TeleportUser::new(store.clone(), store.clone(), Arc::new(presence), clock());
        let result = use_case.execute(&user.id, coordinates(5, 5)).await.unwrap();

        assert_eq!(result.cell.coordinates, Coordinates::new(5, 5));
        assert_eq!(result.cell.title, "Vault");
        assert_eq!(result.from.map(|c| c.coordinates), Some(Coordinates::ORIGIN));
    }

    #[tokio::test]
    async fn teleports_into_existing_cell_by_id() {
        let store = store();
        let user = user_at(&store, Some(Coordinates::ORIGIN)).await;
        let target = store
            .get_or_create_at(Coordinates::new(9, 9), CellTemplate::default())
            .await
            .unwrap();

        let mut presence = MockPresenceEventPort::new();
        presence.expect_publish().times(2).returning(|_| Ok(delivery()));

        let use_case = TeleportUser::new(store.clone(), store.clone(), Arc::new(presence), clock());
        let result = use_case
            .execute(&user.id, Some(TeleportTarget::Cell(target.id.clone())))
            .await
            .unwrap();

        assert_eq!(result.cell.id, target.id);
        let saved = UserRepo::get(store.as_ref(), &user.id).await.unwrap().unwrap();
        assert_eq!(saved.world_cell_id, Some(target.id));
    }

    #[tokio::test]
    async fn first_placement_only_announces_entry() {
        let store = store();
        let user = user_at(&store, None).await;

        let mut presence = MockPresenceEventPort::new();
        presence
            .expect_publish()
            .withf(|event| event.kind == PresenceEventKind::UserEntered)
            .times(1)
            .returning(|_| Ok(delivery()));

        let use_case = TeleportUser::new(store.clone(), store, Arc::new(presence), clock());
        let result = use_case.execute(&user.id, coordinates(1, 1)).await.unwrap();
        assert!(result.from.is_none());
    }

    #[tokio::test]
    async fn same_cell_teleport_is_silent() {
        let store = store();
        let user = user_at(&store, Some(Coordinates::new(2, 2))).await;

        let mut presence = MockPresenceEventPort::new();
        presence.expect_publish().never();

        let use_case = TeleportUser::new(store.clone(), store, Arc::new(presence), clock());
        let result = use_case.execute(&user.id, coordinates(2, 2)).await.unwrap();
        assert_eq!(result.from.map(|c| c.id), Some(result.cell.id));
    }

    #[tokio::test]
    async fn missing_user_and_cell_are_reported() {
        let store = store();
        let use_case = TeleportUser::new(
            store.clone(),
            store.clone(),
            Arc::new(MockPresenceEventPort::new()),
            clock(),
        );

        // An unknown user is reported before a missing target.
        let err = use_case
            .execute(&UserId::new("ghost").unwrap(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TeleportUserError::UserNotFound));

        let user = user_at(&store, None).await;
        let err = use_case
            .execute(
                &user.id,
                Some(TeleportTarget::Cell(WorldCellId::new("nowhere").unwrap())),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TeleportUserError::CellNotFound));

        let err = use_case.execute(&user.id, None).await.unwrap_err();
        assert!(matches!(err, TeleportUserError::MissingCoordinates));
    }
}
