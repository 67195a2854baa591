//! In-memory world store.
//!
//! Users and world cells live for the process lifetime. Cells are indexed by
//! coordinates so at most one cell exists per grid position.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use adventure_domain::{CellTemplate, Coordinates, User, UserId, WorldCell, WorldCellId};

use crate::infrastructure::ports::{ClockPort, RepoError, UserRepo, WorldCellRepo};

pub struct InMemoryWorldStore {
    users: DashMap<UserId, User>,
    cells: DashMap<WorldCellId, WorldCell>,
    by_coordinates: DashMap<Coordinates, WorldCellId>,
    clock: Arc<dyn ClockPort>,
}

impl InMemoryWorldStore {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            users: DashMap::new(),
            cells: DashMap::new(),
            by_coordinates: DashMap::new(),
            clock,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[async_trait]
impl UserRepo for InMemoryWorldStore {
    async fn get(&self, id: &UserId) -> Result<Option<User>, RepoError> {
        Ok(self.users.get(id).map(|user| user.clone()))
    }

    async fn save(&self, user: &User) -> Result<(), RepoError> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }
}

#[async_trait]
impl WorldCellRepo for InMemoryWorldStore {
    async fn get(&self, id: &WorldCellId) -> Result<Option<WorldCell>, RepoError> {
        Ok(self.cells.get(id).map(|cell| cell.clone()))
    }

    async fn get_or_create_at(
        &self,
        coordinates: Coordinates,
        template: CellTemplate,
    ) -> Result<WorldCell, RepoError> {
        // The coordinate entry stays locked until the cell is stored.
        match self.by_coordinates.entry(coordinates) {
            Entry::Occupied(entry) => self
                .cells
                .get(entry.get())
                .map(|cell| cell.clone())
                .ok_or_else(|| RepoError::not_found("WorldCell", entry.get())),
            Entry::Vacant(entry) => {
                let cell = WorldCell::new(
                    WorldCellId::generate(),
                    coordinates,
                    template,
                    self.clock.now(),
                );
                self.cells.insert(cell.id.clone(), cell.clone());
                entry.insert(cell.id.clone());
                tracing::debug!(
                    world_cell_id = %cell.id,
                    coordinates = %coordinates,
                    "Created world cell"
                );
                Ok(cell)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::infrastructure::clock::FixedClock;

    fn store() -> InMemoryWorldStore {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        InMemoryWorldStore::new(Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn get_or_create_reuses_existing_cell() {
        let store = store();
        let first = store
            .get_or_create_at(Coordinates::new(1, 2), CellTemplate::default())
            .await
            .unwrap();
        let custom = CellTemplate::from_parts(Some("#"), Some("Wall"), None);
        let second = store
            .get_or_create_at(Coordinates::new(1, 2), custom)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.map_character, CellTemplate::DEFAULT_MAP_CHARACTER);
        assert_eq!(store.cell_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_creates_at_one_position_yield_one_cell() {
        let store = Arc::new(store());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .get_or_create_at(Coordinates::new(5, 5), CellTemplate::default())
                        .await
                        .unwrap()
                        .id
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.cell_count(), 1);
    }

    #[tokio::test]
    async fn cells_are_found_by_id() {
        let store = store();
        let cell = store
            .get_or_create_at(Coordinates::new(-3, 4), CellTemplate::default())
            .await
            .unwrap();

        let by_id = WorldCellRepo::get(&store, &cell.id).await.unwrap();
        assert_eq!(by_id.as_ref(), Some(&cell));
        assert!(WorldCellRepo::get(&store, &WorldCellId::new("missing").unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn users_round_trip() {
        let store = store();
        let mut user = User::new(UserId::new("u-1").unwrap(), "Tester", "t@local.dev", Utc::now());
        user.relocate(WorldCellId::new("c").unwrap());
        store.save(&user).await.unwrap();

        let loaded = UserRepo::get(&store, &user.id).await.unwrap();
        assert_eq!(loaded, Some(user));
    }
}
