//! World storage ports.

use async_trait::async_trait;

use adventure_domain::{CellTemplate, Coordinates, User, UserId, WorldCell, WorldCellId};

use super::error::RepoError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get(&self, id: &UserId) -> Result<Option<User>, RepoError>;

    /// Insert or replace.
    async fn save(&self, user: &User) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorldCellRepo: Send + Sync {
    async fn get(&self, id: &WorldCellId) -> Result<Option<WorldCell>, RepoError>;

    /// Return the cell at `coordinates`, creating it from `template` if absent.
    ///
    /// Concurrent callers for the same coordinates observe the same cell.
    async fn get_or_create_at(
        &self,
        coordinates: Coordinates,
        template: CellTemplate,
    ) -> Result<WorldCell, RepoError>;
}
