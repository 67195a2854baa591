//! User entity - a player of the shared world.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{UserId, WorldCellId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Cell the player currently occupies. `None` until first placement.
    pub world_cell_id: Option<WorldCellId>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            world_cell_id: None,
            created_at: now,
        }
    }

    /// Place the user in `cell`, returning the cell they came from.
    pub fn relocate(&mut self, cell: WorldCellId) -> Option<WorldCellId> {
        self.world_cell_id.replace(cell)
    }
}
