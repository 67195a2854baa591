//! World cell entity - one square of the shared map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::none_if_blank;
use crate::value_objects::Coordinates;
use crate::WorldCellId;

/// A spatial unit of the game world and the unit of presence granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldCell {
    pub id: WorldCellId,
    pub coordinates: Coordinates,
    /// Single glyph drawn on the ASCII map.
    pub map_character: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorldCell {
    pub fn new(
        id: WorldCellId,
        coordinates: Coordinates,
        template: CellTemplate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            coordinates,
            map_character: template.map_character,
            title: template.title,
            description: template.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Content for a cell created on demand when a player walks off the known map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellTemplate {
    pub map_character: String,
    pub title: String,
    pub description: String,
}

impl CellTemplate {
    pub const DEFAULT_MAP_CHARACTER: &'static str = ".";
    pub const DEFAULT_TITLE: &'static str = "Unknown";
    pub const DEFAULT_DESCRIPTION: &'static str = "A mysterious place";

    /// Build a template from optional client-supplied fields; blank fields
    /// fall back to the unexplored-cell defaults.
    pub fn from_parts(
        map_character: Option<&str>,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Self {
        Self {
            map_character: map_character
                .and_then(none_if_blank)
                .unwrap_or(Self::DEFAULT_MAP_CHARACTER)
                .to_string(),
            title: title
                .and_then(none_if_blank)
                .unwrap_or(Self::DEFAULT_TITLE)
                .to_string(),
            description: description
                .and_then(none_if_blank)
                .unwrap_or(Self::DEFAULT_DESCRIPTION)
                .to_string(),
        }
    }
}

impl Default for CellTemplate {
    fn default() -> Self {
        Self::from_parts(None, None, None)
    }
}
