//! Request bodies for the world-mutation endpoints.
//!
//! Required fields are still `Option` so a missing field is reported with the
//! endpoint's own error code instead of a generic extractor rejection.

use serde::{Deserialize, Serialize};

/// `POST /api/users`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /api/move`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    /// `north`, `south`, `east` or `west`.
    #[serde(default)]
    pub direction: Option<String>,
}

/// `POST /api/teleport`
///
/// Either `world_cell_id` or both coordinates must be present. Cell content
/// fields only apply when the target cell does not exist yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeleportRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub x: Option<i32>,
    #[serde(default)]
    pub y: Option<i32>,
    #[serde(default)]
    pub world_cell_id: Option<String>,
    #[serde(default)]
    pub map_character: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
