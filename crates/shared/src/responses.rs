//! Response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

use adventure_domain::{User, WorldCell};

/// Failure body shared by every endpoint: `{"success": false, "error": "<code>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: code.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldCellData {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub map_character: String,
    pub title: String,
    pub description: String,
}

impl From<&WorldCell> for WorldCellData {
    fn from(cell: &WorldCell) -> Self {
        Self {
            id: cell.id.to_string(),
            x: cell.coordinates.x,
            y: cell.coordinates.y,
            map_character: cell.map_character.clone(),
            title: cell.title.clone(),
            description: cell.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: String,
    pub name: String,
    pub email: String,
    pub world_cell_id: Option<String>,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            world_cell_id: user.world_cell_id.as_ref().map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub success: bool,
    pub user: UserData,
    pub cell: WorldCellData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub success: bool,
    pub new_cell: WorldCellData,
    pub previous_cell: Option<WorldCellData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeleportResponse {
    pub success: bool,
    pub user_id: String,
    pub cell: WorldCellData,
    pub from: Option<WorldCellData>,
}

/// Health of the broker-to-bus relay, for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatusResponse {
    pub started: bool,
    pub running: bool,
    pub delivered: u64,
    pub malformed: u64,
    pub consumer_errors: u64,
    pub subscriptions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new("missing_params")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "success": false, "error": "missing_params" })
        );
    }

    #[test]
    fn move_response_uses_camel_case() {
        let cell = WorldCellData {
            id: "c".into(),
            x: 1,
            y: 2,
            map_character: ".".into(),
            title: "Unknown".into(),
            description: "A mysterious place".into(),
        };
        let body = serde_json::to_value(MoveResponse {
            success: true,
            new_cell: cell,
            previous_cell: None,
        })
        .unwrap();

        assert_eq!(body["newCell"]["mapCharacter"], ".");
        assert!(body["previousCell"].is_null());
    }
}
