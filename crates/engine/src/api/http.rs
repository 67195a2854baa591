//! HTTP routes.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;

use adventure_domain::common::some_if_not_blank;
use adventure_domain::{CellTemplate, Coordinates, Direction, UserId, WorldCellId};
use adventure_shared::{
    BridgeStatusResponse, CreateUserRequest, CreateUserResponse, ErrorResponse, MoveRequest,
    MoveResponse, TeleportRequest, TeleportResponse,
};

use crate::app::App;
use crate::use_cases::movement::{MoveUserError, TeleportTarget, TeleportUserError};

use super::presence_stream::presence_stream;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/users", post(create_user))
        .route("/api/move", post(move_user))
        .route("/api/teleport", post(teleport_user))
        .route("/api/presence/status", get(presence_status))
        .route(
            "/api/presence/stream/{world_cell_id}",
            get(presence_stream),
        )
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// World mutations
// =============================================================================

async fn create_user(
    State(app): State<Arc<App>>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    // Any unreadable body is treated as "no preferences".
    let request: CreateUserRequest = parse_body(&body).unwrap_or_default();

    let result = app
        .use_cases
        .movement
        .create_user
        .execute(request.name, request.email)
        .await
        .map_err(|e| ApiError::internal("failed_to_create_user", e))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            success: true,
            user: (&result.user).into(),
            cell: (&result.cell).into(),
        }),
    ))
}

async fn move_user(
    State(app): State<Arc<App>>,
    body: Bytes,
) -> Result<Json<MoveResponse>, ApiError> {
    let request: MoveRequest = parse_body(&body)?;

    let (Some(user_id), Some(direction)) = (
        some_if_not_blank(request.user_id),
        some_if_not_blank(request.direction),
    ) else {
        return Err(ApiError::BadRequest("missing_params"));
    };
    let user_id = UserId::new(user_id).map_err(|_| ApiError::BadRequest("missing_params"))?;
    let direction: Direction = direction
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid_direction"))?;

    let result = app
        .use_cases
        .movement
        .move_user
        .execute(&user_id, direction)
        .await
        .map_err(|e| match e {
            MoveUserError::UserNotReady => ApiError::NotFound("user_not_ready"),
            MoveUserError::Repo(e) => ApiError::internal("failed_to_move", e),
        })?;

    Ok(Json(MoveResponse {
        success: true,
        new_cell: (&result.new_cell).into(),
        previous_cell: Some((&result.previous_cell).into()),
    }))
}

async fn teleport_user(
    State(app): State<Arc<App>>,
    body: Bytes,
) -> Result<Json<TeleportResponse>, ApiError> {
    let request: TeleportRequest = parse_body(&body)?;

    let user_id = some_if_not_blank(request.user_id)
        .and_then(|id| UserId::new(id).ok())
        .ok_or(ApiError::BadRequest("missing_userId"))?;

    let target = match (some_if_not_blank(request.world_cell_id), request.x, request.y) {
        (Some(id), _, _) => Some(TeleportTarget::Cell(
            WorldCellId::new(id).map_err(|_| ApiError::NotFound("world_cell_not_found"))?,
        )),
        (None, Some(x), Some(y)) => Some(TeleportTarget::Coordinates {
            coordinates: Coordinates::new(x, y),
            template: CellTemplate::from_parts(
                request.map_character.as_deref(),
                request.title.as_deref(),
                request.description.as_deref(),
            ),
        }),
        _ => None,
    };

    let result = app
        .use_cases
        .movement
        .teleport_user
        .execute(&user_id, target)
        .await
        .map_err(|e| match e {
            TeleportUserError::UserNotFound => ApiError::NotFound("user_not_found"),
            TeleportUserError::CellNotFound => ApiError::NotFound("world_cell_not_found"),
            TeleportUserError::MissingCoordinates => ApiError::BadRequest("missing_coordinates"),
            TeleportUserError::Repo(e) => ApiError::internal("failed_to_teleport", e),
        })?;

    Ok(Json(TeleportResponse {
        success: true,
        user_id: result.user_id.to_string(),
        cell: (&result.cell).into(),
        from: result.from.as_ref().map(Into::into),
    }))
}

// =============================================================================
// Presence
// =============================================================================

async fn presence_status(State(app): State<Arc<App>>) -> Json<BridgeStatusResponse> {
    let stats = app.presence.bridge.stats();
    Json(BridgeStatusResponse {
        started: stats.started,
        running: stats.running,
        delivered: stats.delivered,
        malformed: stats.malformed,
        consumer_errors: stats.consumer_errors,
        subscriptions: app.presence.bus.total_subscriptions(),
    })
}

/// Empty bodies decode as `T::default()`.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        ApiError::BadRequest("invalid_json")
    })
}

/// Failure of an API call, rendered as `{"success": false, "error": "<code>"}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    NotFound(&'static str),
    Unavailable(&'static str),
    Internal(&'static str),
}

impl ApiError {
    /// Log the cause and hide it from the client.
    pub fn internal(code: &'static str, cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, code, "Request failed");
        Self::Internal(code)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(code)
            | Self::NotFound(code)
            | Self::Unavailable(code)
            | Self::Internal(code) => code,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.code()))).into_response()
    }
}
