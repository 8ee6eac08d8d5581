//! Room admin handlers: list, inspect, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{PaginationParams, RoomDetailResponse, RoomListResponse};
use crate::app_state::AppState;
use crate::domain::RoomId;
use crate::error::{ErrorResponse, PokerError};

/// `GET /rooms`: List live rooms with pagination.
#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    tag = "Rooms",
    summary = "List rooms",
    description = "Returns a paginated list of live rooms ordered by id, including whether each one is already past its TTL.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated room list", body = RoomListResponse),
    )
)]
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let (data, pagination) = params.paginate(state.registry.list().await);
    Json(RoomListResponse { data, pagination })
}

/// `GET /rooms/{id}`: Get full room state.
///
/// # Errors
///
/// Returns [`PokerError::RoomNotFound`] if the room does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{id}",
    tag = "Rooms",
    summary = "Get room details",
    description = "Returns voters, votes, settings, and activity timestamps for a single room.",
    params(
        ("id" = String, Path, description = "Room id"),
    ),
    responses(
        (status = 200, description = "Room details", body = RoomDetailResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PokerError> {
    let handle = state.registry.get(&RoomId::from(id)).await?;
    let room = handle.read().await;
    Ok(Json(RoomDetailResponse::from(&*room)))
}

/// `DELETE /rooms/{id}`: Delete a room and disconnect everyone in it.
///
/// # Errors
///
/// Returns [`PokerError::RoomNotFound`] if the room does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/rooms/{id}",
    tag = "Rooms",
    summary = "Delete a room",
    description = "Removes the room immediately, regardless of its TTL, and closes every session in it.",
    params(
        ("id" = String, Path, description = "Room id"),
    ),
    responses(
        (status = 204, description = "Room deleted"),
        (status = 404, description = "Room not found", body = ErrorResponse),
    )
)]
pub async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PokerError> {
    state.registry.delete(&RoomId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Room management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/{id}", get(get_room).delete(delete_room))
}
