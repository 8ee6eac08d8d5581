//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::RoomId;

/// `GET /ws/{room_id}`: Upgrade HTTP connection to WebSocket and join
/// the room named in the path.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let registry = Arc::clone(&state.registry);
    let room_id = RoomId::from(room_id);

    ws.on_upgrade(move |socket| run_connection(socket, room_id, registry))
}
