//! System endpoints: health check and the voting card catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::VotingCardInfo;
use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    rooms: usize,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp, and the number of live rooms.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            rooms: state.registry.len().await,
        }),
    )
}

/// Decks clients can pick from. The server does not validate votes or
/// `votingCard` against this list.
#[must_use]
pub fn voting_card_catalog() -> Vec<VotingCardInfo> {
    vec![
        VotingCardInfo::new(
            "Fibonacci",
            &["0", "1", "2", "3", "5", "8", "13", "21", "34", "55", "89", "?"],
        ),
        VotingCardInfo::new(
            "Modified Fibonacci",
            &["0", "½", "1", "2", "3", "5", "8", "13", "20", "40", "100", "?"],
        ),
        VotingCardInfo::new(
            "T-Shirt",
            &["XS", "S", "M", "L", "XL", "XXL", "?"],
        ),
        VotingCardInfo::new(
            "Powers of 2",
            &["0", "1", "2", "4", "8", "16", "32", "64", "?"],
        ),
    ]
}

/// `GET /config/voting-cards`: List the known voting card decks.
#[utoipa::path(
    get,
    path = "/config/voting-cards",
    tag = "System",
    summary = "List voting card decks",
    description = "Returns the voting card decks clients can offer. Any other deck name is accepted as well.",
    responses(
        (status = 200, description = "Voting card catalog", body = Vec<VotingCardInfo>),
    )
)]
pub async fn voting_cards_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(voting_card_catalog()))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/voting-cards", get(voting_cards_handler))
}
