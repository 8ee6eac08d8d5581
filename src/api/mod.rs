//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Room endpoints are mounted under `/api/v1`; health and configuration
//! endpoints at the root. The OpenAPI document is served at
//! `/api-docs/openapi.json`, with Swagger UI at `/swagger-ui` when the
//! `swagger-ui` feature is enabled.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "planning-poker",
        description = "Admin and discovery endpoints of the planning poker server. The room protocol itself runs over WebSocket at /ws/{room_id}."
    ),
    paths(
        handlers::system::health_handler,
        handlers::system::voting_cards_handler,
        handlers::room::list_rooms,
        handlers::room::get_room,
        handlers::room::delete_room,
    ),
    tags(
        (name = "Rooms", description = "Inspect and delete rooms"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route(
        "/api-docs/openapi.json",
        axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
    );

    router
}
