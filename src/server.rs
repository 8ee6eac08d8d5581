//! HTTP server assembly: router, middleware, background tasks, shutdown.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::service::spawn_sweeper;
use crate::ws::handler::ws_handler;

/// Builds the full application: REST API, WebSocket endpoint, and the
/// tracing and CORS layers.
pub fn build_app(state: AppState) -> Router {
    let router = api::build_router()
        .route("/ws/{room_id}", get(ws_handler))
        .layer(TraceLayer::new_for_http());

    let router = if state.config.cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

/// Serves the application on `listener` until `shutdown` resolves.
///
/// The expiry sweep runs for as long as the server does.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn run<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let sweeper = spawn_sweeper(
        Arc::clone(&state.registry),
        state.config.sweep_interval,
    );

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "server listening");
    }

    let result = axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown)
        .await;

    sweeper.abort();
    tracing::info!("server stopped");
    result
}
