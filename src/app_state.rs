//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::domain::RoomRegistry;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Every live room, keyed by id.
    pub registry: Arc<RoomRegistry>,
    /// Configuration the server was started with.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Builds the state with an empty registry configured from `config`.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::from_config(&config)),
            config: Arc::new(config),
        }
    }
}
