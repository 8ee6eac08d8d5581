//! Per-connection session identifier.
//!
//! [`SessionId`] wraps a [`uuid::Uuid`] (v4) so that sessions can key
//! the room's connection and voter maps without leaking transport types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one live client connection.
///
/// Generated when the WebSocket is accepted and dropped with the
/// connection task. A reconnecting client always gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Creates a new random `SessionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
