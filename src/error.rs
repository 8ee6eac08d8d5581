//! Service error types with HTTP status and wire-frame mapping.
//!
//! [`PokerError`] is the central error type. Each variant maps to a numeric
//! code, an HTTP status for the REST surface, and a `{type:"error"}` frame
//! for WebSocket clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ServerMessage, TransportError};

/// Structured JSON error response body.
///
/// All REST error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "room not found: sprint-42",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Service error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status               |
/// |-----------|-------------------|---------------------------|
/// | 1000–1999 | Message shape     | 400 Bad Request           |
/// | 2000–2999 | Room state        | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server/transport  | 500 / 502                 |
#[derive(Debug, thiserror::Error)]
pub enum PokerError {
    /// Another session in the room already uses this voter name.
    #[error("duplicate voter name: {0}")]
    DuplicateName(String),

    /// Inbound message is not valid JSON or is missing required fields.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The `command` key carried a value outside the supported set.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// No room with the given id is registered.
    #[error("room not found: {0}")]
    RoomNotFound(String),

    /// The room was deleted or swept while the request was in flight.
    #[error("room is closed: {0}")]
    RoomClosed(String),

    /// The session already has a voter bound in this room.
    #[error("session already joined")]
    AlreadyJoined,

    /// Sending to or closing a client transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl PokerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidFormat(_) => 1001,
            Self::UnknownCommand(_) => 1002,
            Self::RoomNotFound(_) => 2001,
            Self::DuplicateName(_) => 2002,
            Self::RoomClosed(_) => 2003,
            Self::AlreadyJoined => 2004,
            Self::Transport(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidFormat(_) | Self::UnknownCommand(_) => StatusCode::BAD_REQUEST,
            Self::RoomNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateName(_) | Self::RoomClosed(_) | Self::AlreadyJoined => {
                StatusCode::CONFLICT
            }
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Builds the `{type:"error"}` frame sent to the offending client.
    #[must_use]
    pub fn to_server_message(&self) -> ServerMessage {
        let (error, details) = match self {
            Self::DuplicateName(_) => (
                "Someone already joined that room with the same name.".to_string(),
                None,
            ),
            Self::InvalidFormat(details) => ("invalid format".to_string(), Some(details.clone())),
            Self::UnknownCommand(command) => {
                ("unknown command".to_string(), Some(command.clone()))
            }
            Self::RoomNotFound(_) => ("Room does not exist".to_string(), None),
            Self::RoomClosed(_) => ("Room is closed".to_string(), None),
            Self::AlreadyJoined => ("Session already joined a room".to_string(), None),
            Self::Transport(err) => ("transport failure".to_string(), Some(err.to_string())),
        };
        ServerMessage::Error { error, details }
    }
}

impl IntoResponse for PokerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
