//! Client transport seam.
//!
//! A [`Room`](super::Room) never touches sockets directly. It holds each
//! session as an `Arc<dyn SessionTransport>` and only needs to push text
//! frames and close the connection. Receiving stays with the connection
//! task that owns the read half.

use std::fmt;

use async_trait::async_trait;

use super::ServerMessage;

/// Close code for an orderly close (user left, room deleted or expired).
pub const CLOSE_NORMAL: u16 = 1000;

/// Application close code for a join rejected because the name is taken.
pub const CLOSE_DUPLICATE_NAME: u16 = 4000;

/// Why the server is closing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The voter left or sent `ExitRoom`.
    UserLeft,
    /// The room was deleted explicitly or swept after expiring.
    RoomDeleted,
    /// The requested voter name is already in use in the room.
    DuplicateName,
    /// The first frame was not a valid join request.
    HandshakeFailed,
}

impl CloseReason {
    /// WebSocket close code sent with this reason.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::DuplicateName => CLOSE_DUPLICATE_NAME,
            Self::UserLeft | Self::RoomDeleted | Self::HandshakeFailed => CLOSE_NORMAL,
        }
    }

    /// Human-readable close reason.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::UserLeft => "User left room",
            Self::RoomDeleted => "Room is being deleted",
            Self::DuplicateName => "Duplicate name",
            Self::HandshakeFailed => "Invalid join request",
        }
    }
}

/// Failure to deliver to, or close, a single client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The peer is gone; nothing more can be written.
    #[error("connection closed")]
    Closed,

    /// Writing the frame failed.
    #[error("send failed: {0}")]
    Send(String),

    /// The outbound message could not be serialized.
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Outbound half of one client connection.
#[async_trait]
pub trait SessionTransport: Send + Sync + fmt::Debug {
    /// Sends one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the frame could not be written.
    async fn send_text(&self, text: String) -> Result<(), TransportError>;

    /// Sends a close frame with the code and text of `reason`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the close frame could not be written.
    async fn close(&self, reason: CloseReason) -> Result<(), TransportError>;

    /// Serializes `message` to JSON and sends it as one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Encode`] on serialization failure, or the
    /// error from [`SessionTransport::send_text`].
    async fn send_message(&self, message: &ServerMessage) -> Result<(), TransportError> {
        let text =
            serde_json::to_string(message).map_err(|e| TransportError::Encode(e.to_string()))?;
        self.send_text(text).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory transport that records every frame.

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};

    use async_trait::async_trait;

    use super::{CloseReason, SessionTransport, TransportError};
    use crate::domain::ServerMessage;

    /// Records sent frames and close calls; can be told to fail.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingTransport {
        sent: Mutex<Vec<String>>,
        closed: Mutex<Vec<CloseReason>>,
        fail_sends: AtomicBool,
        fail_close: AtomicBool,
    }

    impl RecordingTransport {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub(crate) fn failing() -> Arc<Self> {
            let transport = Self::default();
            transport.fail_sends.store(true, Ordering::SeqCst);
            transport.fail_close.store(true, Ordering::SeqCst);
            Arc::new(transport)
        }

        pub(crate) fn messages(&self) -> Vec<ServerMessage> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .filter_map(|text| serde_json::from_str(text).ok())
                .collect()
        }

        pub(crate) fn last_message(&self) -> Option<ServerMessage> {
            self.messages().pop()
        }

        pub(crate) fn clear(&self) {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }

        pub(crate) fn closes(&self) -> Vec<CloseReason> {
            self.closed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl SessionTransport for RecordingTransport {
        async fn send_text(&self, text: String) -> Result<(), TransportError> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(TransportError::Send("simulated failure".to_string()));
            }
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(text);
            Ok(())
        }

        async fn close(&self, reason: CloseReason) -> Result<(), TransportError> {
            self.closed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(reason);
            if self.fail_close.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            Ok(())
        }
    }
}
