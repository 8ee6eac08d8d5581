//! Maps inbound messages from a joined session onto room operations.
//!
//! Every branch that changes room state re-broadcasts to the whole room.
//! Errors are turned into a reply to the sender only; none of them end
//! the connection except a `DeleteRoom` against a room that is already
//! gone.

use std::sync::Arc;

use super::messages::{InboundMessage, RoomCommand};
use crate::domain::{Room, RoomHandle, RoomRegistry, SessionId, SessionTransport};
use crate::error::PokerError;

/// What the connection loop should do after a message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading from the client.
    Continue,
    /// Stop reading; the session has left or the room is gone.
    Close,
}

/// Dispatches messages for sessions of any room in the registry.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    registry: Arc<RoomRegistry>,
}

impl CommandDispatcher {
    /// Creates a dispatcher bound to `registry`.
    #[must_use]
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Parses `text` and applies it to the room behind `handle`.
    ///
    /// The room's write lock is held from the first read until the last
    /// broadcast of the command. Any error is replied to `transport`.
    pub async fn handle_text(
        &self,
        handle: &RoomHandle,
        session_id: SessionId,
        transport: &dyn SessionTransport,
        text: &str,
    ) -> Flow {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(err) => {
                reply_error(session_id, transport, &err).await;
                return Flow::Continue;
            }
        };

        let mut room = handle.write().await;
        match self.apply(handle, &mut room, session_id, message).await {
            Ok(flow) => flow,
            Err(err) => {
                reply_error(session_id, transport, &err).await;
                match err {
                    PokerError::RoomNotFound(_) => Flow::Close,
                    _ => Flow::Continue,
                }
            }
        }
    }

    /// Applies an already-parsed message to `room`, which must be the
    /// locked contents of `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`PokerError::RoomNotFound`] if the room was deleted or swept
    /// before the message was handled.
    pub async fn apply(
        &self,
        handle: &RoomHandle,
        room: &mut Room,
        session_id: SessionId,
        message: InboundMessage,
    ) -> Result<Flow, PokerError> {
        if room.is_closed() {
            return Err(PokerError::RoomNotFound(room.id().to_string()));
        }

        match message {
            InboundMessage::Command(RoomCommand::ClearVotes) => {
                room.clear_votes();
                room.broadcast_votes().await;
                Ok(Flow::Continue)
            }
            InboundMessage::Command(RoomCommand::DeleteRoom) => {
                let room_id = room.id().clone();
                if !self.registry.remove_if_same(&room_id, handle).await {
                    return Err(PokerError::RoomNotFound(room_id.to_string()));
                }
                tracing::info!(%room_id, %session_id, "room deleted by participant");
                room.disconnect_all().await;
                Ok(Flow::Close)
            }
            InboundMessage::Command(RoomCommand::RevealVotes) => {
                room.toggle_reveal().await;
                Ok(Flow::Continue)
            }
            InboundMessage::Command(RoomCommand::ExitRoom) => {
                room.leave(session_id).await;
                Ok(Flow::Close)
            }
            InboundMessage::CardChange(voting_card) => {
                room.set_voting_card(&voting_card).await;
                Ok(Flow::Continue)
            }
            InboundMessage::Vote { voter, vote } => {
                room.cast_vote(&voter, &vote);
                room.broadcast_votes().await;
                Ok(Flow::Continue)
            }
            InboundMessage::Settings(settings) => {
                room.set_settings(settings).await;
                Ok(Flow::Continue)
            }
        }
    }
}

/// Sends `err` as an error frame to one session, logging delivery failure.
pub async fn reply_error(session_id: SessionId, transport: &dyn SessionTransport, err: &PokerError) {
    tracing::debug!(%session_id, error = %err, "rejecting client message");
    if let Err(e) = transport.send_message(&err.to_server_message()).await {
        tracing::warn!(%session_id, error = %e, "failed to send error reply");
    }
}
