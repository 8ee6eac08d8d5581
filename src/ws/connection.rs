//! WebSocket connection state machine.
//!
//! Handles the lifecycle of a single WebSocket connection: the join
//! handshake, the read loop that feeds the [`CommandDispatcher`], and the
//! final leave that runs however the loop ends.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::dispatcher::{CommandDispatcher, Flow, reply_error};
use super::messages::JoinRequest;
use crate::domain::{
    CloseReason, RoomHandle, RoomId, RoomRegistry, SessionId, SessionTransport, TransportError,
};
use crate::error::PokerError;

/// Join attempts per connection when the resolved room closes underneath.
const JOIN_ATTEMPTS: usize = 2;

/// Longest a single frame may take to reach the socket. A peer that stops
/// reading would otherwise hold its room's lock for good.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// [`SessionTransport`] over the write half of an axum WebSocket.
pub struct WsTransport {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WsTransport {
    /// Wraps the write half of a split socket.
    #[must_use]
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

impl fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionTransport for WsTransport {
    async fn send_text(&self, text: String) -> Result<(), TransportError> {
        let send = async { self.sink.lock().await.send(Message::text(text)).await };
        match timeout(SEND_TIMEOUT, send).await {
            Ok(result) => result.map_err(|e| TransportError::Send(e.to_string())),
            Err(_) => Err(TransportError::Send("timed out".to_string())),
        }
    }

    async fn close(&self, reason: CloseReason) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: reason.code(),
            reason: reason.text().into(),
        };
        let send = async {
            self.sink
                .lock()
                .await
                .send(Message::Close(Some(frame)))
                .await
        };
        match timeout(SEND_TIMEOUT, send).await {
            Ok(result) => result.map_err(|_| TransportError::Closed),
            Err(_) => Err(TransportError::Send("close timed out".to_string())),
        }
    }
}

/// Runs one client connection against room `room_id` until it ends.
pub async fn run_connection(socket: WebSocket, room_id: RoomId, registry: Arc<RoomRegistry>) {
    let (ws_tx, mut ws_rx) = socket.split();
    let session_id = SessionId::new();
    let transport: Arc<dyn SessionTransport> = Arc::new(WsTransport::new(ws_tx));
    tracing::debug!(%room_id, %session_id, "ws connection opened");

    let Some(request) = read_join_request(&mut ws_rx, session_id, transport.as_ref()).await else {
        tracing::debug!(%room_id, %session_id, "ws handshake failed");
        return;
    };

    let Some(handle) = admit(&registry, &room_id, session_id, &transport, &request.name).await
    else {
        return;
    };

    let membership = Membership::new(Arc::clone(&handle), session_id);
    let dispatcher = CommandDispatcher::new(registry);
    loop {
        match ws_rx.next().await {
            Some(Ok(Message::Text(text))) => {
                let flow = dispatcher
                    .handle_text(&handle, session_id, transport.as_ref(), &text)
                    .await;
                if flow == Flow::Close {
                    break;
                }
            }
            Some(Ok(Message::Binary(_))) => {
                let err = PokerError::InvalidFormat("expected a text frame".to_string());
                reply_error(session_id, transport.as_ref(), &err).await;
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::warn!(%room_id, %session_id, error = %e, "ws receive failed");
                break;
            }
        }
    }

    membership.leave().await;
    tracing::debug!(%room_id, %session_id, "ws connection closed");
}

/// Reads the first client frame and parses it as a [`JoinRequest`].
///
/// On an invalid request the client gets an error frame and the session is
/// closed. Returns `None` if the handshake did not produce a request.
async fn read_join_request(
    ws_rx: &mut SplitStream<WebSocket>,
    session_id: SessionId,
    transport: &dyn SessionTransport,
) -> Option<JoinRequest> {
    let result = loop {
        match ws_rx.next().await {
            Some(Ok(Message::Text(text))) => break JoinRequest::parse(&text),
            Some(Ok(Message::Binary(_))) => {
                break Err(PokerError::InvalidFormat(
                    "join request must be a text frame".to_string(),
                ));
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Ok(Message::Close(_))) | None => return None,
            Some(Err(e)) => {
                tracing::debug!(%session_id, error = %e, "ws receive failed during handshake");
                return None;
            }
        }
    };

    match result {
        Ok(request) => Some(request),
        Err(err) => {
            tracing::debug!(%session_id, error = %err, "rejecting join request");
            if let Err(e) = reject(transport, &err, CloseReason::HandshakeFailed).await {
                tracing::debug!(%session_id, error = %e, "failed to reject bad handshake");
            }
            None
        }
    }
}

/// Sends `err` to the client, then closes the session with `reason`.
///
/// The close is attempted even if the error frame could not be sent.
async fn reject(
    transport: &dyn SessionTransport,
    err: &PokerError,
    reason: CloseReason,
) -> Result<(), PokerError> {
    let sent = transport.send_message(&err.to_server_message()).await;
    transport.close(reason).await?;
    sent?;
    Ok(())
}

/// Resolves the room (creating it if needed) and joins it.
///
/// A room that was deleted or swept between lookup and join is closed;
/// the lookup is retried so the client lands in a fresh room instead.
async fn admit(
    registry: &RoomRegistry,
    room_id: &RoomId,
    session_id: SessionId,
    transport: &Arc<dyn SessionTransport>,
    name: &str,
) -> Option<RoomHandle> {
    for _ in 0..JOIN_ATTEMPTS {
        let handle = registry.get_or_create(room_id).await;
        let joined = handle
            .write()
            .await
            .join(session_id, Arc::clone(transport), name)
            .await;
        match joined {
            Ok(()) => return Some(handle),
            Err(PokerError::RoomClosed(_)) => continue,
            // The room already replied and closed a duplicate-name session.
            Err(PokerError::DuplicateName(_)) => return None,
            Err(err) => {
                reply_error(session_id, transport.as_ref(), &err).await;
                return None;
            }
        }
    }

    let err = PokerError::RoomClosed(room_id.to_string());
    tracing::info!(%room_id, %session_id, "room kept closing during join");
    if let Err(e) = reject(transport.as_ref(), &err, CloseReason::RoomDeleted).await {
        tracing::debug!(%session_id, error = %e, "failed to reject session");
    }
    None
}

/// A joined session's seat in its room.
///
/// [`Membership::leave`] is the normal exit. If the connection task instead
/// panics or is cancelled, dropping the membership spawns the same leave so
/// the voter never stays registered.
#[derive(Debug)]
struct Membership {
    handle: Option<RoomHandle>,
    session_id: SessionId,
}

impl Membership {
    fn new(handle: RoomHandle, session_id: SessionId) -> Self {
        Self {
            handle: Some(handle),
            session_id,
        }
    }

    async fn leave(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.write().await.leave(self.session_id).await;
        }
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let session_id = self.session_id;
        tracing::warn!(%session_id, "connection ended abnormally, leaving room");
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    handle.write().await.leave(session_id).await;
                });
            }
            Err(e) => tracing::error!(%session_id, error = %e, "no runtime to leave room on"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ServerMessage;
    use crate::domain::transport::testing::RecordingTransport;

    fn setup() -> (Arc<RoomRegistry>, RoomId, Arc<RecordingTransport>) {
        let registry = Arc::new(RoomRegistry::new(Duration::from_secs(3600), "Fibonacci"));
        (registry, RoomId::from("r1"), RecordingTransport::new())
    }

    fn as_dyn(transport: &Arc<RecordingTransport>) -> Arc<dyn SessionTransport> {
        Arc::clone(transport) as Arc<dyn SessionTransport>
    }

    #[tokio::test]
    async fn admit_after_delete_lands_in_fresh_room() {
        let (registry, room_id, transport) = setup();
        let old = registry.get_or_create(&room_id).await;
        assert!(registry.delete(&room_id).await.is_ok());

        let session = SessionId::new();
        let Some(handle) = admit(&registry, &room_id, session, &as_dyn(&transport), "alice").await
        else {
            panic!("admission failed");
        };

        assert!(!Arc::ptr_eq(&handle, &old));
        assert_eq!(handle.read().await.voters(), ["alice"]);
        assert!(old.read().await.voters().is_empty());
    }

    #[tokio::test]
    async fn join_racing_a_delete_retries_into_fresh_room() {
        let (registry, room_id, transport) = setup();
        let old = registry.get_or_create(&room_id).await;
        let mut guard = old.write().await;

        let task = tokio::spawn({
            let registry = Arc::clone(&registry);
            let room_id = room_id.clone();
            let transport = as_dyn(&transport);
            async move { admit(&registry, &room_id, SessionId::new(), &transport, "alice").await }
        });
        // Let the task resolve the old handle and block on its lock.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(registry.remove_if_same(&room_id, &old).await);
        guard.disconnect_all().await;
        drop(guard);

        let Ok(Some(handle)) = task.await else {
            panic!("admission failed");
        };
        assert!(!Arc::ptr_eq(&handle, &old));
        assert!(old.read().await.voters().is_empty());
        assert_eq!(handle.read().await.voters(), ["alice"]);
        let Ok(current) = registry.get(&room_id).await else {
            panic!("fresh room not registered");
        };
        assert!(Arc::ptr_eq(&handle, &current));
    }

    #[tokio::test]
    async fn admit_gives_up_on_a_room_that_stays_closed() {
        let (registry, room_id, transport) = setup();
        let handle = registry.get_or_create(&room_id).await;
        handle.write().await.disconnect_all().await;

        let admitted = admit(&registry, &room_id, SessionId::new(), &as_dyn(&transport), "alice").await;

        assert!(admitted.is_none());
        assert_eq!(
            transport.last_message(),
            Some(ServerMessage::Error {
                error: "Room is closed".to_string(),
                details: None
            })
        );
        assert_eq!(transport.closes(), vec![CloseReason::RoomDeleted]);
    }

    #[tokio::test]
    async fn reject_closes_even_when_send_fails() {
        let transport = RecordingTransport::failing();
        let err = PokerError::InvalidFormat("bad".to_string());

        let result = reject(transport.as_ref(), &err, CloseReason::HandshakeFailed).await;

        assert!(matches!(result, Err(PokerError::Transport(_))));
        assert_eq!(transport.closes(), vec![CloseReason::HandshakeFailed]);
    }

    #[tokio::test]
    async fn dropped_membership_still_leaves_room() {
        let (registry, room_id, transport) = setup();
        let session = SessionId::new();
        let Some(handle) = admit(&registry, &room_id, session, &as_dyn(&transport), "alice").await
        else {
            panic!("admission failed");
        };

        drop(Membership::new(Arc::clone(&handle), session));
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(handle.read().await.voters().is_empty());
        assert_eq!(transport.closes(), vec![CloseReason::UserLeft]);
    }

    #[tokio::test]
    async fn membership_leave_runs_once() {
        let (registry, room_id, transport) = setup();
        let session = SessionId::new();
        let Some(handle) = admit(&registry, &room_id, session, &as_dyn(&transport), "alice").await
        else {
            panic!("admission failed");
        };

        Membership::new(Arc::clone(&handle), session).leave().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(handle.read().await.voters().is_empty());
        assert_eq!(transport.closes(), vec![CloseReason::UserLeft]);
    }
}
