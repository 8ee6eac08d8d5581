//! The room aggregate: voters, their live sessions, the vote ledger,
//! room settings, and the idle clock.
//!
//! All mutation goes through [`Room`] methods. The caller is expected to
//! hold the room's write lock for the whole duration of a command so that
//! reading state, mutating it, and broadcasting the result cannot
//! interleave with another command on the same room.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::fanout::{DeliveryReport, close_each, fan_out};
use super::server_message::VoteLedger;
use super::{CloseReason, RoomId, RoomSettings, ServerMessage, SessionId, SessionTransport};
use crate::error::PokerError;

/// One estimation session.
///
/// # Invariants
///
/// - `voters` and `votes` always have the same key set.
/// - Every joined session maps to exactly one voter name, and voter names
///   are unique within the room.
/// - Outside of [`Room::disconnect_all`], `connections` and
///   `voter_by_session` hold the same sessions.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    votes: VoteLedger,
    voters: Vec<String>,
    connections: Vec<(SessionId, Arc<dyn SessionTransport>)>,
    voter_by_session: HashMap<SessionId, String>,
    settings: RoomSettings,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    ttl: TimeDelta,
    closed: bool,
}

impl Room {
    /// Creates an empty room with the given idle TTL and initial settings.
    #[must_use]
    pub fn new(id: RoomId, ttl: Duration, settings: RoomSettings) -> Self {
        let now = Utc::now();
        Self {
            id,
            votes: VoteLedger::new(),
            voters: Vec::new(),
            connections: Vec::new(),
            voter_by_session: HashMap::new(),
            settings,
            created_at: now,
            last_activity: now,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            closed: false,
        }
    }

    /// Room identifier.
    #[must_use]
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Current vote ledger.
    #[must_use]
    pub fn votes(&self) -> &VoteLedger {
        &self.votes
    }

    /// Voter names in join order.
    #[must_use]
    pub fn voters(&self) -> &[String] {
        &self.voters
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    /// When the room was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Timestamp of the last mutating operation.
    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Idle time after which the room expires.
    #[must_use]
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Number of live sessions.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// `true` once [`Room::disconnect_all`] has run; the room is about to
    /// be discarded and accepts no further joins.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ── Admission ───────────────────────────────────────────────────────

    /// Admits `session_id` as voter `name`.
    ///
    /// On success the session is registered, gets an empty vote, receives a
    /// join acknowledgement, and every session (including the new one) gets
    /// the votes and settings snapshots.
    ///
    /// A rejected join leaves the room untouched. On a duplicate name the
    /// requesting transport alone receives an error frame and is closed
    /// with [`CloseReason::DuplicateName`].
    ///
    /// # Errors
    ///
    /// - [`PokerError::DuplicateName`] if `name` is already a voter.
    /// - [`PokerError::AlreadyJoined`] if the session is already registered.
    /// - [`PokerError::RoomClosed`] if the room was deleted or swept.
    pub async fn join(
        &mut self,
        session_id: SessionId,
        transport: Arc<dyn SessionTransport>,
        name: &str,
    ) -> Result<(), PokerError> {
        if self.closed {
            return Err(PokerError::RoomClosed(self.id.to_string()));
        }
        if self.voter_by_session.contains_key(&session_id) {
            return Err(PokerError::AlreadyJoined);
        }
        if self.voters.iter().any(|voter| voter == name) {
            let err = PokerError::DuplicateName(name.to_string());
            tracing::info!(room_id = %self.id, %session_id, voter = name, "duplicate name rejected");
            if let Err(e) = transport.send_message(&err.to_server_message()).await {
                tracing::warn!(%session_id, error = %e, "failed to send rejection");
            }
            if let Err(e) = transport.close(CloseReason::DuplicateName).await {
                tracing::warn!(%session_id, error = %e, "failed to close rejected session");
            }
            return Err(err);
        }

        self.voter_by_session.insert(session_id, name.to_string());
        self.voters.push(name.to_string());
        self.votes.insert(name.to_string(), String::new());
        self.connections.push((session_id, Arc::clone(&transport)));
        self.reset_activity();
        tracing::info!(room_id = %self.id, %session_id, voter = name, "voter joined");

        let ack = ServerMessage::Success {
            success: format!("Joined room {} as {name}", self.id),
        };
        if let Err(e) = transport.send_message(&ack).await {
            tracing::warn!(%session_id, error = %e, "failed to acknowledge join");
        }
        self.broadcast_votes().await;
        self.broadcast_settings().await;
        Ok(())
    }

    /// Removes the voter bound to `session_id`, closes its transport, and
    /// broadcasts the updated votes to the remaining sessions.
    ///
    /// Returns the removed voter name, or `None` if the session was not
    /// joined (in which case nothing happens).
    pub async fn leave(&mut self, session_id: SessionId) -> Option<String> {
        let Some(name) = self.voter_by_session.remove(&session_id) else {
            tracing::debug!(room_id = %self.id, %session_id, "leave for unknown session ignored");
            return None;
        };
        self.voters.retain(|voter| voter != &name);
        self.votes.remove(&name);

        let transport = self
            .connections
            .iter()
            .position(|(id, _)| *id == session_id)
            .map(|index| self.connections.remove(index).1);
        if let Some(transport) = transport
            && let Err(e) = transport.close(CloseReason::UserLeft).await
        {
            tracing::warn!(room_id = %self.id, %session_id, error = %e, "failed to close session");
        }
        tracing::info!(room_id = %self.id, %session_id, voter = %name, "voter left");

        self.broadcast_votes().await;
        Some(name)
    }

    // ── Vote ledger ─────────────────────────────────────────────────────

    /// Records `value` for `voter`, overwriting any earlier vote.
    ///
    /// Neither the value nor the voter is validated: a vote for a name that
    /// is not (or no longer) in the room creates a ledger entry that stays
    /// until the next [`Room::clear_votes`]. Does not broadcast.
    pub fn cast_vote(&mut self, voter: &str, value: &str) {
        self.votes.insert(voter.to_string(), value.to_string());
        self.reset_activity();
        tracing::debug!(room_id = %self.id, voter, "vote cast");
    }

    /// Resets every vote to `""`, keeping the key set. Does not broadcast.
    pub fn clear_votes(&mut self) {
        for value in self.votes.values_mut() {
            value.clear();
        }
        self.reset_activity();
        tracing::debug!(room_id = %self.id, "votes cleared");
    }

    // ── Settings ────────────────────────────────────────────────────────

    /// Flips the reveal flag and broadcasts the new settings.
    pub async fn toggle_reveal(&mut self) -> DeliveryReport {
        self.settings.reveal = !self.settings.reveal;
        self.reset_activity();
        tracing::debug!(room_id = %self.id, reveal = self.settings.reveal, "reveal toggled");
        self.broadcast_settings().await
    }

    /// Switches the deck, keeping the reveal flag, and broadcasts.
    pub async fn set_voting_card(&mut self, voting_card: &str) -> DeliveryReport {
        self.settings.voting_card = voting_card.to_string();
        self.reset_activity();
        tracing::debug!(room_id = %self.id, voting_card, "voting card changed");
        self.broadcast_settings().await
    }

    /// Replaces the settings wholesale and broadcasts.
    pub async fn set_settings(&mut self, settings: RoomSettings) -> DeliveryReport {
        self.settings = settings;
        self.reset_activity();
        tracing::debug!(room_id = %self.id, "settings replaced");
        self.broadcast_settings().await
    }

    // ── Teardown ────────────────────────────────────────────────────────

    /// Closes every session with [`CloseReason::RoomDeleted`] and empties
    /// the connection set. Voters and votes are left as they are; the room
    /// is marked closed and is expected to be dropped by its registry.
    pub async fn disconnect_all(&mut self) -> DeliveryReport {
        let report = close_each(&self.connections, CloseReason::RoomDeleted).await;
        self.connections.clear();
        self.closed = true;
        tracing::info!(
            room_id = %self.id,
            closed = report.delivered,
            failed = report.failed,
            "room disconnected"
        );
        report
    }

    // ── Broadcast ───────────────────────────────────────────────────────

    /// The `{type:"result"}` frame for the current ledger.
    #[must_use]
    pub fn votes_snapshot(&self) -> ServerMessage {
        ServerMessage::Result {
            room_id: self.id.clone(),
            votes: self.votes.clone(),
        }
    }

    /// The `{type:"settings"}` frame for the current settings.
    #[must_use]
    pub fn settings_snapshot(&self) -> ServerMessage {
        ServerMessage::Settings(self.settings.clone())
    }

    /// Sends the votes snapshot to every session.
    pub async fn broadcast_votes(&self) -> DeliveryReport {
        self.broadcast(&self.votes_snapshot()).await
    }

    /// Sends the settings snapshot to every session.
    pub async fn broadcast_settings(&self) -> DeliveryReport {
        self.broadcast(&self.settings_snapshot()).await
    }

    async fn broadcast(&self, message: &ServerMessage) -> DeliveryReport {
        let report = fan_out(&self.connections, message).await;
        if !report.is_complete() {
            tracing::warn!(
                room_id = %self.id,
                delivered = report.delivered,
                failed = report.failed,
                "broadcast partially failed"
            );
        }
        report
    }

    // ── Expiry ──────────────────────────────────────────────────────────

    /// `true` if `now` is strictly past `last_activity + ttl`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.last_activity
            .checked_add_signed(self.ttl)
            .is_some_and(|deadline| now > deadline)
    }

    /// Marks the room as active now.
    pub fn reset_activity(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Lightweight summary for listings.
    #[must_use]
    pub fn summary(&self, now: DateTime<Utc>) -> RoomSummary {
        RoomSummary {
            room_id: self.id.clone(),
            voter_count: self.voters.len(),
            connection_count: self.connections.len(),
            reveal: self.settings.reveal,
            voting_card: self.settings.voting_card.clone(),
            created_at: self.created_at,
            last_activity: self.last_activity,
            expired: self.is_expired(now),
        }
    }
}

/// Lightweight summary of a room for list endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomSummary {
    /// Room identifier.
    pub room_id: RoomId,
    /// Number of joined voters.
    pub voter_count: usize,
    /// Number of live sessions.
    pub connection_count: usize,
    /// Whether votes are revealed.
    pub reveal: bool,
    /// Active deck.
    pub voting_card: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutating operation.
    pub last_activity: DateTime<Utc>,
    /// Whether the next sweep would remove this room.
    pub expired: bool,
}
