//! Concurrent room storage with per-room locking.
//!
//! [`RoomRegistry`] maps room ids to rooms. Each room sits behind its own
//! [`tokio::sync::RwLock`], so commands on one room are serialized while
//! unrelated rooms proceed independently. The outer map lock is only ever
//! held for a lookup, an insert or a removal, never across a room lock
//! acquisition or a network send.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::fanout::DeliveryReport;
use super::room::{Room, RoomSummary};
use super::{RoomId, RoomSettings};
use crate::config::ServerConfig;
use crate::error::PokerError;

/// Shared handle to one room.
pub type RoomHandle = Arc<RwLock<Room>>;

/// Central store for all live rooms.
///
/// # Concurrency
///
/// - Lookups of different rooms never contend beyond the map read lock.
/// - Commands on the same room are serialized by that room's write lock.
/// - The expiry sweep locks one room at a time.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
    room_ttl: Duration,
    default_voting_card: String,
}

impl RoomRegistry {
    /// Creates an empty registry whose rooms use `room_ttl` and start with
    /// `default_voting_card`.
    #[must_use]
    pub fn new(room_ttl: Duration, default_voting_card: impl Into<String>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            room_ttl,
            default_voting_card: default_voting_card.into(),
        }
    }

    /// Creates a registry from the server configuration.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.room_ttl, config.default_voting_card.clone())
    }

    /// TTL applied to newly created rooms.
    #[must_use]
    pub fn room_ttl(&self) -> Duration {
        self.room_ttl
    }

    /// Returns the room for `room_id`, creating it on first use.
    pub async fn get_or_create(&self, room_id: &RoomId) -> RoomHandle {
        if let Some(handle) = self.rooms.read().await.get(room_id) {
            return Arc::clone(handle);
        }

        let mut map = self.rooms.write().await;
        let handle = map.entry(room_id.clone()).or_insert_with(|| {
            tracing::info!(%room_id, "room created");
            Arc::new(RwLock::new(Room::new(
                room_id.clone(),
                self.room_ttl,
                RoomSettings::with_voting_card(self.default_voting_card.as_str()),
            )))
        });
        Arc::clone(handle)
    }

    /// Returns the room for `room_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PokerError::RoomNotFound`] if no such room exists.
    pub async fn get(&self, room_id: &RoomId) -> Result<RoomHandle, PokerError> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .map(Arc::clone)
            .ok_or_else(|| PokerError::RoomNotFound(room_id.to_string()))
    }

    /// Removes `room_id` from the map if it still maps to `handle`.
    ///
    /// Returns `false` if the room is gone or was replaced by a newer room
    /// with the same id. Does not lock the room itself, so it is safe to
    /// call while holding that room's lock.
    pub async fn remove_if_same(&self, room_id: &RoomId, handle: &RoomHandle) -> bool {
        let mut map = self.rooms.write().await;
        match map.get(room_id) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                map.remove(room_id);
                true
            }
            _ => false,
        }
    }

    /// Removes `room_id` from the map immediately, regardless of its TTL,
    /// then closes every session in it.
    ///
    /// Must not be called while holding the room's lock.
    ///
    /// # Errors
    ///
    /// Returns [`PokerError::RoomNotFound`] if no such room exists.
    pub async fn delete(&self, room_id: &RoomId) -> Result<DeliveryReport, PokerError> {
        let handle = self
            .rooms
            .write()
            .await
            .remove(room_id)
            .ok_or_else(|| PokerError::RoomNotFound(room_id.to_string()))?;
        let report = handle.write().await.disconnect_all().await;
        tracing::info!(%room_id, "room deleted");
        Ok(report)
    }

    /// Sweeps expired rooms as of now. See [`RoomRegistry::sweep_expired_at`].
    pub async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now()).await
    }

    /// Disconnects and removes every room that is expired at `now`.
    ///
    /// Takes a snapshot of the room handles, then checks each room under
    /// its own lock. A room whose lock is held is mid-command and therefore
    /// not idle; it is skipped until the next pass. Returns the number of
    /// rooms removed.
    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let snapshot: Vec<(RoomId, RoomHandle)> = self
            .rooms
            .read()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect();

        let mut removed = 0;
        for (room_id, handle) in snapshot {
            let Ok(mut room) = handle.try_write() else {
                tracing::debug!(%room_id, "room busy, skipped by expiry sweep");
                continue;
            };
            if room.is_closed() || !room.is_expired(now) {
                continue;
            }
            room.disconnect_all().await;
            if self.remove_if_same(&room_id, &handle).await {
                removed += 1;
                tracing::info!(%room_id, "room deleted due to inactivity");
            }
        }
        removed
    }

    /// Returns summaries of all rooms, ordered by room id.
    pub async fn list(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().map(Arc::clone).collect();
        let now = Utc::now();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.read().await.summary(now));
        }
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summaries
    }

    /// Returns `true` if a room with this id is registered.
    pub async fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.read().await.contains_key(room_id)
    }

    /// Returns the number of rooms in the registry.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Returns `true` if the registry contains no rooms.
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}
