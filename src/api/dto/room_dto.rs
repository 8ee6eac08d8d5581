//! Room DTOs for the list and detail endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{Room, RoomId, RoomSettings, RoomSummary, VoteLedger};

/// Paginated response for `GET /rooms`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomListResponse {
    /// Room summaries for the requested page.
    pub data: Vec<RoomSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Full room state for `GET /rooms/{id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoomDetailResponse {
    /// Room identifier.
    pub room_id: RoomId,
    /// Voter names in join order.
    pub voters: Vec<String>,
    /// Current vote ledger (`""` = unvoted).
    pub votes: VoteLedger,
    /// Reveal flag and active deck.
    pub settings: RoomSettings,
    /// Number of live sessions.
    pub connection_count: usize,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutating operation.
    pub last_activity: DateTime<Utc>,
    /// When the room becomes eligible for removal, absent if never.
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Room> for RoomDetailResponse {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.id().clone(),
            voters: room.voters().to_vec(),
            votes: room.votes().clone(),
            settings: room.settings().clone(),
            connection_count: room.connection_count(),
            created_at: room.created_at(),
            last_activity: room.last_activity(),
            expires_at: room.last_activity().checked_add_signed(room.ttl()),
        }
    }
}

/// One entry of the voting card catalog.
#[derive(Debug, Serialize, ToSchema)]
pub struct VotingCardInfo {
    /// Deck name as used in `votingCard`.
    pub name: String,
    /// Card values in display order.
    pub values: Vec<String>,
}

impl VotingCardInfo {
    /// Builds a catalog entry from static card labels.
    #[must_use]
    pub fn new(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            values: values.iter().map(ToString::to_string).collect(),
        }
    }
}
