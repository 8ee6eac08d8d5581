//! Room-wide settings shared by every participant.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::DEFAULT_VOTING_CARD;

/// Reveal flag and active deck of a room.
///
/// Serialized in the camelCase shape clients already speak:
/// `{"reveal": false, "votingCard": "Fibonacci"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    /// Whether vote values are shown to participants.
    pub reveal: bool,
    /// Name of the estimation deck in use.
    pub voting_card: String,
}

impl RoomSettings {
    /// Hidden votes with the given deck.
    #[must_use]
    pub fn with_voting_card(voting_card: impl Into<String>) -> Self {
        Self {
            reveal: false,
            voting_card: voting_card.into(),
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self::with_voting_card(DEFAULT_VOTING_CARD)
    }
}
