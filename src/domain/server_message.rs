//! Frames the server pushes to clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{RoomId, RoomSettings};

/// Vote ledger as sent on the wire: voter name to value, `""` = unvoted.
pub type VoteLedger = BTreeMap<String, String>;

/// Outbound JSON frame, discriminated by `type`.
///
/// ```json
/// {"type":"result","roomID":"sprint-42","votes":{"alice":"5","bob":""}}
/// {"type":"settings","reveal":false,"votingCard":"Fibonacci"}
/// {"type":"error","error":"invalid format","details":"missing field `vote`"}
/// {"type":"success","success":"Joined room sprint-42 as alice"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Snapshot of the vote ledger.
    Result {
        /// Room the votes belong to.
        #[serde(rename = "roomID")]
        room_id: RoomId,
        /// Current votes.
        votes: VoteLedger,
    },
    /// Snapshot of the room settings.
    Settings(RoomSettings),
    /// Error reply to a single client.
    Error {
        /// Short error text.
        error: String,
        /// Optional detail, e.g. the parser message.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    /// Acknowledgement sent to a single client.
    Success {
        /// What succeeded.
        success: String,
    },
}
