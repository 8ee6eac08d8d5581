//! Inbound WebSocket message shapes.
//!
//! Clients send flat JSON objects whose kind is given by which key is
//! present. [`InboundMessage::from_value`] checks the keys in a fixed
//! priority order and turns the object into an explicit tagged union;
//! anything outside the enumerated shapes is rejected.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::RoomSettings;
use crate::error::PokerError;

/// First frame on a new connection: `{"name": "alice"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinRequest {
    /// Voter name to join as. Must be non-blank.
    pub name: String,
}

impl JoinRequest {
    /// Parses and validates a join request.
    ///
    /// # Errors
    ///
    /// Returns [`PokerError::InvalidFormat`] if the text is not a JSON object
    /// with a string `name`, or if the name is blank.
    pub fn parse(text: &str) -> Result<Self, PokerError> {
        let request: Self = serde_json::from_str(text)
            .map_err(|e| PokerError::InvalidFormat(format!("join request: {e}")))?;
        if request.name.trim().is_empty() {
            return Err(PokerError::InvalidFormat(
                "join request: name must not be empty".to_string(),
            ));
        }
        Ok(request)
    }
}

/// Room-level commands carried under the `command` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomCommand {
    /// Reset every vote to `""`.
    ClearVotes,
    /// Delete the room and disconnect everyone.
    DeleteRoom,
    /// Toggle the reveal flag.
    RevealVotes,
    /// Leave the room.
    ExitRoom,
}

impl FromStr for RoomCommand {
    type Err = PokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ClearVotes" | "Clear_votes" => Ok(Self::ClearVotes),
            "DeleteRoom" | "Delete_room" => Ok(Self::DeleteRoom),
            "RevealVotes" | "Reveal_votes" => Ok(Self::RevealVotes),
            "ExitRoom" | "Exit_room" => Ok(Self::ExitRoom),
            other => Err(PokerError::UnknownCommand(other.to_string())),
        }
    }
}

/// A recognised inbound message from an already-joined session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// `{"command": "..."}`
    Command(RoomCommand),
    /// `{"cardChange": "T-Shirt"}`
    CardChange(String),
    /// `{"voter": "alice", "vote": "5"}`
    Vote {
        /// Voter name the vote is recorded under.
        voter: String,
        /// Vote value; not checked against the active deck.
        vote: String,
    },
    /// `{"settings": {"reveal": true, "votingCard": "Fibonacci"}}`
    Settings(RoomSettings),
}

impl InboundMessage {
    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`PokerError::InvalidFormat`] for malformed JSON or an
    /// unrecognised shape, and [`PokerError::UnknownCommand`] for an
    /// unsupported `command` value.
    pub fn parse(text: &str) -> Result<Self, PokerError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| PokerError::InvalidFormat(format!("malformed JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Classifies a JSON value. Keys are checked in order: `command`,
    /// `cardChange`, `voter` + `vote`, `settings`.
    ///
    /// # Errors
    ///
    /// See [`InboundMessage::parse`].
    pub fn from_value(value: &Value) -> Result<Self, PokerError> {
        let Some(object) = value.as_object() else {
            return Err(PokerError::InvalidFormat(
                "expected a JSON object".to_string(),
            ));
        };

        if let Some(command) = object.get("command") {
            let command = command.as_str().ok_or_else(|| {
                PokerError::InvalidFormat("`command` must be a string".to_string())
            })?;
            return command.parse().map(Self::Command);
        }

        if let Some(card) = object.get("cardChange") {
            let card = card.as_str().ok_or_else(|| {
                PokerError::InvalidFormat("`cardChange` must be a string".to_string())
            })?;
            return Ok(Self::CardChange(card.to_string()));
        }

        if let (Some(voter), Some(vote)) = (object.get("voter"), object.get("vote")) {
            let (Some(voter), Some(vote)) = (voter.as_str(), vote.as_str()) else {
                return Err(PokerError::InvalidFormat(
                    "`voter` and `vote` must be strings".to_string(),
                ));
            };
            return Ok(Self::Vote {
                voter: voter.to_string(),
                vote: vote.to_string(),
            });
        }

        if let Some(settings) = object.get("settings") {
            let settings = RoomSettings::deserialize(settings)
                .map_err(|e| PokerError::InvalidFormat(format!("settings: {e}")))?;
            return Ok(Self::Settings(settings));
        }

        Err(PokerError::InvalidFormat(
            "expected one of `command`, `cardChange`, `voter` + `vote`, `settings`".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<InboundMessage, PokerError> {
        InboundMessage::parse(text)
    }

    #[test]
    fn commands_accept_both_spellings() {
        for (text, expected) in [
            (r#"{"command":"ClearVotes"}"#, RoomCommand::ClearVotes),
            (r#"{"command":"Clear_votes"}"#, RoomCommand::ClearVotes),
            (r#"{"command":"DeleteRoom"}"#, RoomCommand::DeleteRoom),
            (r#"{"command":"Delete_room"}"#, RoomCommand::DeleteRoom),
            (r#"{"command":"RevealVotes"}"#, RoomCommand::RevealVotes),
            (r#"{"command":"ExitRoom"}"#, RoomCommand::ExitRoom),
            (r#"{"command":"Exit_room"}"#, RoomCommand::ExitRoom),
        ] {
            assert_eq!(parse(text).ok(), Some(InboundMessage::Command(expected)), "{text}");
        }
    }

    #[test]
    fn unknown_command_is_its_own_error() {
        let Err(PokerError::UnknownCommand(cmd)) = parse(r#"{"command":"Shuffle"}"#) else {
            panic!("expected UnknownCommand");
        };
        assert_eq!(cmd, "Shuffle");
    }

    #[test]
    fn command_key_wins_over_everything_else() {
        let msg = parse(r#"{"command":"ClearVotes","voter":"a","vote":"1","cardChange":"X"}"#);
        assert_eq!(msg.ok(), Some(InboundMessage::Command(RoomCommand::ClearVotes)));
    }

    #[test]
    fn card_change_wins_over_vote() {
        let msg = parse(r#"{"cardChange":"T-Shirt","voter":"a","vote":"1"}"#);
        assert_eq!(msg.ok(), Some(InboundMessage::CardChange("T-Shirt".to_string())));
    }

    #[test]
    fn vote_needs_both_keys() {
        assert_eq!(
            parse(r#"{"voter":"alice","vote":"8"}"#).ok(),
            Some(InboundMessage::Vote {
                voter: "alice".to_string(),
                vote: "8".to_string()
            })
        );
        assert!(matches!(
            parse(r#"{"voter":"alice"}"#),
            Err(PokerError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse(r#"{"voter":"alice","vote":8}"#),
            Err(PokerError::InvalidFormat(_))
        ));
    }

    #[test]
    fn settings_object_is_parsed() {
        let msg = parse(r#"{"settings":{"reveal":true,"votingCard":"Powers of 2"}}"#);
        assert_eq!(
            msg.ok(),
            Some(InboundMessage::Settings(RoomSettings {
                reveal: true,
                voting_card: "Powers of 2".to_string()
            }))
        );
        assert!(matches!(
            parse(r#"{"settings":{"reveal":"yes"}}"#),
            Err(PokerError::InvalidFormat(_))
        ));
    }

    #[test]
    fn unrecognised_shapes_are_invalid_format() {
        for text in [r#"{}"#, r#"{"hello":"world"}"#, r#"[1,2]"#, "not json", r#""str""#] {
            assert!(matches!(parse(text), Err(PokerError::InvalidFormat(_))), "{text}");
        }
        assert!(matches!(
            parse(r#"{"command":5}"#),
            Err(PokerError::InvalidFormat(_))
        ));
    }

    #[test]
    fn join_request_requires_non_blank_name() {
        assert_eq!(
            JoinRequest::parse(r#"{"name":"alice"}"#).ok(),
            Some(JoinRequest {
                name: "alice".to_string()
            })
        );
        assert!(JoinRequest::parse(r#"{"name":"  "}"#).is_err());
        assert!(JoinRequest::parse(r#"{"voter":"alice"}"#).is_err());
        assert!(JoinRequest::parse("garbage").is_err());
    }
}
