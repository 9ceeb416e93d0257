//! Change events published by the store.
//!
//! One closed enum covers every table, exhaustively matchable by
//! subscribers. Events are a latency optimization only — every
//! correctness-bearing wait in the engine polls the store instead, so a
//! dropped or lagged event can never desynchronize the clients.

use serde::{Deserialize, Serialize};

use crate::types::{
    Answer, AnswerId, EndGameRequest, Player, PlayerId, Room, RoomId, Round,
    RoundId, WordValidationVote,
};

/// A change notification scoped to one room.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, e.g.
/// `{ "type": "PlayerJoined", "player": { ... } }`, so a thin client can
/// dispatch on the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    /// A player row was inserted.
    PlayerJoined { player: Player },
    /// A player row was deleted.
    PlayerLeft { room_id: RoomId, player_id: PlayerId },
    /// The room flipped from Waiting to Playing.
    GameStarted { room: Room },
    /// A player submitted the current round (their `finished_at` was set).
    PlayerFinished { player: Player },
    /// A player flagged themselves ready for the next round.
    PlayerReady { room_id: RoomId, player_id: PlayerId },
    /// A new round row was inserted.
    RoundCreated { round: Round },
    /// A round flipped to Finished.
    RoundFinished { room_id: RoomId, round_id: RoundId },
    /// An answer row was inserted.
    AnswerSubmitted { answer: Answer },
    /// An answer was rewritten by a completed word-validation vote.
    AnswerRevalidated { answer: Answer },
    /// An end-game request was created.
    EndGameRequested { request: EndGameRequest },
    /// An end-game request was accepted or rejected.
    EndGameResponded { request: EndGameRequest },
    /// Vote rows were opened for a contested answer.
    VoteOpened { room_id: RoomId, answer_id: AnswerId },
    /// A player cast their ballot.
    VoteCast { vote: WordValidationVote },
    /// The room (and everything in it) was deleted.
    RoomDeleted { room_id: RoomId },
}

impl RoomEvent {
    /// The room this event belongs to.
    pub fn room_id(&self) -> RoomId {
        match self {
            Self::PlayerJoined { player } => player.room_id,
            Self::PlayerLeft { room_id, .. } => *room_id,
            Self::GameStarted { room } => room.id,
            Self::PlayerFinished { player } => player.room_id,
            Self::PlayerReady { room_id, .. } => *room_id,
            Self::RoundCreated { round } => round.room_id,
            Self::RoundFinished { room_id, .. } => *room_id,
            Self::AnswerSubmitted { answer } => answer.room_id,
            Self::AnswerRevalidated { answer } => answer.room_id,
            Self::EndGameRequested { request } => request.room_id,
            Self::EndGameResponded { request } => request.room_id,
            Self::VoteOpened { room_id, .. } => *room_id,
            Self::VoteCast { vote } => vote.room_id,
            Self::RoomDeleted { room_id } => *room_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VoteId;

    #[test]
    fn test_event_json_is_internally_tagged() {
        let event = RoomEvent::PlayerLeft {
            room_id: RoomId(3),
            player_id: PlayerId(7),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "PlayerLeft");
        assert_eq!(json["room_id"], 3);
        assert_eq!(json["player_id"], 7);
    }

    #[test]
    fn test_event_round_trip() {
        let event = RoomEvent::VoteOpened {
            room_id: RoomId(1),
            answer_id: AnswerId(12),
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: RoomEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_event_room_id_accessor() {
        let event = RoomEvent::RoomDeleted { room_id: RoomId(9) };
        assert_eq!(event.room_id(), RoomId(9));

        let event = RoomEvent::VoteCast {
            vote: WordValidationVote {
                id: VoteId(1),
                room_id: RoomId(4),
                round_id: RoundId(2),
                answer_id: AnswerId(3),
                player_id: PlayerId(5),
                vote: Some(true),
            },
        };
        assert_eq!(event.room_id(), RoomId(4));
    }

    #[test]
    fn test_unknown_event_type_fails_to_decode() {
        let unknown = r#"{"type": "PlayerTeleported", "room_id": 1}"#;
        let result: Result<RoomEvent, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
