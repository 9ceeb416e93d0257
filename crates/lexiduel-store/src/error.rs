//! Error types for the store layer.

use lexiduel_protocol::{AnswerId, PlayerId, RequestId, RoomId, RoundId};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The room does not exist (or was deleted by the host leaving).
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The player row does not exist.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// The round does not exist.
    #[error("round {0} not found")]
    RoundNotFound(RoundId),

    /// The answer does not exist.
    #[error("answer {0} not found")]
    AnswerNotFound(AnswerId),

    /// The end-game request does not exist.
    #[error("end-game request {0} not found")]
    RequestNotFound(RequestId),

    /// No vote row exists for this (answer, player) pair.
    #[error("no vote row for answer {0} and player {1}")]
    VoteNotFound(AnswerId, PlayerId),

    /// The room has no free player slots.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The room is not accepting players (already playing or finished).
    #[error("room {0} is not accepting players")]
    RoomNotJoinable(RoomId),

    /// A uniqueness or write-once constraint was violated.
    ///
    /// The message names the constraint ("round score already
    /// submitted", "vote already cast", …). Callers that care map this
    /// to their own typed error.
    #[error("conflict: {0}")]
    Conflict(&'static str),
}
