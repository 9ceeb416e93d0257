//! Error types for the engine layer.
//!
//! Nothing here is fatal: store failures surface typed so the caller can
//! offer a retry, and exhausted waits are usually reported as a plain
//! `None` by the operation that degraded — [`EngineError::SyncTimeout`]
//! exists for the few waits with no sensible fallback.

use lexiduel_protocol::{AnswerId, PlayerId, RequestId, RoomId, RoundId};
use lexiduel_store::StoreError;

use crate::DictionaryError;

/// Errors that can occur during engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No joinable room with this code — unknown, already playing,
    /// finished, or full.
    #[error("room {code} cannot be joined")]
    RoomNotJoinable { code: String },

    /// The player already submitted this round. Raised by the
    /// client-side guard or by the store's insert-once backstop.
    #[error("player {player_id} already submitted round {round_id}")]
    RoundAlreadySubmitted {
        round_id: RoundId,
        player_id: PlayerId,
    },

    /// The player already cast their ballot on this answer.
    #[error("player {player_id} already voted on answer {answer_id}")]
    AlreadyVoted {
        answer_id: AnswerId,
        player_id: PlayerId,
    },

    /// This session already has an end-game request in flight.
    #[error("an end-game request is already pending for round {round_id}")]
    RequestAlreadyPending { round_id: RoundId },

    /// The end-game request was already accepted or rejected.
    #[error("end-game request {0} was already settled")]
    RequestAlreadySettled(RequestId),

    /// The operation is reserved for the room's host.
    #[error("player {0} is not the host")]
    NotHost(PlayerId),

    /// The match cannot start before the opponent joins.
    #[error("room {0} needs a second player to start")]
    NotEnoughPlayers(RoomId),

    /// The match is over; no further rounds or submissions.
    #[error("room {0} has already finished")]
    MatchFinished(RoomId),

    /// A wait with no degraded fallback reached its ceiling.
    #[error("timed out waiting for {0}")]
    SyncTimeout(&'static str),

    /// A store-level failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The dictionary collaborator failed outside of word scoring
    /// (scoring itself degrades to manual validation instead).
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}
