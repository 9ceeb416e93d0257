//! Record types shared between the store and the engine.
//!
//! Every row the two clients converge on is defined here. Records are
//! plain serde structs; the store allocates ids and stamps timestamps,
//! the engine mutates fields through the store's typed operations.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
///
/// All persisted timestamps use this representation. The store stamps
/// rows on insert; nullable timestamps (`Option<u64>`) double as flags —
/// a player with `finished_at: Some(_)` has submitted the current round.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(
    /// A unique identifier for a room (one two-player match).
    RoomId, "R-"
);
id_type!(
    /// A unique identifier for a player row within a room.
    ///
    /// Allocated per join — the same human joining two rooms gets two
    /// distinct player ids. Identity/authentication is out of scope.
    PlayerId, "P-"
);
id_type!(
    /// A unique identifier for one round of a match.
    RoundId, "RD-"
);
id_type!(
    /// A unique identifier for one submitted answer.
    AnswerId, "A-"
);
id_type!(
    /// A unique identifier for an end-game request.
    RequestId, "REQ-"
);
id_type!(
    /// A unique identifier for a word-validation vote row.
    VoteId, "V-"
);

/// A dictionary category ("Fruit", "Animal", …).
///
/// Categories are owned by the dictionary collaborator; the engine only
/// carries their ids through answers and votes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CategoryId(pub u32);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game mode
// ---------------------------------------------------------------------------

/// Which ruleset a session plays under.
///
/// The two modes score words differently (see `GameConfig` in the
/// engine crate); everything else in this crate is mode-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Single-player against the clock. No consensus machinery.
    Solo,
    /// Two-player match through the shared store.
    Online,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// Transitions are one-way:
///
/// ```text
/// Waiting → Playing → Finished
/// ```
///
/// - **Waiting**: room exists, host is waiting for an opponent. The
///   only state that accepts joins.
/// - **Playing**: match in progress, rounds being played.
/// - **Finished**: match over; rows remain readable until cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Playing) | (Self::Playing, Self::Finished)
        )
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// A two-player match container, identified by a short shareable code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// The room's unique ID.
    pub id: RoomId,
    /// 4-character human-shareable join code.
    pub code: String,
    /// The current round's letter. `None` until round 1 is created.
    pub letter: Option<char>,
    /// Lifecycle state.
    pub status: RoomStatus,
    /// Maximum players allowed (2 for a duel).
    pub max_players: usize,
    /// Letters already used in this room. A letter never repeats until
    /// all 26 have been drawn, after which the pool resets.
    pub used_letters: Vec<char>,
    /// Number of the round currently (or last) in play. 0 before round 1.
    pub current_round_number: u32,
    /// When the room was created.
    pub created_at: u64,
    /// When the match started (status flipped to Playing).
    pub started_at: Option<u64>,
    /// When the match finished.
    pub finished_at: Option<u64>,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One participant's row in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// The player's unique ID.
    pub id: PlayerId,
    /// The room this row belongs to.
    pub room_id: RoomId,
    /// Display name shown to the opponent.
    pub display_name: String,
    /// Exactly one player per room is the host. The host starts the
    /// match, creates rounds, and deletes the room by leaving it.
    pub is_host: bool,
    /// Last submitted round score. Advisory — authoritative totals come
    /// from [`RoundScore`] rows.
    pub score: u32,
    /// Set when the player submits the current round; cleared when the
    /// next round begins. Presence is the "I'm done" signal the
    /// opponent polls for.
    pub finished_at: Option<u64>,
    /// Set after viewing results; both players ready gates the next
    /// round.
    pub ready_for_next_round: bool,
    /// When the player joined the room.
    pub joined_at: u64,
}

impl Player {
    /// Returns `true` if the player has submitted the current round.
    pub fn has_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

/// The lifecycle state of a round. One-way: Playing → Finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Playing,
    Finished,
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// One timed letter-and-categories sub-game within a room.
///
/// At most one round per room is Playing at any time. The store's
/// create-if-absent operation preserves this even when both clients try
/// to create the same round concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// The round's unique ID.
    pub id: RoundId,
    /// The room this round belongs to.
    pub room_id: RoomId,
    /// Monotonic per room, starting at 1.
    pub round_number: u32,
    /// The letter every answer must start with.
    pub letter: char,
    /// Lifecycle state.
    pub status: RoundStatus,
    /// When the round was created.
    pub created_at: u64,
}

// ---------------------------------------------------------------------------
// Answer
// ---------------------------------------------------------------------------

/// One player's word for one category in one round.
///
/// Written once at submission (empty words included, so the comparison
/// view is complete). Only the word-validation consensus may rewrite a
/// row afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The answer's unique ID.
    pub id: AnswerId,
    /// The room this answer belongs to.
    pub room_id: RoomId,
    /// The round this answer belongs to.
    pub round_id: RoundId,
    /// The submitting player.
    pub player_id: PlayerId,
    /// The category answered.
    pub category_id: CategoryId,
    /// The submitted word, verbatim. May be empty.
    pub word: String,
    /// Current verdict.
    pub is_valid: bool,
    /// Points awarded for this word.
    pub points: u32,
    /// Offered when the word started with the right letter but the
    /// dictionary rejected it (or was unavailable) — players may
    /// contest such words by vote.
    pub needs_manual_validation: bool,
    /// Outcome of a completed vote, if the word was contested.
    pub manual_validation_result: Option<bool>,
    /// When the answer was submitted.
    pub submitted_at: u64,
}

// ---------------------------------------------------------------------------
// RoundScore
// ---------------------------------------------------------------------------

/// One player's authoritative result for one round.
///
/// Exactly one row per (round, player), inserted once at submission.
/// Rewritten only by the word-validation consensus recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundScore {
    /// The round this score belongs to.
    pub round_id: RoundId,
    /// The scored player.
    pub player_id: PlayerId,
    /// Final round score, penalty applied, never negative.
    pub round_score: u32,
    /// Number of valid words in the round.
    pub valid_words_count: u32,
    /// `true` if the player voluntarily ended the round before the
    /// timer. Timer expiry, opponent-triggered auto-submit, and
    /// mutually-accepted end requests all record `false`.
    pub stopped_early: bool,
    /// Whether the early-stop penalty was subtracted.
    pub penalty_applied: bool,
    /// When the score was submitted.
    pub finished_at: u64,
}

// ---------------------------------------------------------------------------
// EndGameRequest
// ---------------------------------------------------------------------------

/// Settlement state of an end-game request.
///
/// Pending → Accepted or Pending → Rejected, settled exactly once. A
/// requester that stops waiting abandons the row client-side; the store
/// keeps it Pending, which is harmless because a new request is a no-op
/// while one is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndGameStatus {
    Pending,
    Accepted,
    Rejected,
}

impl EndGameStatus {
    /// Returns `true` once the request has been answered.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for EndGameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A proposal to end the current round before the timer expires.
///
/// At most one Pending request exists per (room, round) — creation is a
/// conditional insert in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndGameRequest {
    /// The request's unique ID.
    pub id: RequestId,
    /// The room the request belongs to.
    pub room_id: RoomId,
    /// The round the request would end.
    pub round_id: RoundId,
    /// Who asked.
    pub requester_player_id: PlayerId,
    /// Settlement state.
    pub status: EndGameStatus,
    /// When the request was created.
    pub created_at: u64,
    /// When it was accepted or rejected.
    pub responded_at: Option<u64>,
}

// ---------------------------------------------------------------------------
// WordValidationVote
// ---------------------------------------------------------------------------

/// One player's ballot on one contested answer.
///
/// Rows are created in a batch covering every current room player the
/// first time an answer is contested, with `vote: None`. Each player's
/// `vote` transitions None → Some exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordValidationVote {
    /// The vote row's unique ID.
    pub id: VoteId,
    /// The room the contested answer belongs to.
    pub room_id: RoomId,
    /// The round the contested answer belongs to.
    pub round_id: RoundId,
    /// The contested answer.
    pub answer_id: AnswerId,
    /// The voter.
    pub player_id: PlayerId,
    /// `None` until cast. The verdict flips to valid only if every
    /// ballot is `Some(true)`.
    pub vote: Option<bool>,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        // `#[serde(transparent)]`: RoomId(7) → `7`, not `{"0":7}`.
        assert_eq!(serde_json::to_string(&RoomId(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&PlayerId(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&CategoryId(3)).unwrap(), "3");

        let id: RoundId = serde_json::from_str("9").unwrap();
        assert_eq!(id, RoundId(9));
    }

    #[test]
    fn test_id_display_prefixes() {
        assert_eq!(RoomId(3).to_string(), "R-3");
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(RoundId(1).to_string(), "RD-1");
        assert_eq!(AnswerId(12).to_string(), "A-12");
        assert_eq!(RequestId(5).to_string(), "REQ-5");
        assert_eq!(VoteId(8).to_string(), "V-8");
    }

    #[test]
    fn test_room_status_serializes_snake_case() {
        let json = serde_json::to_string(&RoomStatus::Waiting).unwrap();
        assert_eq!(json, "\"waiting\"");
        let json = serde_json::to_string(&RoomStatus::Playing).unwrap();
        assert_eq!(json, "\"playing\"");
    }

    #[test]
    fn test_room_status_is_joinable() {
        assert!(RoomStatus::Waiting.is_joinable());
        assert!(!RoomStatus::Playing.is_joinable());
        assert!(!RoomStatus::Finished.is_joinable());
    }

    #[test]
    fn test_room_status_transitions_are_one_way() {
        assert!(RoomStatus::Waiting.can_transition_to(RoomStatus::Playing));
        assert!(RoomStatus::Playing.can_transition_to(RoomStatus::Finished));
        assert!(!RoomStatus::Waiting.can_transition_to(RoomStatus::Finished));
        assert!(!RoomStatus::Finished.can_transition_to(RoomStatus::Waiting));
        assert!(!RoomStatus::Playing.can_transition_to(RoomStatus::Waiting));
    }

    #[test]
    fn test_end_game_status_is_settled() {
        assert!(!EndGameStatus::Pending.is_settled());
        assert!(EndGameStatus::Accepted.is_settled());
        assert!(EndGameStatus::Rejected.is_settled());
    }

    #[test]
    fn test_player_has_finished() {
        let mut player = Player {
            id: PlayerId(1),
            room_id: RoomId(1),
            display_name: "alice".into(),
            is_host: true,
            score: 0,
            finished_at: None,
            ready_for_next_round: false,
            joined_at: 0,
        };
        assert!(!player.has_finished());
        player.finished_at = Some(1);
        assert!(player.has_finished());
    }

    #[test]
    fn test_round_round_trip() {
        let round = Round {
            id: RoundId(4),
            room_id: RoomId(2),
            round_number: 3,
            letter: 'B',
            status: RoundStatus::Playing,
            created_at: 1000,
        };
        let bytes = serde_json::to_vec(&round).unwrap();
        let decoded: Round = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(round, decoded);
    }

    #[test]
    fn test_vote_round_trip_with_null_ballot() {
        let vote = WordValidationVote {
            id: VoteId(1),
            room_id: RoomId(1),
            round_id: RoundId(1),
            answer_id: AnswerId(9),
            player_id: PlayerId(2),
            vote: None,
        };
        let json: serde_json::Value = serde_json::to_value(&vote).unwrap();
        assert!(json["vote"].is_null());

        let decoded: WordValidationVote =
            serde_json::from_value(json).unwrap();
        assert_eq!(decoded, vote);
    }

    #[test]
    fn test_now_millis_is_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
        assert!(a > 1_500_000_000_000); // past 2017 — sanity, not precision
    }
}
