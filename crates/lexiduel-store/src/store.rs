//! The [`GameStore`] trait — the store interface the engine is generic
//! over.
//!
//! One group of methods per table from the data model, plus the
//! conditional-insert operations that carry the concurrency control for
//! the consensus protocols. Implementations must make each method
//! atomic: a conditional insert either observes the existing row or
//! creates the new one, never both and never neither.

use std::time::Duration;

use lexiduel_protocol::{
    Answer, AnswerId, CategoryId, EndGameRequest, Player, PlayerId,
    RequestId, Room, RoomEvent, RoomId, Round, RoundId, RoundScore,
    WordValidationVote,
};
use tokio::sync::broadcast;

use crate::StoreError;

// ---------------------------------------------------------------------------
// Insert payloads
// ---------------------------------------------------------------------------

/// Fields for a new answer row. The store allocates the id, stamps
/// `submitted_at`, and initializes `manual_validation_result` to `None`.
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub room_id: RoomId,
    pub round_id: RoundId,
    pub player_id: PlayerId,
    pub category_id: CategoryId,
    pub word: String,
    pub is_valid: bool,
    pub points: u32,
    pub needs_manual_validation: bool,
}

/// Fields for a new round-score row. The store stamps `finished_at`.
#[derive(Debug, Clone)]
pub struct NewRoundScore {
    pub round_id: RoundId,
    pub player_id: PlayerId,
    pub round_score: u32,
    pub valid_words_count: u32,
    pub stopped_early: bool,
    pub penalty_applied: bool,
}

// ---------------------------------------------------------------------------
// GameStore
// ---------------------------------------------------------------------------

/// CRUD + conditional inserts + change notification over the shared
/// tables.
///
/// The engine holds an `Arc<S: GameStore>` and never touches rows any
/// other way. All reads used inside polling loops are side-effect-free,
/// so they may run arbitrarily many times before a wait succeeds or
/// expires.
pub trait GameStore: Send + Sync + 'static {
    // -- Rooms --

    /// Inserts a new Waiting room with the given join code.
    async fn create_room(
        &self,
        code: &str,
        max_players: usize,
    ) -> Result<Room, StoreError>;

    /// Fetches a room by id.
    async fn room(&self, room_id: RoomId) -> Result<Room, StoreError>;

    /// Looks a room up by its join code.
    async fn room_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Room>, StoreError>;

    /// Replaces a room row. Publishes [`RoomEvent::GameStarted`] when
    /// the write flips the status from Waiting to Playing.
    async fn update_room(&self, room: &Room) -> Result<(), StoreError>;

    /// Deletes a room and everything that references it (players,
    /// rounds, answers, scores, requests, votes).
    async fn delete_room(&self, room_id: RoomId) -> Result<(), StoreError>;

    /// Housekeeping: deletes Waiting rooms older than `max_age`.
    /// Returns how many rooms were removed.
    async fn delete_stale_rooms(
        &self,
        max_age: Duration,
    ) -> Result<usize, StoreError>;

    // -- Players --

    /// Inserts a player into a room. Atomic with the capacity and
    /// joinability checks: fails with [`StoreError::RoomNotJoinable`]
    /// unless the room is Waiting, and [`StoreError::RoomFull`] when
    /// all slots are taken.
    async fn insert_player(
        &self,
        room_id: RoomId,
        display_name: &str,
        is_host: bool,
    ) -> Result<Player, StoreError>;

    /// Fetches a player by id.
    async fn player(&self, player_id: PlayerId) -> Result<Player, StoreError>;

    /// All players in a room, ordered by join time.
    async fn players_in_room(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Player>, StoreError>;

    /// Stamps the player's `finished_at` and records their advisory
    /// round score.
    async fn mark_player_finished(
        &self,
        player_id: PlayerId,
        score: u32,
    ) -> Result<Player, StoreError>;

    /// Sets the ready-for-next-round flag.
    async fn set_player_ready(
        &self,
        player_id: PlayerId,
        ready: bool,
    ) -> Result<Player, StoreError>;

    /// Clears `finished_at` and readiness when a new round begins.
    /// Each client resets only its own row.
    async fn reset_player_round_state(
        &self,
        player_id: PlayerId,
    ) -> Result<Player, StoreError>;

    /// Removes a player row (guest leaving; the host leaves by deleting
    /// the room).
    async fn delete_player(
        &self,
        player_id: PlayerId,
    ) -> Result<(), StoreError>;

    // -- Rounds --

    /// Idempotent round creation. If the room already has a Playing
    /// round, returns it with `created = false` instead of inserting a
    /// duplicate — the guard for both clients racing to create round
    /// *n + 1*.
    async fn create_round_if_absent(
        &self,
        room_id: RoomId,
        round_number: u32,
        letter: char,
    ) -> Result<(Round, bool), StoreError>;

    /// Fetches a round by id.
    async fn round(&self, round_id: RoundId) -> Result<Round, StoreError>;

    /// The room's currently Playing round, if any.
    async fn playing_round(
        &self,
        room_id: RoomId,
    ) -> Result<Option<Round>, StoreError>;

    /// Looks up a round by its number within a room.
    async fn round_by_number(
        &self,
        room_id: RoomId,
        round_number: u32,
    ) -> Result<Option<Round>, StoreError>;

    /// Flips a round to Finished. Idempotent — finishing a finished
    /// round is a no-op, since either client may observe completion
    /// first.
    async fn finish_round(
        &self,
        round_id: RoundId,
    ) -> Result<Round, StoreError>;

    // -- Answers --

    /// Inserts one answer row. Unique per (round, player, category).
    async fn insert_answer(
        &self,
        new: NewAnswer,
    ) -> Result<Answer, StoreError>;

    /// Fetches an answer by id.
    async fn answer(&self, answer_id: AnswerId) -> Result<Answer, StoreError>;

    /// All answers in a round (both players, empty words included).
    async fn answers_for_round(
        &self,
        round_id: RoundId,
    ) -> Result<Vec<Answer>, StoreError>;

    /// One player's answers in a round.
    async fn player_answers(
        &self,
        round_id: RoundId,
        player_id: PlayerId,
    ) -> Result<Vec<Answer>, StoreError>;

    /// Rewrites an answer row. Reserved for the word-validation
    /// consensus — nothing else may mutate a persisted answer.
    async fn update_answer(&self, answer: &Answer) -> Result<(), StoreError>;

    // -- Round scores --

    /// Insert-once: fails with [`StoreError::Conflict`] if a score for
    /// this (round, player) already exists. This is the authoritative
    /// backstop behind the client-side submit-once guard.
    async fn insert_round_score(
        &self,
        new: NewRoundScore,
    ) -> Result<RoundScore, StoreError>;

    /// All scores submitted for a round.
    async fn round_scores(
        &self,
        round_id: RoundId,
    ) -> Result<Vec<RoundScore>, StoreError>;

    /// Rewrites a score row. Reserved for the word-validation
    /// consensus recompute.
    async fn update_round_score(
        &self,
        score: &RoundScore,
    ) -> Result<(), StoreError>;

    // -- End-game requests --

    /// Conditional insert: if a Pending request already exists for this
    /// (room, round), returns it with `created = false` — a concurrent
    /// second request observes the first instead of erroring.
    async fn insert_end_game_request(
        &self,
        room_id: RoomId,
        round_id: RoundId,
        requester: PlayerId,
    ) -> Result<(EndGameRequest, bool), StoreError>;

    /// Fetches a request by id.
    async fn end_game_request(
        &self,
        request_id: RequestId,
    ) -> Result<EndGameRequest, StoreError>;

    /// The Pending request for this (room, round), if any.
    async fn pending_end_game_request(
        &self,
        room_id: RoomId,
        round_id: RoundId,
    ) -> Result<Option<EndGameRequest>, StoreError>;

    /// Settles a Pending request. Fails with [`StoreError::Conflict`]
    /// if it was already settled.
    async fn settle_end_game_request(
        &self,
        request_id: RequestId,
        accept: bool,
    ) -> Result<EndGameRequest, StoreError>;

    // -- Word-validation votes --

    /// Opens voting on a contested answer: one null-ballot row per
    /// voter, inserted as a batch. No-op if rows already exist (both
    /// clients may contest the same word).
    async fn open_votes(
        &self,
        answer_id: AnswerId,
        voters: &[PlayerId],
    ) -> Result<Vec<WordValidationVote>, StoreError>;

    /// All vote rows for an answer.
    async fn votes_for_answer(
        &self,
        answer_id: AnswerId,
    ) -> Result<Vec<WordValidationVote>, StoreError>;

    /// Casts a ballot. The row's `vote` field transitions None → Some
    /// exactly once; a second cast fails with [`StoreError::Conflict`].
    async fn cast_vote(
        &self,
        answer_id: AnswerId,
        player_id: PlayerId,
        vote: bool,
    ) -> Result<WordValidationVote, StoreError>;

    // -- Change notification --

    /// Subscribes to best-effort change events for one room.
    ///
    /// Only a latency optimization: the engine never depends on
    /// receiving an event, and receivers may lag or drop without
    /// consequence.
    fn subscribe(&self, room_id: RoomId) -> broadcast::Receiver<RoomEvent>;
}
