//! Round lifecycle: creation, answer submission, finish detection, and
//! the both-ready barrier between rounds.
//!
//! A round is Playing → Finished, one-way. Creation is idempotent at the
//! store, but the real guard against duplicate rounds is asymmetry: only
//! the host ever creates round *n + 1*; the guest polls for it to
//! appear. Submission is insert-once per (round, player), backstopped by
//! the store's unique constraint.

use std::sync::Arc;

use lexiduel_protocol::{
    Answer, CategoryId, GameMode, Player, PlayerId, RoomId, Round, RoundId,
    RoundScore,
};
use lexiduel_store::{GameStore, NewAnswer, NewRoundScore, StoreError};

use crate::scoring::{finalize_round_score, score_word};
use crate::sync::{attempts_for, poll_until};
use crate::{letters, Dictionary, EngineError, GameConfig};

/// One category's answer as entered by the player. Empty words are
/// submitted too, so the comparison view shows every category.
#[derive(Debug, Clone)]
pub struct AnswerInput {
    pub category_id: CategoryId,
    pub word: String,
}

/// The outcome of a submission.
#[derive(Debug, Clone)]
pub struct SubmittedRound {
    /// The authoritative score row that was inserted.
    pub score: RoundScore,
    /// The persisted answers, one per category.
    pub answers: Vec<Answer>,
}

/// Round operations over the shared store.
pub struct RoundController<S> {
    store: Arc<S>,
    config: GameConfig,
    mode: GameMode,
}

impl<S: GameStore> RoundController<S> {
    /// Creates a controller over the shared store.
    pub fn new(store: Arc<S>, config: GameConfig, mode: GameMode) -> Self {
        Self {
            store,
            config,
            mode,
        }
    }

    /// Idempotent round creation: if the room already has a Playing
    /// round, that round is returned instead of a duplicate.
    ///
    /// An actual creation also stamps the room's current letter, round
    /// number, and used-letter set, so the room row always describes
    /// the round in play.
    pub async fn create_round(
        &self,
        room_id: RoomId,
        round_number: u32,
        letter: char,
    ) -> Result<Round, EngineError> {
        let (round, created) = self
            .store
            .create_round_if_absent(room_id, round_number, letter)
            .await?;

        if created {
            let mut room = self.store.room(room_id).await?;
            room.letter = Some(round.letter);
            room.current_round_number = round.round_number;
            if !room.used_letters.contains(&round.letter) {
                room.used_letters.push(round.letter);
            }
            self.store.update_room(&room).await?;
        }
        Ok(round)
    }

    /// Draws the next letter and opens the next round. Host-only by
    /// convention (see [`advance_round`](Self::advance_round)); round 1
    /// goes through here too, right after the match starts.
    pub async fn start_next_round(
        &self,
        room_id: RoomId,
    ) -> Result<Round, EngineError> {
        let mut room = self.store.room(room_id).await?;
        let letter = letters::next_letter(&mut room);
        let number = room.current_round_number + 1;
        room.letter = Some(letter);
        room.current_round_number = number;
        self.store.update_room(&room).await?;

        self.create_round(room_id, number, letter).await
    }

    /// Scores and persists a player's answers for the round, then marks
    /// the player finished.
    ///
    /// `stopped_early` records *why* the round ended for this player:
    /// `true` only for a voluntary early validation. The flag feeds the
    /// penalty rule now and again if a vote later changes a verdict.
    pub async fn submit_answers<D: Dictionary>(
        &self,
        round_id: RoundId,
        player_id: PlayerId,
        inputs: &[AnswerInput],
        stopped_early: bool,
        dictionary: &D,
    ) -> Result<SubmittedRound, EngineError> {
        let round = self.store.round(round_id).await?;

        let already = self
            .store
            .round_scores(round_id)
            .await?
            .iter()
            .any(|s| s.player_id == player_id);
        if already {
            return Err(EngineError::RoundAlreadySubmitted {
                round_id,
                player_id,
            });
        }

        let points_per_word = self.config.points_per_word(self.mode);
        let mut answers = Vec::with_capacity(inputs.len());
        let mut raw_score = 0u32;
        let mut valid_words = 0u32;
        let mut all_answered = true;
        let mut any_invalid = false;

        for input in inputs {
            let verdict = score_word(
                dictionary,
                &input.word,
                round.letter,
                input.category_id,
                points_per_word,
            )
            .await;

            raw_score += verdict.points;
            if verdict.is_valid {
                valid_words += 1;
            } else {
                any_invalid = true;
            }
            if input.word.trim().is_empty() {
                all_answered = false;
            }

            let answer = self
                .store
                .insert_answer(NewAnswer {
                    room_id: round.room_id,
                    round_id,
                    player_id,
                    category_id: input.category_id,
                    word: input.word.trim().to_string(),
                    is_valid: verdict.is_valid,
                    points: verdict.points,
                    needs_manual_validation: verdict.needs_manual_validation,
                })
                .await?;
            answers.push(answer);
        }

        let (final_score, penalty_applied) = finalize_round_score(
            raw_score,
            stopped_early,
            all_answered,
            any_invalid,
            self.config.early_stop_penalty,
        );

        let score = self
            .store
            .insert_round_score(NewRoundScore {
                round_id,
                player_id,
                round_score: final_score,
                valid_words_count: valid_words,
                stopped_early,
                penalty_applied,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    EngineError::RoundAlreadySubmitted {
                        round_id,
                        player_id,
                    }
                }
                other => EngineError::Store(other),
            })?;

        self.store
            .mark_player_finished(player_id, final_score)
            .await?;

        tracing::info!(
            %round_id,
            %player_id,
            score = final_score,
            valid_words,
            stopped_early,
            penalty_applied,
            "answers submitted"
        );

        self.finish_round_if_complete(round.room_id, round_id).await?;

        Ok(SubmittedRound { score, answers })
    }

    /// Flips the round to Finished once every seated player has a score
    /// row. Either client may observe completion first; the flip is
    /// idempotent.
    async fn finish_round_if_complete(
        &self,
        room_id: RoomId,
        round_id: RoundId,
    ) -> Result<(), EngineError> {
        let players = self.store.players_in_room(room_id).await?;
        let scores = self.store.round_scores(round_id).await?;
        let all_submitted = !players.is_empty()
            && players.iter().all(|p| {
                scores.iter().any(|s| s.player_id == p.id)
            });
        if all_submitted {
            self.store.finish_round(round_id).await?;
        }
        Ok(())
    }

    /// Observation helper for the sync loop: has some *other* player
    /// submitted this round? Pure read, safe to poll.
    pub async fn opponent_finished(
        &self,
        round_id: RoundId,
        self_id: PlayerId,
    ) -> Result<bool, EngineError> {
        let scores = self.store.round_scores(round_id).await?;
        Ok(scores.iter().any(|s| s.player_id != self_id))
    }

    /// Polls until the opponent submits or the given ceiling passes.
    /// Returns `false` on timeout — the caller proceeds without them.
    pub async fn wait_for_opponent(
        &self,
        round_id: RoundId,
        self_id: PlayerId,
        timeout: std::time::Duration,
    ) -> Result<bool, EngineError> {
        let interval = self.config.opponent_poll_interval;
        let store = Arc::clone(&self.store);
        let found = poll_until(
            move || {
                let store = Arc::clone(&store);
                async move {
                    let scores = store.round_scores(round_id).await?;
                    let done =
                        scores.iter().any(|s| s.player_id != self_id);
                    Ok::<_, EngineError>(done.then_some(()))
                }
            },
            interval,
            attempts_for(timeout, interval),
        )
        .await?;
        Ok(found.is_some())
    }

    /// Flags this player ready for the next round (after viewing
    /// results).
    pub async fn mark_ready(
        &self,
        player_id: PlayerId,
    ) -> Result<Player, EngineError> {
        Ok(self.store.set_player_ready(player_id, true).await?)
    }

    /// The both-ready barrier, then the host/guest asymmetric creation
    /// of round *n + 1*.
    ///
    /// Marks this player ready, then:
    /// - the **host** polls until every seated player is ready, draws
    ///   the next letter, and creates the round;
    /// - the **guest** polls for the new round's appearance — the host
    ///   only creates it after the barrier, so its existence implies
    ///   agreement.
    ///
    /// Either side resets its own readiness/finished flags once the new
    /// round is in hand. Returns `Ok(None)` when the other player never
    /// showed up before the ceiling; the caller degrades (typically by
    /// offering to leave the room).
    pub async fn advance_round(
        &self,
        room_id: RoomId,
        current_round_number: u32,
        player_id: PlayerId,
    ) -> Result<Option<Round>, EngineError> {
        let player = self.store.player(player_id).await?;
        self.store.set_player_ready(player_id, true).await?;

        let next_number = current_round_number + 1;
        let interval = self.config.barrier_poll_interval;
        let attempts = attempts_for(self.config.barrier_timeout, interval);

        let round = if player.is_host {
            let store = Arc::clone(&self.store);
            let both_ready = poll_until(
                move || {
                    let store = Arc::clone(&store);
                    async move {
                        let players = store.players_in_room(room_id).await?;
                        let ready = players.len() >= 2
                            && players
                                .iter()
                                .all(|p| p.ready_for_next_round);
                        Ok::<_, EngineError>(ready.then_some(()))
                    }
                },
                interval,
                attempts,
            )
            .await?;

            if both_ready.is_none() {
                tracing::info!(
                    %room_id,
                    round = next_number,
                    "ready barrier timed out"
                );
                return Ok(None);
            }
            Some(self.start_next_round(room_id).await?)
        } else {
            let store = Arc::clone(&self.store);
            poll_until(
                move || {
                    let store = Arc::clone(&store);
                    async move {
                        Ok::<_, EngineError>(
                            store
                                .round_by_number(room_id, next_number)
                                .await?,
                        )
                    }
                },
                interval,
                attempts,
            )
            .await?
        };

        match round {
            Some(round) => {
                self.store.reset_player_round_state(player_id).await?;
                tracing::info!(
                    %room_id,
                    %player_id,
                    round = round.round_number,
                    letter = %round.letter,
                    "advanced to next round"
                );
                Ok(Some(round))
            }
            None => {
                tracing::info!(
                    %room_id,
                    round = next_number,
                    "next round never appeared"
                );
                Ok(None)
            }
        }
    }
}
