//! Unanimous-vote adjudication of contested words.
//!
//! After results are shown, a player may contest a word the dictionary
//! rejected. Every seated player gets a ballot; the verdict flips to
//! valid only on unanimity. A completed vote is the single path that
//! ever rewrites an Answer row and recomputes its RoundScore — and that
//! rewrite is idempotent, so both clients may trigger it.

use std::sync::Arc;

use lexiduel_protocol::{
    Answer, AnswerId, GameMode, PlayerId, WordValidationVote,
};
use lexiduel_store::{GameStore, StoreError};

use crate::scoring::finalize_round_score;
use crate::sync::{attempts_for, poll_until};
use crate::{EngineError, GameConfig};

/// The word-validation voting protocol.
pub struct WordValidationConsensus<S> {
    store: Arc<S>,
    config: GameConfig,
    mode: GameMode,
}

impl<S: GameStore> WordValidationConsensus<S> {
    /// Creates the protocol over the shared store.
    pub fn new(store: Arc<S>, config: GameConfig, mode: GameMode) -> Self {
        Self {
            store,
            config,
            mode,
        }
    }

    /// Opens voting on an answer: one null ballot per seated player.
    /// Idempotent — if ballots already exist they are returned as-is.
    pub async fn open(
        &self,
        answer_id: AnswerId,
    ) -> Result<Vec<WordValidationVote>, EngineError> {
        let answer = self.store.answer(answer_id).await?;
        let players = self.store.players_in_room(answer.room_id).await?;
        let voters: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        Ok(self.store.open_votes(answer_id, &voters).await?)
    }

    /// Casts this player's ballot, exactly once.
    ///
    /// If this was the last outstanding ballot, the vote resolves
    /// immediately and the updated answer is returned.
    pub async fn cast_vote(
        &self,
        answer_id: AnswerId,
        player_id: PlayerId,
        vote: bool,
    ) -> Result<Option<Answer>, EngineError> {
        self.store
            .cast_vote(answer_id, player_id, vote)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => EngineError::AlreadyVoted {
                    answer_id,
                    player_id,
                },
                other => EngineError::Store(other),
            })?;

        self.resolve(answer_id).await
    }

    /// Applies the verdict once every ballot is in: valid only if
    /// **all** votes are `true`. Updates the answer and recomputes the
    /// owning round score. Returns `Ok(None)` while ballots are still
    /// outstanding.
    ///
    /// Safe to call repeatedly and from both clients — a second
    /// resolution recomputes the same values.
    pub async fn resolve(
        &self,
        answer_id: AnswerId,
    ) -> Result<Option<Answer>, EngineError> {
        let votes = self.store.votes_for_answer(answer_id).await?;
        if votes.is_empty() || votes.iter().any(|v| v.vote.is_none()) {
            return Ok(None);
        }

        let verdict = votes.iter().all(|v| v.vote == Some(true));

        let mut answer = self.store.answer(answer_id).await?;
        answer.is_valid = verdict;
        answer.manual_validation_result = Some(verdict);
        answer.points = if verdict {
            self.config.points_per_word(self.mode)
        } else {
            0
        };
        self.store.update_answer(&answer).await?;

        tracing::info!(
            %answer_id,
            word = %answer.word,
            verdict,
            ballots = votes.len(),
            "contested word resolved"
        );

        self.recompute_round_score(&answer).await?;
        Ok(Some(answer))
    }

    /// Polls until every ballot is cast, then resolves. `Ok(None)` on
    /// timeout: the contest is abandoned and the prior verdict stands.
    pub async fn wait_for_resolution(
        &self,
        answer_id: AnswerId,
    ) -> Result<Option<Answer>, EngineError> {
        let interval = self.config.vote_poll_interval;
        let attempts = attempts_for(self.config.vote_timeout, interval);

        let store = Arc::clone(&self.store);
        let complete = poll_until(
            move || {
                let store = Arc::clone(&store);
                async move {
                    let votes = store.votes_for_answer(answer_id).await?;
                    let done = !votes.is_empty()
                        && votes.iter().all(|v| v.vote.is_some());
                    Ok::<_, EngineError>(done.then_some(()))
                }
            },
            interval,
            attempts,
        )
        .await?;

        match complete {
            Some(()) => self.resolve(answer_id).await,
            None => {
                tracing::info!(
                    %answer_id,
                    "vote never completed, prior verdict stands"
                );
                Ok(None)
            }
        }
    }

    /// Recomputes the round score owning `answer` from its current
    /// answer rows, re-applying the penalty rule with the round's
    /// stored `stopped_early` flag.
    async fn recompute_round_score(
        &self,
        answer: &Answer,
    ) -> Result<(), EngineError> {
        let scores = self.store.round_scores(answer.round_id).await?;
        let Some(mut score) = scores
            .into_iter()
            .find(|s| s.player_id == answer.player_id)
        else {
            // A vote on a round nobody scored — nothing to recompute.
            tracing::warn!(
                round_id = %answer.round_id,
                player_id = %answer.player_id,
                "no round score to recompute after vote"
            );
            return Ok(());
        };

        let answers = self
            .store
            .player_answers(answer.round_id, answer.player_id)
            .await?;
        let raw_score: u32 = answers.iter().map(|a| a.points).sum();
        let valid_words = answers.iter().filter(|a| a.is_valid).count() as u32;
        let all_answered = answers.iter().all(|a| !a.word.trim().is_empty());
        let any_invalid = answers.iter().any(|a| !a.is_valid);

        let (final_score, penalty_applied) = finalize_round_score(
            raw_score,
            score.stopped_early,
            all_answered,
            any_invalid,
            self.config.early_stop_penalty,
        );

        score.round_score = final_score;
        score.valid_words_count = valid_words;
        score.penalty_applied = penalty_applied;
        self.store.update_round_score(&score).await?;

        tracing::info!(
            round_id = %score.round_id,
            player_id = %score.player_id,
            score = final_score,
            penalty_applied,
            "round score recomputed after vote"
        );
        Ok(())
    }
}
