//! `GameSession` — one player's handle on an online match.
//!
//! Each client owns exactly one session per active game. The session
//! carries the room/player/round context explicitly (there is no
//! process-wide "current room"), composes the engine components over
//! the shared store, and adds the client-side guards: submit-once per
//! round and request-once per end-game handshake. The store's unique
//! constraints back both guards authoritatively.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use lexiduel_engine::{
    sync::{attempts_for, poll_until},
    AnswerInput, Category, Dictionary, EndGameConsensus, EngineError,
    GameConfig, RoomRegistry, RoundController, SubmittedRound,
    WordValidationConsensus,
};
use lexiduel_protocol::{
    Answer, AnswerId, EndGameRequest, EndGameStatus, GameMode, Player,
    PlayerId, RequestId, Room, RoomEvent, RoomId, Round, RoundId,
    RoundScore, WordValidationVote,
};
use lexiduel_store::GameStore;
use tokio::sync::broadcast;

use crate::Error;

/// One player's view of an online match.
pub struct GameSession<S, D> {
    store: Arc<S>,
    dictionary: Arc<D>,
    config: GameConfig,
    registry: RoomRegistry<S>,
    rounds: RoundController<S>,
    endgame: EndGameConsensus<S>,
    votes: WordValidationConsensus<S>,
    room_id: RoomId,
    player_id: PlayerId,
    is_host: bool,
    current_round: Option<Round>,
    /// Client-side submit-once guard; the store's (round, player)
    /// unique constraint is the backstop.
    submitted: HashSet<RoundId>,
    /// Client-side request-once guard for the end-game handshake.
    pending_request: Option<RequestId>,
}

impl<S: GameStore, D: Dictionary> GameSession<S, D> {
    fn assemble(
        store: Arc<S>,
        dictionary: Arc<D>,
        config: GameConfig,
        room: &Room,
        player: &Player,
    ) -> Self {
        Self {
            registry: RoomRegistry::new(Arc::clone(&store), config.clone()),
            rounds: RoundController::new(
                Arc::clone(&store),
                config.clone(),
                GameMode::Online,
            ),
            endgame: EndGameConsensus::new(
                Arc::clone(&store),
                config.clone(),
            ),
            votes: WordValidationConsensus::new(
                Arc::clone(&store),
                config.clone(),
                GameMode::Online,
            ),
            store,
            dictionary,
            config,
            room_id: room.id,
            player_id: player.id,
            is_host: player.is_host,
            current_round: None,
            submitted: HashSet::new(),
            pending_request: None,
        }
    }

    /// Creates a room and returns the host's session for it.
    pub async fn create_room(
        store: Arc<S>,
        dictionary: Arc<D>,
        config: GameConfig,
        host_name: &str,
    ) -> Result<Self, Error> {
        let registry = RoomRegistry::new(Arc::clone(&store), config.clone());
        let (room, player) = registry.create_room(host_name).await?;
        Ok(Self::assemble(store, dictionary, config, &room, &player))
    }

    /// Joins a room by its code and returns the guest's session.
    pub async fn join_room(
        store: Arc<S>,
        dictionary: Arc<D>,
        config: GameConfig,
        code: &str,
        display_name: &str,
    ) -> Result<Self, Error> {
        let registry = RoomRegistry::new(Arc::clone(&store), config.clone());
        let (room, player) = registry.join_room(code, display_name).await?;
        Ok(Self::assemble(store, dictionary, config, &room, &player))
    }

    // -- Accessors --

    /// The room this session plays in.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// This session's player row id.
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Whether this session is the room's host.
    pub fn is_host(&self) -> bool {
        self.is_host
    }

    /// The round currently in play from this session's point of view.
    pub fn current_round(&self) -> Option<&Round> {
        self.current_round.as_ref()
    }

    /// Fresh room row from the store.
    pub async fn room(&self) -> Result<Room, Error> {
        Ok(self.store.room(self.room_id).await?)
    }

    /// Everyone seated in the room, host first.
    pub async fn players(&self) -> Result<Vec<Player>, Error> {
        Ok(self.registry.players(self.room_id).await?)
    }

    /// The other seat, if taken.
    pub async fn opponent(&self) -> Result<Option<Player>, Error> {
        let players = self.players().await?;
        Ok(players.into_iter().find(|p| p.id != self.player_id))
    }

    /// Best-effort change notifications for this room. Purely a latency
    /// optimization over the polling the session already does.
    pub fn events(&self) -> broadcast::Receiver<RoomEvent> {
        self.store.subscribe(self.room_id)
    }

    /// The categories a round is played over, from the dictionary
    /// collaborator. Unlike word scoring, a failure here surfaces — a
    /// round can't open without its categories.
    pub async fn categories(&self) -> Result<Vec<Category>, Error> {
        Ok(self
            .dictionary
            .categories()
            .await
            .map_err(EngineError::from)?)
    }

    fn active_round(&self) -> Result<Round, Error> {
        self.current_round.clone().ok_or(Error::NoActiveRound)
    }

    // -- Match lifecycle --

    /// Host only: starts the match and opens round 1 with a fresh
    /// letter.
    pub async fn start_game(&mut self) -> Result<Round, Error> {
        if !self.is_host {
            return Err(EngineError::NotHost(self.player_id).into());
        }
        self.registry.start_game(self.room_id).await?;
        let round = self.rounds.start_next_round(self.room_id).await?;
        self.current_round = Some(round.clone());
        Ok(round)
    }

    /// Guest side of the lobby: polls until the host starts the match
    /// and round 1 appears.
    pub async fn wait_for_game_start(
        &mut self,
        timeout: Duration,
    ) -> Result<Round, Error> {
        let interval = self.config.barrier_poll_interval;
        let store = Arc::clone(&self.store);
        let room_id = self.room_id;

        let round = poll_until(
            move || {
                let store = Arc::clone(&store);
                async move {
                    Ok::<_, EngineError>(store.playing_round(room_id).await?)
                }
            },
            interval,
            attempts_for(timeout, interval),
        )
        .await?
        .ok_or(EngineError::SyncTimeout("the match to start"))?;

        self.current_round = Some(round.clone());
        Ok(round)
    }

    /// Ends the match for good.
    pub async fn finish_game(&self) -> Result<Room, Error> {
        Ok(self.registry.finish_game(self.room_id).await?)
    }

    /// Leaves the room. For the host this deletes the room and kicks
    /// the opponent back to the lobby; a guest just frees their seat.
    pub async fn leave(self) -> Result<(), Error> {
        self.registry
            .leave_room(self.room_id, self.player_id)
            .await?;
        Ok(())
    }

    // -- Round play --

    /// Submits this round's answers.
    ///
    /// `stopped_early` is `true` only for a voluntary early validation
    /// without a mutual agreement — that is what arms the penalty rule.
    pub async fn submit_answers(
        &mut self,
        inputs: &[AnswerInput],
        stopped_early: bool,
    ) -> Result<SubmittedRound, Error> {
        let round = self.active_round()?;
        if self.submitted.contains(&round.id) {
            return Err(EngineError::RoundAlreadySubmitted {
                round_id: round.id,
                player_id: self.player_id,
            }
            .into());
        }

        let submitted = self
            .rounds
            .submit_answers(
                round.id,
                self.player_id,
                inputs,
                stopped_early,
                self.dictionary.as_ref(),
            )
            .await?;
        self.submitted.insert(round.id);
        Ok(submitted)
    }

    /// Has the opponent already submitted the current round?
    pub async fn opponent_finished(&self) -> Result<bool, Error> {
        let round = self.active_round()?;
        Ok(self
            .rounds
            .opponent_finished(round.id, self.player_id)
            .await?)
    }

    /// Polls until the opponent submits, up to `timeout`. `false` means
    /// they never did — proceed without them.
    pub async fn wait_for_opponent(
        &self,
        timeout: Duration,
    ) -> Result<bool, Error> {
        let round = self.active_round()?;
        Ok(self
            .rounds
            .wait_for_opponent(round.id, self.player_id, timeout)
            .await?)
    }

    /// The cutoff path: once the opponent has finished, waits the grace
    /// delay (so the notice is visible) and submits the answers as they
    /// stand with `stopped_early = false` — the cutoff wasn't this
    /// player's choice, so no penalty can apply.
    ///
    /// Returns `None` when the opponent hasn't finished or this round
    /// was already submitted.
    pub async fn auto_submit_on_opponent_finish(
        &mut self,
        inputs: &[AnswerInput],
    ) -> Result<Option<SubmittedRound>, Error> {
        if !self.opponent_finished().await? {
            return Ok(None);
        }

        tokio::time::sleep(self.config.auto_submit_grace).await;
        match self.submit_answers(inputs, false).await {
            Ok(submitted) => Ok(Some(submitted)),
            Err(Error::Engine(EngineError::RoundAlreadySubmitted {
                ..
            })) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Everything needed for the results screen: all answers of the
    /// current round plus both score rows.
    pub async fn round_results(
        &self,
    ) -> Result<(Vec<Answer>, Vec<RoundScore>), Error> {
        let round = self.active_round()?;
        let answers = self.store.answers_for_round(round.id).await?;
        let scores = self.store.round_scores(round.id).await?;
        Ok((answers, scores))
    }

    /// Flags this player ready and runs the both-ready barrier.
    ///
    /// On agreement the host creates the next round and the guest picks
    /// it up; either way the session's round context moves forward.
    /// `None` means the opponent never became ready before the ceiling.
    pub async fn advance_round(&mut self) -> Result<Option<Round>, Error> {
        let round = self.active_round()?;
        let next = self
            .rounds
            .advance_round(self.room_id, round.round_number, self.player_id)
            .await?;

        if let Some(next) = &next {
            self.current_round = Some(next.clone());
            self.pending_request = None;
        }
        Ok(next)
    }

    // -- End-game handshake --

    /// Proposes ending the current round early and waits for the
    /// opponent's answer.
    ///
    /// `Ok(None)` means the request expired unanswered and was
    /// abandoned client-side. On `Some(Accepted)` the caller submits
    /// with `stopped_early = false`; the opponent does the same on
    /// their side.
    pub async fn request_end_game(
        &mut self,
    ) -> Result<Option<EndGameStatus>, Error> {
        let round = self.active_round()?;
        if self.pending_request.is_some() {
            return Err(EngineError::RequestAlreadyPending {
                round_id: round.id,
            }
            .into());
        }

        let request = self
            .endgame
            .request(self.room_id, round.id, self.player_id)
            .await?;
        self.pending_request = Some(request.id);

        let status = self.endgame.wait_for_response(request.id).await?;
        self.pending_request = None;
        Ok(status)
    }

    /// Checks whether the opponent has proposed ending the round. Meant
    /// to be polled on the request interval (or driven by
    /// [`RoomEvent::EndGameRequested`]).
    pub async fn incoming_end_game_request(
        &self,
    ) -> Result<Option<EndGameRequest>, Error> {
        let round = self.active_round()?;
        Ok(self
            .endgame
            .incoming_request(self.room_id, round.id, self.player_id)
            .await?)
    }

    /// Answers the opponent's end-game request. Accepting commits this
    /// side to submitting with `stopped_early = false` too.
    pub async fn respond_to_end_game(
        &self,
        request_id: RequestId,
        accept: bool,
    ) -> Result<EndGameRequest, Error> {
        Ok(self.endgame.respond(request_id, accept).await?)
    }

    // -- Word validation --

    /// Contests a word: opens one ballot per seated player (idempotent
    /// if the word is already contested).
    pub async fn contest_word(
        &self,
        answer_id: AnswerId,
    ) -> Result<Vec<WordValidationVote>, Error> {
        Ok(self.votes.open(answer_id).await?)
    }

    /// Casts this player's ballot; returns the rewritten answer if this
    /// completed the vote.
    pub async fn cast_vote(
        &self,
        answer_id: AnswerId,
        vote: bool,
    ) -> Result<Option<Answer>, Error> {
        Ok(self
            .votes
            .cast_vote(answer_id, self.player_id, vote)
            .await?)
    }

    /// Waits for every ballot and resolves. `None` on the vote ceiling:
    /// the contest is abandoned and the prior verdict stands.
    pub async fn wait_for_vote_resolution(
        &self,
        answer_id: AnswerId,
    ) -> Result<Option<Answer>, Error> {
        Ok(self.votes.wait_for_resolution(answer_id).await?)
    }
}
