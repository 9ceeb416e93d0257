//! In-process [`GameStore`] implementation.
//!
//! One mutex over all tables, never held across an await point. Every
//! trait method does its reads, checks, and writes inside a single
//! critical section, which is what makes the conditional inserts
//! actually conditional — two tasks racing through
//! `create_round_if_absent` serialize on the lock and exactly one of
//! them inserts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use lexiduel_protocol::{
    now_millis, Answer, AnswerId, EndGameRequest, EndGameStatus, Player,
    PlayerId, RequestId, Room, RoomEvent, RoomId, RoomStatus, Round, RoundId,
    RoundScore, RoundStatus, VoteId, WordValidationVote,
};
use tokio::sync::broadcast;

use crate::{GameStore, NewAnswer, NewRoundScore, StoreError};

/// Capacity of each room's event channel. Slow subscribers lag and lose
/// events, which is acceptable — events are not load-bearing.
const EVENT_CHANNEL_SIZE: usize = 64;

#[derive(Default)]
struct Tables {
    rooms: HashMap<RoomId, Room>,
    players: HashMap<PlayerId, Player>,
    rounds: HashMap<RoundId, Round>,
    answers: HashMap<AnswerId, Answer>,
    /// Keyed by the uniqueness constraint itself: one score per
    /// (round, player), enforced by the map.
    round_scores: HashMap<(RoundId, PlayerId), RoundScore>,
    requests: HashMap<RequestId, EndGameRequest>,
    votes: HashMap<VoteId, WordValidationVote>,
    /// Per-room event channels, created lazily on first subscribe.
    channels: HashMap<RoomId, broadcast::Sender<RoomEvent>>,
}

impl Tables {
    /// Publishes an event to the owning room's channel, if anyone is
    /// listening. Send failures (no receivers) are ignored.
    fn publish(&self, event: RoomEvent) {
        if let Some(sender) = self.channels.get(&event.room_id()) {
            let _ = sender.send(event);
        }
    }
}

/// An in-process store: the shared tables both clients read and write.
///
/// Cheap to share — callers wrap it in an `Arc` and hand clones to each
/// session.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("store mutex poisoned")
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl GameStore for MemoryStore {
    // -- Rooms --

    async fn create_room(
        &self,
        code: &str,
        max_players: usize,
    ) -> Result<Room, StoreError> {
        let room = Room {
            id: RoomId(self.next_id()),
            code: code.to_string(),
            letter: None,
            status: RoomStatus::Waiting,
            max_players,
            used_letters: Vec::new(),
            current_round_number: 0,
            created_at: now_millis(),
            started_at: None,
            finished_at: None,
        };

        let mut tables = self.lock();
        tables.rooms.insert(room.id, room.clone());
        tracing::info!(room_id = %room.id, code = %room.code, "room created");
        Ok(room)
    }

    async fn room(&self, room_id: RoomId) -> Result<Room, StoreError> {
        self.lock()
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or(StoreError::RoomNotFound(room_id))
    }

    async fn room_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Room>, StoreError> {
        Ok(self
            .lock()
            .rooms
            .values()
            .find(|r| r.code == code)
            .cloned())
    }

    async fn update_room(&self, room: &Room) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let previous = tables
            .rooms
            .get(&room.id)
            .ok_or(StoreError::RoomNotFound(room.id))?
            .status;

        tables.rooms.insert(room.id, room.clone());

        if previous == RoomStatus::Waiting && room.status == RoomStatus::Playing
        {
            tables.publish(RoomEvent::GameStarted { room: room.clone() });
        }
        Ok(())
    }

    async fn delete_room(&self, room_id: RoomId) -> Result<(), StoreError> {
        let mut tables = self.lock();
        if tables.rooms.remove(&room_id).is_none() {
            return Err(StoreError::RoomNotFound(room_id));
        }

        let round_ids: Vec<RoundId> = tables
            .rounds
            .values()
            .filter(|r| r.room_id == room_id)
            .map(|r| r.id)
            .collect();

        tables.players.retain(|_, p| p.room_id != room_id);
        tables.rounds.retain(|_, r| r.room_id != room_id);
        tables.answers.retain(|_, a| a.room_id != room_id);
        tables
            .round_scores
            .retain(|(round_id, _), _| !round_ids.contains(round_id));
        tables.requests.retain(|_, r| r.room_id != room_id);
        tables.votes.retain(|_, v| v.room_id != room_id);

        tables.publish(RoomEvent::RoomDeleted { room_id });
        tables.channels.remove(&room_id);

        tracing::info!(%room_id, "room deleted");
        Ok(())
    }

    async fn delete_stale_rooms(
        &self,
        max_age: Duration,
    ) -> Result<usize, StoreError> {
        let cutoff = now_millis().saturating_sub(max_age.as_millis() as u64);
        let stale: Vec<RoomId> = self
            .lock()
            .rooms
            .values()
            .filter(|r| {
                r.status == RoomStatus::Waiting && r.created_at < cutoff
            })
            .map(|r| r.id)
            .collect();

        for room_id in &stale {
            self.delete_room(*room_id).await?;
        }
        if !stale.is_empty() {
            tracing::info!(count = stale.len(), "stale rooms removed");
        }
        Ok(stale.len())
    }

    // -- Players --

    async fn insert_player(
        &self,
        room_id: RoomId,
        display_name: &str,
        is_host: bool,
    ) -> Result<Player, StoreError> {
        let player = Player {
            id: PlayerId(self.next_id()),
            room_id,
            display_name: display_name.to_string(),
            is_host,
            score: 0,
            finished_at: None,
            ready_for_next_round: false,
            joined_at: now_millis(),
        };

        let mut tables = self.lock();
        let room = tables
            .rooms
            .get(&room_id)
            .ok_or(StoreError::RoomNotFound(room_id))?;
        if !room.status.is_joinable() {
            return Err(StoreError::RoomNotJoinable(room_id));
        }
        let occupied = tables
            .players
            .values()
            .filter(|p| p.room_id == room_id)
            .count();
        if occupied >= room.max_players {
            return Err(StoreError::RoomFull(room_id));
        }

        tables.players.insert(player.id, player.clone());
        tables.publish(RoomEvent::PlayerJoined {
            player: player.clone(),
        });
        tracing::info!(
            %room_id,
            player_id = %player.id,
            name = %player.display_name,
            host = is_host,
            "player joined"
        );
        Ok(player)
    }

    async fn player(&self, player_id: PlayerId) -> Result<Player, StoreError> {
        self.lock()
            .players
            .get(&player_id)
            .cloned()
            .ok_or(StoreError::PlayerNotFound(player_id))
    }

    async fn players_in_room(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Player>, StoreError> {
        let mut players: Vec<Player> = self
            .lock()
            .players
            .values()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect();
        players.sort_by_key(|p| (p.joined_at, p.id));
        Ok(players)
    }

    async fn mark_player_finished(
        &self,
        player_id: PlayerId,
        score: u32,
    ) -> Result<Player, StoreError> {
        let mut tables = self.lock();
        let player = tables
            .players
            .get_mut(&player_id)
            .ok_or(StoreError::PlayerNotFound(player_id))?;
        player.score = score;
        player.finished_at = Some(now_millis());
        let player = player.clone();

        tables.publish(RoomEvent::PlayerFinished {
            player: player.clone(),
        });
        Ok(player)
    }

    async fn set_player_ready(
        &self,
        player_id: PlayerId,
        ready: bool,
    ) -> Result<Player, StoreError> {
        let mut tables = self.lock();
        let player = tables
            .players
            .get_mut(&player_id)
            .ok_or(StoreError::PlayerNotFound(player_id))?;
        player.ready_for_next_round = ready;
        let player = player.clone();

        if ready {
            tables.publish(RoomEvent::PlayerReady {
                room_id: player.room_id,
                player_id,
            });
        }
        Ok(player)
    }

    async fn reset_player_round_state(
        &self,
        player_id: PlayerId,
    ) -> Result<Player, StoreError> {
        let mut tables = self.lock();
        let player = tables
            .players
            .get_mut(&player_id)
            .ok_or(StoreError::PlayerNotFound(player_id))?;
        player.finished_at = None;
        player.ready_for_next_round = false;
        Ok(player.clone())
    }

    async fn delete_player(
        &self,
        player_id: PlayerId,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let player = tables
            .players
            .remove(&player_id)
            .ok_or(StoreError::PlayerNotFound(player_id))?;

        tables.publish(RoomEvent::PlayerLeft {
            room_id: player.room_id,
            player_id,
        });
        tracing::info!(room_id = %player.room_id, %player_id, "player left");
        Ok(())
    }

    // -- Rounds --

    async fn create_round_if_absent(
        &self,
        room_id: RoomId,
        round_number: u32,
        letter: char,
    ) -> Result<(Round, bool), StoreError> {
        let id = RoundId(self.next_id());

        let mut tables = self.lock();
        if !tables.rooms.contains_key(&room_id) {
            return Err(StoreError::RoomNotFound(room_id));
        }

        if let Some(existing) = tables
            .rounds
            .values()
            .find(|r| r.room_id == room_id && r.status == RoundStatus::Playing)
        {
            tracing::debug!(
                %room_id,
                round_id = %existing.id,
                "round already in play, duplicate create suppressed"
            );
            return Ok((existing.clone(), false));
        }

        let round = Round {
            id,
            room_id,
            round_number,
            letter,
            status: RoundStatus::Playing,
            created_at: now_millis(),
        };
        tables.rounds.insert(round.id, round.clone());
        tables.publish(RoomEvent::RoundCreated {
            round: round.clone(),
        });
        tracing::info!(
            %room_id,
            round_id = %round.id,
            number = round_number,
            letter = %letter,
            "round created"
        );
        Ok((round, true))
    }

    async fn round(&self, round_id: RoundId) -> Result<Round, StoreError> {
        self.lock()
            .rounds
            .get(&round_id)
            .cloned()
            .ok_or(StoreError::RoundNotFound(round_id))
    }

    async fn playing_round(
        &self,
        room_id: RoomId,
    ) -> Result<Option<Round>, StoreError> {
        Ok(self
            .lock()
            .rounds
            .values()
            .find(|r| r.room_id == room_id && r.status == RoundStatus::Playing)
            .cloned())
    }

    async fn round_by_number(
        &self,
        room_id: RoomId,
        round_number: u32,
    ) -> Result<Option<Round>, StoreError> {
        Ok(self
            .lock()
            .rounds
            .values()
            .find(|r| r.room_id == room_id && r.round_number == round_number)
            .cloned())
    }

    async fn finish_round(
        &self,
        round_id: RoundId,
    ) -> Result<Round, StoreError> {
        let mut tables = self.lock();
        let round = tables
            .rounds
            .get_mut(&round_id)
            .ok_or(StoreError::RoundNotFound(round_id))?;

        if round.status == RoundStatus::Finished {
            return Ok(round.clone());
        }
        round.status = RoundStatus::Finished;
        let round = round.clone();

        tables.publish(RoomEvent::RoundFinished {
            room_id: round.room_id,
            round_id,
        });
        tracing::info!(room_id = %round.room_id, %round_id, "round finished");
        Ok(round)
    }

    // -- Answers --

    async fn insert_answer(
        &self,
        new: NewAnswer,
    ) -> Result<Answer, StoreError> {
        let id = AnswerId(self.next_id());

        let mut tables = self.lock();
        let duplicate = tables.answers.values().any(|a| {
            a.round_id == new.round_id
                && a.player_id == new.player_id
                && a.category_id == new.category_id
        });
        if duplicate {
            return Err(StoreError::Conflict(
                "answer already submitted for this category",
            ));
        }

        let answer = Answer {
            id,
            room_id: new.room_id,
            round_id: new.round_id,
            player_id: new.player_id,
            category_id: new.category_id,
            word: new.word,
            is_valid: new.is_valid,
            points: new.points,
            needs_manual_validation: new.needs_manual_validation,
            manual_validation_result: None,
            submitted_at: now_millis(),
        };
        tables.answers.insert(answer.id, answer.clone());
        tables.publish(RoomEvent::AnswerSubmitted {
            answer: answer.clone(),
        });
        Ok(answer)
    }

    async fn answer(
        &self,
        answer_id: AnswerId,
    ) -> Result<Answer, StoreError> {
        self.lock()
            .answers
            .get(&answer_id)
            .cloned()
            .ok_or(StoreError::AnswerNotFound(answer_id))
    }

    async fn answers_for_round(
        &self,
        round_id: RoundId,
    ) -> Result<Vec<Answer>, StoreError> {
        let mut answers: Vec<Answer> = self
            .lock()
            .answers
            .values()
            .filter(|a| a.round_id == round_id)
            .cloned()
            .collect();
        answers.sort_by_key(|a| (a.submitted_at, a.id));
        Ok(answers)
    }

    async fn player_answers(
        &self,
        round_id: RoundId,
        player_id: PlayerId,
    ) -> Result<Vec<Answer>, StoreError> {
        let mut answers: Vec<Answer> = self
            .lock()
            .answers
            .values()
            .filter(|a| a.round_id == round_id && a.player_id == player_id)
            .cloned()
            .collect();
        answers.sort_by_key(|a| a.category_id);
        Ok(answers)
    }

    async fn update_answer(&self, answer: &Answer) -> Result<(), StoreError> {
        let mut tables = self.lock();
        if !tables.answers.contains_key(&answer.id) {
            return Err(StoreError::AnswerNotFound(answer.id));
        }
        tables.answers.insert(answer.id, answer.clone());
        tables.publish(RoomEvent::AnswerRevalidated {
            answer: answer.clone(),
        });
        Ok(())
    }

    // -- Round scores --

    async fn insert_round_score(
        &self,
        new: NewRoundScore,
    ) -> Result<RoundScore, StoreError> {
        let mut tables = self.lock();
        let key = (new.round_id, new.player_id);
        if tables.round_scores.contains_key(&key) {
            return Err(StoreError::Conflict("round score already submitted"));
        }

        let score = RoundScore {
            round_id: new.round_id,
            player_id: new.player_id,
            round_score: new.round_score,
            valid_words_count: new.valid_words_count,
            stopped_early: new.stopped_early,
            penalty_applied: new.penalty_applied,
            finished_at: now_millis(),
        };
        tables.round_scores.insert(key, score.clone());
        tracing::info!(
            round_id = %score.round_id,
            player_id = %score.player_id,
            score = score.round_score,
            "round score submitted"
        );
        Ok(score)
    }

    async fn round_scores(
        &self,
        round_id: RoundId,
    ) -> Result<Vec<RoundScore>, StoreError> {
        let mut scores: Vec<RoundScore> = self
            .lock()
            .round_scores
            .values()
            .filter(|s| s.round_id == round_id)
            .cloned()
            .collect();
        scores.sort_by_key(|s| (s.finished_at, s.player_id));
        Ok(scores)
    }

    async fn update_round_score(
        &self,
        score: &RoundScore,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let key = (score.round_id, score.player_id);
        if !tables.round_scores.contains_key(&key) {
            return Err(StoreError::Conflict(
                "no round score to update for this player",
            ));
        }
        tables.round_scores.insert(key, score.clone());
        Ok(())
    }

    // -- End-game requests --

    async fn insert_end_game_request(
        &self,
        room_id: RoomId,
        round_id: RoundId,
        requester: PlayerId,
    ) -> Result<(EndGameRequest, bool), StoreError> {
        let id = RequestId(self.next_id());

        let mut tables = self.lock();
        if let Some(existing) = tables.requests.values().find(|r| {
            r.room_id == room_id
                && r.round_id == round_id
                && r.status == EndGameStatus::Pending
        }) {
            return Ok((existing.clone(), false));
        }

        let request = EndGameRequest {
            id,
            room_id,
            round_id,
            requester_player_id: requester,
            status: EndGameStatus::Pending,
            created_at: now_millis(),
            responded_at: None,
        };
        tables.requests.insert(request.id, request.clone());
        tables.publish(RoomEvent::EndGameRequested {
            request: request.clone(),
        });
        tracing::info!(
            %room_id,
            %round_id,
            requester = %requester,
            "end-game request created"
        );
        Ok((request, true))
    }

    async fn end_game_request(
        &self,
        request_id: RequestId,
    ) -> Result<EndGameRequest, StoreError> {
        self.lock()
            .requests
            .get(&request_id)
            .cloned()
            .ok_or(StoreError::RequestNotFound(request_id))
    }

    async fn pending_end_game_request(
        &self,
        room_id: RoomId,
        round_id: RoundId,
    ) -> Result<Option<EndGameRequest>, StoreError> {
        Ok(self
            .lock()
            .requests
            .values()
            .find(|r| {
                r.room_id == room_id
                    && r.round_id == round_id
                    && r.status == EndGameStatus::Pending
            })
            .cloned())
    }

    async fn settle_end_game_request(
        &self,
        request_id: RequestId,
        accept: bool,
    ) -> Result<EndGameRequest, StoreError> {
        let mut tables = self.lock();
        let request = tables
            .requests
            .get_mut(&request_id)
            .ok_or(StoreError::RequestNotFound(request_id))?;

        if request.status.is_settled() {
            return Err(StoreError::Conflict(
                "end-game request already settled",
            ));
        }
        request.status = if accept {
            EndGameStatus::Accepted
        } else {
            EndGameStatus::Rejected
        };
        request.responded_at = Some(now_millis());
        let request = request.clone();

        tables.publish(RoomEvent::EndGameResponded {
            request: request.clone(),
        });
        tracing::info!(
            %request_id,
            status = %request.status,
            "end-game request settled"
        );
        Ok(request)
    }

    // -- Word-validation votes --

    async fn open_votes(
        &self,
        answer_id: AnswerId,
        voters: &[PlayerId],
    ) -> Result<Vec<WordValidationVote>, StoreError> {
        let mut tables = self.lock();
        let answer = tables
            .answers
            .get(&answer_id)
            .cloned()
            .ok_or(StoreError::AnswerNotFound(answer_id))?;

        let existing: Vec<WordValidationVote> = tables
            .votes
            .values()
            .filter(|v| v.answer_id == answer_id)
            .cloned()
            .collect();
        if !existing.is_empty() {
            return Ok(existing);
        }

        let mut rows = Vec::with_capacity(voters.len());
        for voter in voters {
            let vote = WordValidationVote {
                id: VoteId(self.next_id()),
                room_id: answer.room_id,
                round_id: answer.round_id,
                answer_id,
                player_id: *voter,
                vote: None,
            };
            tables.votes.insert(vote.id, vote.clone());
            rows.push(vote);
        }
        tables.publish(RoomEvent::VoteOpened {
            room_id: answer.room_id,
            answer_id,
        });
        tracing::info!(
            room_id = %answer.room_id,
            %answer_id,
            voters = voters.len(),
            "vote opened on contested answer"
        );
        Ok(rows)
    }

    async fn votes_for_answer(
        &self,
        answer_id: AnswerId,
    ) -> Result<Vec<WordValidationVote>, StoreError> {
        let mut votes: Vec<WordValidationVote> = self
            .lock()
            .votes
            .values()
            .filter(|v| v.answer_id == answer_id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| v.id);
        Ok(votes)
    }

    async fn cast_vote(
        &self,
        answer_id: AnswerId,
        player_id: PlayerId,
        vote: bool,
    ) -> Result<WordValidationVote, StoreError> {
        let mut tables = self.lock();
        let row = tables
            .votes
            .values_mut()
            .find(|v| v.answer_id == answer_id && v.player_id == player_id)
            .ok_or(StoreError::VoteNotFound(answer_id, player_id))?;

        if row.vote.is_some() {
            return Err(StoreError::Conflict("vote already cast"));
        }
        row.vote = Some(vote);
        let row = row.clone();

        tables.publish(RoomEvent::VoteCast { vote: row.clone() });
        tracing::info!(%answer_id, %player_id, vote, "vote cast");
        Ok(row)
    }

    // -- Change notification --

    fn subscribe(&self, room_id: RoomId) -> broadcast::Receiver<RoomEvent> {
        let mut tables = self.lock();
        tables
            .channels
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(EVENT_CHANNEL_SIZE).0)
            .subscribe()
    }
}
