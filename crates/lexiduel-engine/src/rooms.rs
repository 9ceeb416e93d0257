//! Room registry: create, join, leave, start, finish.
//!
//! Membership rules: at most `max_players` players, exactly one host.
//! The host's leave deletes the room (and everything in it); a guest's
//! leave removes only their row. Room codes are short and human-
//! shareable; collisions are accepted low-probability noise rather than
//! retried away.

use std::sync::Arc;

use lexiduel_protocol::{
    now_millis, Player, PlayerId, Room, RoomId, RoomStatus,
};
use lexiduel_store::{GameStore, StoreError};
use rand::Rng;

use crate::{EngineError, GameConfig};

/// Room-code symbols: no `0`/`O`/`1`/`I`, which read ambiguously when
/// shouted across a table.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a join code.
const ROOM_CODE_LEN: usize = 4;

/// Room membership and lifecycle operations.
pub struct RoomRegistry<S> {
    store: Arc<S>,
    config: GameConfig,
}

impl<S: GameStore> RoomRegistry<S> {
    /// Creates a registry over the shared store.
    pub fn new(store: Arc<S>, config: GameConfig) -> Self {
        Self { store, config }
    }

    /// Creates a room and seats the host in it.
    pub async fn create_room(
        &self,
        host_name: &str,
    ) -> Result<(Room, Player), EngineError> {
        let code = generate_room_code();
        let room = self
            .store
            .create_room(&code, self.config.max_players)
            .await?;
        let host = self.store.insert_player(room.id, host_name, true).await?;
        Ok((room, host))
    }

    /// Joins an existing room by code.
    ///
    /// Fails with [`EngineError::RoomNotJoinable`] when no Waiting room
    /// carries the code or all seats are taken.
    pub async fn join_room(
        &self,
        code: &str,
        display_name: &str,
    ) -> Result<(Room, Player), EngineError> {
        let not_joinable = || EngineError::RoomNotJoinable {
            code: code.to_string(),
        };

        let room = self
            .store
            .room_by_code(code)
            .await?
            .ok_or_else(not_joinable)?;
        if !room.status.is_joinable() {
            return Err(not_joinable());
        }

        let player = self
            .store
            .insert_player(room.id, display_name, false)
            .await
            .map_err(|e| match e {
                StoreError::RoomFull(_) | StoreError::RoomNotJoinable(_) => {
                    not_joinable()
                }
                other => EngineError::Store(other),
            })?;
        Ok((room, player))
    }

    /// Leaves a room. The host leaving tears the whole room down; a
    /// guest leaving frees their seat.
    pub async fn leave_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<(), EngineError> {
        let player = self.store.player(player_id).await?;
        if player.is_host {
            tracing::info!(%room_id, %player_id, "host left, deleting room");
            self.store.delete_room(room_id).await?;
        } else {
            self.store.delete_player(player_id).await?;
        }
        Ok(())
    }

    /// Starts the match once the opponent has joined.
    ///
    /// Idempotent when already Playing (both clients can observe the
    /// transition without racing it).
    pub async fn start_game(
        &self,
        room_id: RoomId,
    ) -> Result<Room, EngineError> {
        let mut room = self.store.room(room_id).await?;
        match room.status {
            RoomStatus::Playing => return Ok(room),
            RoomStatus::Finished => {
                return Err(EngineError::MatchFinished(room_id));
            }
            RoomStatus::Waiting => {}
        }

        let players = self.store.players_in_room(room_id).await?;
        if players.len() < 2 {
            return Err(EngineError::NotEnoughPlayers(room_id));
        }

        room.status = RoomStatus::Playing;
        room.started_at = Some(now_millis());
        self.store.update_room(&room).await?;
        tracing::info!(%room_id, players = players.len(), "match started");
        Ok(room)
    }

    /// Ends the match.
    pub async fn finish_game(
        &self,
        room_id: RoomId,
    ) -> Result<Room, EngineError> {
        let mut room = self.store.room(room_id).await?;
        if room.status == RoomStatus::Finished {
            return Ok(room);
        }
        room.status = RoomStatus::Finished;
        room.finished_at = Some(now_millis());
        self.store.update_room(&room).await?;
        tracing::info!(%room_id, "match finished");
        Ok(room)
    }

    /// All players currently seated in the room, host first.
    pub async fn players(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Player>, EngineError> {
        Ok(self.store.players_in_room(room_id).await?)
    }

    /// Housekeeping: removes Waiting rooms abandoned longer than the
    /// configured age. Returns how many were deleted.
    pub async fn cleanup_stale_rooms(&self) -> Result<usize, EngineError> {
        Ok(self
            .store
            .delete_stale_rooms(self.config.stale_room_age)
            .await?)
    }
}

/// Draws a 4-character join code.
fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            ROOM_CODE_ALPHABET[idx] as char
        })
        .collect()
}
