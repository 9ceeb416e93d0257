//! The early end-of-round handshake.
//!
//! A player who wants to stop before the timer proposes it instead of
//! unilaterally penalizing the opponent. The request is a conditional
//! insert (one Pending per room and round), the response settles it
//! exactly once, and acceptance means *both* sides submit with
//! `stopped_early = false` — mutual agreement clears the voluntary-stop
//! penalty condition.

use std::sync::Arc;

use lexiduel_protocol::{
    EndGameRequest, EndGameStatus, PlayerId, RequestId, RoomId, RoundId,
};
use lexiduel_store::{GameStore, StoreError};

use crate::sync::{attempts_for, poll_until};
use crate::{EngineError, GameConfig};

/// The request/accept/reject protocol for ending a round early.
pub struct EndGameConsensus<S> {
    store: Arc<S>,
    config: GameConfig,
}

impl<S: GameStore> EndGameConsensus<S> {
    /// Creates the protocol over the shared store.
    pub fn new(store: Arc<S>, config: GameConfig) -> Self {
        Self { store, config }
    }

    /// Proposes ending the round.
    ///
    /// Conditional: if a Pending request already exists for this
    /// (room, round) — including one the opponent raced in — the caller
    /// observes that request as success rather than erroring.
    pub async fn request(
        &self,
        room_id: RoomId,
        round_id: RoundId,
        requester: PlayerId,
    ) -> Result<EndGameRequest, EngineError> {
        let (request, created) = self
            .store
            .insert_end_game_request(room_id, round_id, requester)
            .await?;
        if !created {
            tracing::debug!(
                %room_id,
                %round_id,
                request_id = %request.id,
                "end-game request already pending, observing it"
            );
        }
        Ok(request)
    }

    /// Accepts or rejects a pending request. Settling is one-shot; a
    /// second response fails with
    /// [`EngineError::RequestAlreadySettled`].
    pub async fn respond(
        &self,
        request_id: RequestId,
        accept: bool,
    ) -> Result<EndGameRequest, EngineError> {
        self.store
            .settle_end_game_request(request_id, accept)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    EngineError::RequestAlreadySettled(request_id)
                }
                other => EngineError::Store(other),
            })
    }

    /// Polls for the opponent's answer until the response ceiling.
    ///
    /// `Ok(None)` means the request expired client-side: the row stays
    /// Pending in the store, which is harmless — a later request
    /// observes it instead of duplicating it.
    pub async fn wait_for_response(
        &self,
        request_id: RequestId,
    ) -> Result<Option<EndGameStatus>, EngineError> {
        let interval = self.config.response_poll_interval;
        let attempts = attempts_for(self.config.response_timeout, interval);

        let store = Arc::clone(&self.store);
        let settled = poll_until(
            move || {
                let store = Arc::clone(&store);
                async move {
                    let request = store.end_game_request(request_id).await?;
                    Ok::<_, EngineError>(
                        request.status.is_settled().then_some(request.status),
                    )
                }
            },
            interval,
            attempts,
        )
        .await?;

        if settled.is_none() {
            tracing::info!(
                %request_id,
                "end-game request expired without a response"
            );
        }
        Ok(settled)
    }

    /// Checks for a request raised by the *other* player. Pure read —
    /// the playing side polls this on its request interval.
    pub async fn incoming_request(
        &self,
        room_id: RoomId,
        round_id: RoundId,
        self_id: PlayerId,
    ) -> Result<Option<EndGameRequest>, EngineError> {
        let pending = self
            .store
            .pending_end_game_request(room_id, round_id)
            .await?;
        Ok(pending.filter(|r| r.requester_player_id != self_id))
    }
}
