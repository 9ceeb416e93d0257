//! Shared data model for Lexiduel.
//!
//! This crate defines every record that lives in the shared store and the
//! change events the store publishes about them:
//!
//! - **Identifiers** ([`RoomId`], [`PlayerId`], [`RoundId`], …) —
//!   newtype wrappers allocated by the store.
//! - **Records** ([`Room`], [`Player`], [`Round`], [`Answer`],
//!   [`RoundScore`], [`EndGameRequest`], [`WordValidationVote`]) —
//!   the rows both clients converge on.
//! - **Events** ([`RoomEvent`]) — best-effort change notifications,
//!   one closed enum covering every table.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about storage or polling. It only
//! defines the shapes that the store persists and the engine reasons
//! about:
//!
//! ```text
//! Store (rows) → Protocol (records + events) → Engine (state machines)
//! ```

mod events;
mod types;

pub use events::RoomEvent;
pub use types::{
    now_millis, Answer, AnswerId, CategoryId, EndGameRequest, EndGameStatus,
    GameMode, Player, PlayerId, RequestId, Room, RoomId, RoomStatus, Round,
    RoundId, RoundScore, RoundStatus, VoteId, WordValidationVote,
};
