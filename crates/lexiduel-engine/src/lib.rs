//! Game engine for Lexiduel.
//!
//! Two independent clients of a match run this engine against one shared
//! store. There is no server-side arbiter: every protocol here is safe
//! under concurrent, duplicate, and out-of-order observation, built from
//! three primitives — idempotent creates, conditional inserts, and
//! insert-once rows — plus bounded polling to observe the other side.
//!
//! # Components
//!
//! - [`scoring`] — word validity/points and the round penalty rule
//! - [`letters`] — non-repeating letter draw per room
//! - [`RoomRegistry`] — room create/join/leave/start/finish
//! - [`RoundController`] — round creation, submission, the both-ready
//!   barrier for advancing
//! - [`EndGameConsensus`] — request/accept/reject handshake to end a
//!   round early
//! - [`WordValidationConsensus`] — unanimous voting on contested words
//! - [`sync`] — the bounded poller everything above waits with
//! - [`Dictionary`] — the word-lookup collaborator (async, fallible,
//!   degrades to manual validation)

#![allow(async_fn_in_trait)]

mod config;
mod dictionary;
mod endgame;
mod error;
mod rooms;
mod rounds;
mod votes;

pub mod letters;
pub mod scoring;
pub mod sync;

pub use config::GameConfig;
pub use dictionary::{
    normalize_word, Category, Dictionary, DictionaryError, StaticDictionary,
};
pub use endgame::EndGameConsensus;
pub use error::EngineError;
pub use rooms::RoomRegistry;
pub use rounds::{AnswerInput, RoundController, SubmittedRound};
pub use votes::WordValidationConsensus;
