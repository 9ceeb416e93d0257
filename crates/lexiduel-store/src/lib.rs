//! Store layer for Lexiduel.
//!
//! The shared store is the only communication substrate between the two
//! clients of a match — there is no game server and no socket. This
//! crate defines:
//!
//! - [`GameStore`] — the store interface: per-table CRUD plus the
//!   conditional-insert operations the consensus protocols rest on.
//! - [`MemoryStore`] — an in-process implementation backed by one
//!   mutex-guarded table set.
//! - [`StoreError`] — typed failures.
//!
//! # Concurrency contract
//!
//! The engine's protocols assume nothing about ordering between the two
//! clients' calls beyond what the store serializes per operation. The
//! operations that carry correctness — create-round-if-absent,
//! insert-once round scores, conditional end-game requests, cast-once
//! votes — must each be atomic inside the store. Everything else is
//! last-write-wins by design.
//!
//! Change notifications ([`GameStore::subscribe`]) are best-effort: a
//! lagged or dropped receiver never affects correctness, because every
//! correctness-bearing wait in the engine polls instead.

#![allow(async_fn_in_trait)]

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{GameStore, NewAnswer, NewRoundScore};
