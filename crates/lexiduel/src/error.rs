//! Unified error type for the Lexiduel meta-crate.

use lexiduel_engine::EngineError;
use lexiduel_store::StoreError;

/// Top-level error that wraps the layer-specific errors.
///
/// When using the `lexiduel` meta-crate, callers deal with this single
/// type; the `#[from]` attributes let `?` convert layer errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The session has no round in play — the match hasn't started, or
    /// the previous round ended and the next one isn't open yet.
    #[error("no round is in play")]
    NoActiveRound,

    /// An engine-level failure (joinability, submit-once, votes, …).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A store-level failure reaching the caller directly.
    #[error(transparent)]
    Store(#[from] StoreError),
}
