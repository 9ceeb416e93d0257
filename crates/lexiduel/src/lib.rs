//! # Lexiduel
//!
//! Engine for a two-player word-category duel ("a word starting with B
//! for every category") played through a shared store — no dedicated
//! game server. Both clients run this engine independently and converge
//! through idempotent writes, insert-once rows, and bounded polling,
//! with explicit consensus for the two decisions that need agreement:
//! ending a round early, and overturning the dictionary on a contested
//! word.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lexiduel::{GameConfig, GameSession, MemoryStore, StaticDictionary};
//!
//! # async fn run() -> Result<(), lexiduel::Error> {
//! let store = Arc::new(MemoryStore::new());
//! let dict = Arc::new(StaticDictionary::new());
//!
//! let mut host = GameSession::create_room(
//!     Arc::clone(&store),
//!     Arc::clone(&dict),
//!     GameConfig::default(),
//!     "alice",
//! )
//! .await?;
//!
//! // The opponent joins with the room code, the host starts, both
//! // submit, advance, and vote through their own sessions.
//! let round = host.start_game().await?;
//! println!("round 1 letter: {}", round.letter);
//! # Ok(())
//! # }
//! ```

mod error;
mod session;

pub use error::Error;
pub use session::GameSession;

pub use lexiduel_engine::{
    letters, normalize_word, scoring, sync, AnswerInput, Category,
    Dictionary, DictionaryError, EndGameConsensus, EngineError, GameConfig,
    RoomRegistry, RoundController, StaticDictionary, SubmittedRound,
    WordValidationConsensus,
};
pub use lexiduel_protocol::{
    Answer, AnswerId, CategoryId, EndGameRequest, EndGameStatus, GameMode,
    Player, PlayerId, RequestId, Room, RoomEvent, RoomId, RoomStatus, Round,
    RoundId, RoundScore, RoundStatus, VoteId, WordValidationVote,
};
pub use lexiduel_store::{
    GameStore, MemoryStore, NewAnswer, NewRoundScore, StoreError,
};
