//! A scripted two-player match, both clients in one process.
//!
//! Two `GameSession`s share a `MemoryStore` and play two rounds: round
//! one ends through the mutual end-game handshake and a contested-word
//! vote, round two through the opponent-finished cutoff. Run with
//! `RUST_LOG=info` (or `debug` for the polling internals).

use std::sync::Arc;
use std::time::Duration;

use lexiduel::{
    letters::ALPHABET, AnswerInput, CategoryId, EndGameStatus, EngineError,
    Error, GameConfig, GameSession, MemoryStore, StaticDictionary,
    StoreError,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const FRUIT: CategoryId = CategoryId(1);
const ANIMAL: CategoryId = CategoryId(2);
const CITY: CategoryId = CategoryId(3);

type Session = GameSession<MemoryStore, StaticDictionary>;

/// One plausible word per letter and category, so the demo works for
/// whichever letters the rotator draws.
fn dictionary() -> StaticDictionary {
    let mut fruits = Vec::new();
    let mut animals = Vec::new();
    let mut cities = Vec::new();
    for letter in ALPHABET {
        fruits.push(format!("{letter}anana"));
        animals.push(format!("{letter}ison"));
        cities.push(format!("{letter}ordeaux"));
    }
    let fruit_refs: Vec<&str> = fruits.iter().map(String::as_str).collect();
    let animal_refs: Vec<&str> = animals.iter().map(String::as_str).collect();
    let city_refs: Vec<&str> = cities.iter().map(String::as_str).collect();

    StaticDictionary::new()
        .with_category(FRUIT, "Fruit", &fruit_refs)
        .with_category(ANIMAL, "Animal", &animal_refs)
        .with_category(CITY, "Ville", &city_refs)
}

fn grid(letter: char, fruit_known: bool) -> Vec<AnswerInput> {
    let fruit = if fruit_known {
        format!("{letter}anana")
    } else {
        format!("{letter}ixi")
    };
    vec![
        AnswerInput {
            category_id: FRUIT,
            word: fruit,
        },
        AnswerInput {
            category_id: ANIMAL,
            word: format!("{letter}ison"),
        },
        AnswerInput {
            category_id: CITY,
            word: format!("{letter}ordeaux"),
        },
    ]
}

/// Polling shrunk so the scripted match finishes in about a second.
fn demo_config() -> GameConfig {
    GameConfig {
        opponent_poll_interval: Duration::from_millis(20),
        barrier_poll_interval: Duration::from_millis(20),
        response_poll_interval: Duration::from_millis(20),
        request_poll_interval: Duration::from_millis(20),
        vote_poll_interval: Duration::from_millis(20),
        auto_submit_grace: Duration::from_millis(50),
        ..GameConfig::default()
    }
}

async fn host_side(mut session: Session) -> Result<Session, Error> {
    // Round 1: the host fills the grid with one dubious fruit, then
    // proposes ending early.
    let round = session.start_game().await?;
    info!(letter = %round.letter, "round 1 started");

    let status = session.request_end_game().await?;
    info!(?status, "end-game request settled");
    assert_eq!(status, Some(EndGameStatus::Accepted));

    // Accepted: submit without the early-stop flag.
    let letter = round.letter;
    let submitted = session
        .submit_answers(&grid(letter, false), false)
        .await?;
    info!(score = submitted.score.round_score, "host round 1 submitted");

    session.wait_for_opponent(Duration::from_secs(5)).await?;

    // Contest the rejected fruit and vote for it.
    let contested = submitted
        .answers
        .iter()
        .find(|a| a.needs_manual_validation)
        .expect("the unknown fruit is contestable")
        .clone();
    session.contest_word(contested.id).await?;
    session.cast_vote(contested.id, true).await?;
    let resolved = session.wait_for_vote_resolution(contested.id).await?;
    info!(
        word = %contested.word,
        verdict = ?resolved.as_ref().map(|a| a.is_valid),
        "contested word settled"
    );

    // Round 2: play to the cutoff instead.
    let round = session
        .advance_round()
        .await?
        .expect("both players ready");
    info!(letter = %round.letter, "round 2 started");
    let submitted = session
        .submit_answers(&grid(round.letter, true), false)
        .await?;
    info!(score = submitted.score.round_score, "host round 2 submitted");

    session.wait_for_opponent(Duration::from_secs(5)).await?;
    session.finish_game().await?;
    Ok(session)
}

async fn guest_side(mut session: Session) -> Result<Session, Error> {
    let round = session
        .wait_for_game_start(Duration::from_secs(5))
        .await?;
    let letter = round.letter;

    // Accept the host's end-game proposal as soon as it shows up.
    loop {
        if let Some(request) = session.incoming_end_game_request().await? {
            session.respond_to_end_game(request.id, true).await?;
            info!("accepted the end-game request");
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let submitted = session
        .submit_answers(&grid(letter, true), false)
        .await?;
    info!(score = submitted.score.round_score, "guest round 1 submitted");

    // Cast the deciding ballot once the host opens the vote.
    let contested = loop {
        let (answers, _) = session.round_results().await?;
        if let Some(answer) = answers
            .iter()
            .find(|a| a.needs_manual_validation && a.player_id != session.player_id())
        {
            break answer.clone();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    };
    // The ballot rows appear when the host opens the vote; retry until
    // they do.
    loop {
        match session.cast_vote(contested.id, true).await {
            Ok(_) => {
                info!(word = %contested.word, "voted to allow the word");
                break;
            }
            Err(Error::Engine(EngineError::Store(
                StoreError::VoteNotFound(..),
            ))) => {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Err(e) => return Err(e),
        }
    }

    // Round 2: type half a grid, get cut off by the host finishing.
    let round = session
        .advance_round()
        .await?
        .expect("both players ready");
    let drafts = vec![AnswerInput {
        category_id: FRUIT,
        word: format!("{}anana", round.letter),
    }];
    loop {
        if let Some(submitted) =
            session.auto_submit_on_opponent_finish(&drafts).await?
        {
            info!(
                score = submitted.score.round_score,
                "guest auto-submitted after the host finished"
            );
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    Ok(session)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = Arc::new(MemoryStore::new());
    let dict = Arc::new(dictionary());

    let host = GameSession::create_room(
        Arc::clone(&store),
        Arc::clone(&dict),
        demo_config(),
        "alice",
    )
    .await?;
    let code = host.room().await?.code;
    info!(%code, "room open");

    let guest = GameSession::join_room(
        Arc::clone(&store),
        Arc::clone(&dict),
        demo_config(),
        &code,
        "bruno",
    )
    .await?;

    let host_task = tokio::spawn(host_side(host));
    let guest_task = tokio::spawn(guest_side(guest));

    let host = host_task.await.expect("host task")?;
    let guest = guest_task.await.expect("guest task")?;

    // Final standings from the store's authoritative rows.
    for player in host.players().await? {
        info!(
            name = %player.display_name,
            last_round_score = player.score,
            "final standing"
        );
    }

    guest.leave().await?;
    host.leave().await?;
    Ok(())
}
