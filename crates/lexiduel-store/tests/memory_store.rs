//! Integration tests for the in-process store, focused on the
//! concurrency-control primitives the engine's protocols rely on.

use std::sync::Arc;
use std::time::Duration;

use lexiduel_protocol::{
    CategoryId, EndGameStatus, PlayerId, RoomEvent, RoundStatus,
};
use lexiduel_store::{GameStore, MemoryStore, NewAnswer, NewRoundScore, StoreError};

async fn room_with_two_players(
    store: &MemoryStore,
) -> (lexiduel_protocol::Room, PlayerId, PlayerId) {
    let room = store.create_room("ABCD", 2).await.unwrap();
    let host = store.insert_player(room.id, "alice", true).await.unwrap();
    let guest = store.insert_player(room.id, "bruno", false).await.unwrap();
    (room, host.id, guest.id)
}

fn answer_for(
    room_id: lexiduel_protocol::RoomId,
    round_id: lexiduel_protocol::RoundId,
    player_id: PlayerId,
    word: &str,
) -> NewAnswer {
    NewAnswer {
        room_id,
        round_id,
        player_id,
        category_id: CategoryId(1),
        word: word.to_string(),
        is_valid: false,
        points: 0,
        needs_manual_validation: true,
    }
}

// =========================================================================
// Rooms and players
// =========================================================================

#[tokio::test]
async fn test_room_capacity_enforced() {
    let store = MemoryStore::new();
    let (room, _, _) = room_with_two_players(&store).await;

    let result = store.insert_player(room.id, "carla", false).await;
    assert!(matches!(result, Err(StoreError::RoomFull(_))));
}

#[tokio::test]
async fn test_join_rejected_once_playing() {
    let store = MemoryStore::new();
    let (mut room, _, _) = room_with_two_players(&store).await;

    room.status = lexiduel_protocol::RoomStatus::Playing;
    store.update_room(&room).await.unwrap();

    // A seat is free again after a guest leaves, but the room is no
    // longer joinable.
    let players = store.players_in_room(room.id).await.unwrap();
    store.delete_player(players[1].id).await.unwrap();

    let result = store.insert_player(room.id, "carla", false).await;
    assert!(matches!(result, Err(StoreError::RoomNotJoinable(_))));
}

#[tokio::test]
async fn test_room_lookup_by_code() {
    let store = MemoryStore::new();
    let room = store.create_room("XY42", 2).await.unwrap();

    let found = store.room_by_code("XY42").await.unwrap();
    assert_eq!(found.map(|r| r.id), Some(room.id));
    assert!(store.room_by_code("ZZZZ").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_room_cascades() {
    let store = MemoryStore::new();
    let (room, host, guest) = room_with_two_players(&store).await;
    let (round, _) = store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();
    store
        .insert_answer(answer_for(room.id, round.id, host, "banane"))
        .await
        .unwrap();
    store
        .insert_round_score(NewRoundScore {
            round_id: round.id,
            player_id: host,
            round_score: 2,
            valid_words_count: 1,
            stopped_early: false,
            penalty_applied: false,
        })
        .await
        .unwrap();

    store.delete_room(room.id).await.unwrap();

    assert!(matches!(
        store.room(room.id).await,
        Err(StoreError::RoomNotFound(_))
    ));
    assert!(matches!(
        store.player(host).await,
        Err(StoreError::PlayerNotFound(_))
    ));
    assert!(matches!(
        store.player(guest).await,
        Err(StoreError::PlayerNotFound(_))
    ));
    assert!(matches!(
        store.round(round.id).await,
        Err(StoreError::RoundNotFound(_))
    ));
    assert!(store.round_scores(round.id).await.unwrap().is_empty());
    assert!(store.answers_for_round(round.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_stale_rooms_spares_active_ones() {
    let store = MemoryStore::new();
    let (mut playing, _, _) = room_with_two_players(&store).await;
    playing.status = lexiduel_protocol::RoomStatus::Playing;
    store.update_room(&playing).await.unwrap();
    let waiting = store.create_room("WAIT", 2).await.unwrap();

    // max_age zero: every Waiting room is older than the (strict)
    // cutoff once the clock ticks past the creation stamp.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let removed = store
        .delete_stale_rooms(Duration::from_millis(0))
        .await
        .unwrap();

    assert_eq!(removed, 1);
    assert!(matches!(
        store.room(waiting.id).await,
        Err(StoreError::RoomNotFound(_))
    ));
    assert!(store.room(playing.id).await.is_ok());
}

// =========================================================================
// Idempotent round creation
// =========================================================================

#[tokio::test]
async fn test_create_round_if_absent_returns_existing() {
    let store = MemoryStore::new();
    let (room, _, _) = room_with_two_players(&store).await;

    let (first, created) = store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();
    assert!(created);

    let (second, created) = store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn test_concurrent_round_creation_yields_one_playing_round() {
    let store = Arc::new(MemoryStore::new());
    let (room, _, _) = room_with_two_players(&store).await;

    let a = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store.create_round_if_absent(room.id, 2, 'C').await
        })
    };
    let b = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store.create_round_if_absent(room.id, 2, 'C').await
        })
    };

    let (round_a, created_a) = a.await.unwrap().unwrap();
    let (round_b, created_b) = b.await.unwrap().unwrap();

    assert_eq!(round_a.id, round_b.id);
    assert!(created_a ^ created_b, "exactly one side creates the round");

    let playing = store.playing_round(room.id).await.unwrap();
    assert_eq!(playing.map(|r| r.id), Some(round_a.id));
}

#[tokio::test]
async fn test_finish_round_is_idempotent() {
    let store = MemoryStore::new();
    let (room, _, _) = room_with_two_players(&store).await;
    let (round, _) = store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();

    let first = store.finish_round(round.id).await.unwrap();
    let second = store.finish_round(round.id).await.unwrap();
    assert_eq!(first.status, RoundStatus::Finished);
    assert_eq!(second.status, RoundStatus::Finished);

    // Finishing frees the "one playing round per room" slot.
    assert!(store.playing_round(room.id).await.unwrap().is_none());
}

// =========================================================================
// Insert-once constraints
// =========================================================================

#[tokio::test]
async fn test_round_score_unique_per_round_and_player() {
    let store = MemoryStore::new();
    let (room, host, _) = room_with_two_players(&store).await;
    let (round, _) = store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();

    let score = NewRoundScore {
        round_id: round.id,
        player_id: host,
        round_score: 4,
        valid_words_count: 2,
        stopped_early: false,
        penalty_applied: false,
    };
    store.insert_round_score(score.clone()).await.unwrap();

    let result = store.insert_round_score(score).await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));
    assert_eq!(store.round_scores(round.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_answer_unique_per_category() {
    let store = MemoryStore::new();
    let (room, host, _) = room_with_two_players(&store).await;
    let (round, _) = store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();

    store
        .insert_answer(answer_for(room.id, round.id, host, "banane"))
        .await
        .unwrap();
    let result = store
        .insert_answer(answer_for(room.id, round.id, host, "brugnon"))
        .await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));
}

// =========================================================================
// End-game requests
// =========================================================================

#[tokio::test]
async fn test_end_game_request_conditional_insert() {
    let store = MemoryStore::new();
    let (room, host, guest) = room_with_two_players(&store).await;
    let (round, _) = store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();

    let (first, created) = store
        .insert_end_game_request(room.id, round.id, host)
        .await
        .unwrap();
    assert!(created);

    // The opponent racing to request observes the existing row.
    let (second, created) = store
        .insert_end_game_request(room.id, round.id, guest)
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(second.id, first.id);
    assert_eq!(second.requester_player_id, host);
}

#[tokio::test]
async fn test_end_game_request_settles_once() {
    let store = MemoryStore::new();
    let (room, host, _) = room_with_two_players(&store).await;
    let (round, _) = store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();
    let (request, _) = store
        .insert_end_game_request(room.id, round.id, host)
        .await
        .unwrap();

    let settled = store
        .settle_end_game_request(request.id, true)
        .await
        .unwrap();
    assert_eq!(settled.status, EndGameStatus::Accepted);
    assert!(settled.responded_at.is_some());

    let again = store.settle_end_game_request(request.id, false).await;
    assert!(matches!(again, Err(StoreError::Conflict(_))));

    // A settled request no longer blocks a new one.
    assert!(store
        .pending_end_game_request(room.id, round.id)
        .await
        .unwrap()
        .is_none());
    let (_, created) = store
        .insert_end_game_request(room.id, round.id, host)
        .await
        .unwrap();
    assert!(created);
}

// =========================================================================
// Votes
// =========================================================================

#[tokio::test]
async fn test_open_votes_is_idempotent() {
    let store = MemoryStore::new();
    let (room, host, guest) = room_with_two_players(&store).await;
    let (round, _) = store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();
    let answer = store
        .insert_answer(answer_for(room.id, round.id, host, "bixi"))
        .await
        .unwrap();

    let rows = store.open_votes(answer.id, &[host, guest]).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|v| v.vote.is_none()));

    // Both clients may contest the same word; the second open is a read.
    let again = store.open_votes(answer.id, &[host, guest]).await.unwrap();
    assert_eq!(again.len(), 2);
    assert_eq!(
        store.votes_for_answer(answer.id).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_vote_cast_exactly_once() {
    let store = MemoryStore::new();
    let (room, host, guest) = room_with_two_players(&store).await;
    let (round, _) = store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();
    let answer = store
        .insert_answer(answer_for(room.id, round.id, host, "bixi"))
        .await
        .unwrap();
    store.open_votes(answer.id, &[host, guest]).await.unwrap();

    let vote = store.cast_vote(answer.id, host, true).await.unwrap();
    assert_eq!(vote.vote, Some(true));

    let again = store.cast_vote(answer.id, host, false).await;
    assert!(matches!(again, Err(StoreError::Conflict(_))));

    // The first ballot stands.
    let votes = store.votes_for_answer(answer.id).await.unwrap();
    let host_vote = votes.iter().find(|v| v.player_id == host).unwrap();
    assert_eq!(host_vote.vote, Some(true));
}

#[tokio::test]
async fn test_cast_vote_without_open_fails() {
    let store = MemoryStore::new();
    let (room, host, _) = room_with_two_players(&store).await;
    let (round, _) = store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();
    let answer = store
        .insert_answer(answer_for(room.id, round.id, host, "bixi"))
        .await
        .unwrap();

    let result = store.cast_vote(answer.id, host, true).await;
    assert!(matches!(result, Err(StoreError::VoteNotFound(..))));
}

// =========================================================================
// Change notification
// =========================================================================

#[tokio::test]
async fn test_subscribe_receives_player_and_round_events() {
    let store = MemoryStore::new();
    let room = store.create_room("ABCD", 2).await.unwrap();
    let mut events = store.subscribe(room.id);

    let host = store.insert_player(room.id, "alice", true).await.unwrap();
    store.insert_player(room.id, "bruno", false).await.unwrap();
    store
        .create_round_if_absent(room.id, 1, 'B')
        .await
        .unwrap();
    store.mark_player_finished(host.id, 2).await.unwrap();

    let event = events.try_recv().unwrap();
    assert!(matches!(event, RoomEvent::PlayerJoined { ref player } if player.id == host.id));
    assert!(matches!(
        events.try_recv().unwrap(),
        RoomEvent::PlayerJoined { .. }
    ));
    assert!(matches!(
        events.try_recv().unwrap(),
        RoomEvent::RoundCreated { .. }
    ));
    assert!(matches!(
        events.try_recv().unwrap(),
        RoomEvent::PlayerFinished { .. }
    ));
}

#[tokio::test]
async fn test_room_deletion_notifies_subscribers() {
    let store = MemoryStore::new();
    let room = store.create_room("ABCD", 2).await.unwrap();
    let mut events = store.subscribe(room.id);

    store.delete_room(room.id).await.unwrap();

    assert!(matches!(
        events.try_recv().unwrap(),
        RoomEvent::RoomDeleted { .. }
    ));
}
