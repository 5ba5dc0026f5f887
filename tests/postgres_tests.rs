// Tests for the Postgres store; they need a database.
//
// Run with: DATABASE_URL=postgres://... cargo test --test postgres_tests -- --ignored

use lume_interactions::core::{InteractionEngine, InteractionError};
use lume_interactions::services::{PairTransaction, PostgresStore, RelationshipStore, StoreError};
use lume_interactions::{Like, Match, UserPair};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use uuid::Uuid;

async fn setup() -> (InteractionEngine<PostgresStore>, Arc<PostgresStore>) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let store = Arc::new(PostgresStore::from_pool(pool));
    (InteractionEngine::new(store.clone()), store)
}

// Rows from other tests share the database, so only look at this pair
async fn likes_between(store: &PostgresStore, pair: UserPair) -> Vec<Like> {
    store
        .all_likes()
        .await
        .unwrap()
        .into_iter()
        .filter(|l| pair.is(l.user_id, l.target_id))
        .collect()
}

async fn matches_between(store: &PostgresStore, pair: UserPair) -> Vec<Match> {
    store
        .all_matches()
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.pair() == pair)
        .collect()
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_duplicate_like_is_unique_violation() {
    let (_, store) = setup().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    let mut tx = store.begin(UserPair::new(a, b)).await.unwrap();
    tx.insert_like(&Like::new(a, b)).await.unwrap();

    match tx.insert_like(&Like::new(a, b)).await {
        Err(StoreError::Conflict(constraint)) => assert_eq!(constraint, "likes_user_target_key"),
        other => panic!("Expected unique violation, got {:?}", other),
    }
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_match_rows_must_be_canonical() {
    let (_, store) = setup().await;
    let pair = UserPair::new(Uuid::new_v4(), Uuid::new_v4());

    let mut reversed = Match::new(pair);
    std::mem::swap(&mut reversed.user1_id, &mut reversed.user2_id);

    let mut tx = store.begin(pair).await.unwrap();
    let result = tx.insert_match(&reversed).await;
    assert!(matches!(result, Err(StoreError::Database(_))), "got {:?}", result);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_uncommitted_transaction_rolls_back() {
    let (_, store) = setup().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    {
        let mut tx = store.begin(UserPair::new(a, b)).await.unwrap();
        tx.insert_like(&Like::new(a, b)).await.unwrap();
    }

    assert!(likes_between(&store, UserPair::new(a, b)).await.is_empty());
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL
async fn test_block_removes_all_prior_interactions() {
    let (engine, store) = setup().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let pair = UserPair::new(a, b);

    engine.record_like(a, b).await.unwrap();
    assert!(engine.record_like(b, a).await.unwrap().matched);
    let match_id = matches_between(&store, pair).await[0].id;
    engine.send_message(a, match_id, "hi".to_string()).await.unwrap();
    engine.send_message(b, match_id, "hello".to_string()).await.unwrap();

    engine.record_block(a, b, Some("spam".to_string())).await.unwrap();

    assert!(likes_between(&store, pair).await.is_empty());
    assert!(matches_between(&store, pair).await.is_empty());
    assert!(store.list_messages(pair).await.unwrap().is_empty());
    assert_eq!(engine.list_blocks(a).await.unwrap().len(), 1);
    assert!(matches!(engine.record_like(b, a).await, Err(InteractionError::Blocked)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires DATABASE_URL
async fn test_concurrent_reciprocal_likes_create_one_match() {
    let (engine, store) = setup().await;

    for _ in 0..20 {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let left = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.record_like(a, b).await })
        };
        let right = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.record_like(b, a).await })
        };

        let left = left.await.unwrap().unwrap();
        let right = right.await.unwrap().unwrap();

        let pair = UserPair::new(a, b);
        assert!(left.matched ^ right.matched);
        assert_eq!(matches_between(&store, pair).await.len(), 1);
        assert!(likes_between(&store, pair).await.iter().all(|l| l.matched));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires DATABASE_URL
async fn test_block_racing_with_like_leaves_no_like() {
    let (engine, store) = setup().await;

    for _ in 0..20 {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let like = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.record_like(a, b).await })
        };
        let block = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.record_block(b, a, None).await })
        };

        let like = like.await.unwrap();
        block.await.unwrap().unwrap();

        if let Err(e) = like {
            assert!(matches!(e, InteractionError::Blocked));
        }
        assert!(likes_between(&store, UserPair::new(a, b)).await.is_empty());
    }
}
