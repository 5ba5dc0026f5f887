use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use crate::core::UserPair;
use crate::models::{Block, Dislike, Like, Match, Message};
use crate::services::store::{PairTransaction, PurgeSummary, RelationshipStore, StoreError};

/// PostgreSQL-backed relationship store
///
/// Uniqueness of likes, dislikes, blocks and matches is backed by table
/// constraints (see `migrations/`). Writers on the same pair are serialised
/// with a transaction-scoped advisory lock keyed by [`UserPair::lock_key`].
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Wrap an existing pool; migrations are assumed to be applied
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationshipStore for PostgresStore {
    type Transaction = PostgresTransaction;

    async fn begin(&self, pair: UserPair) -> Result<PostgresTransaction, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(pair.lock_key())
            .execute(&mut *tx)
            .await?;

        Ok(PostgresTransaction { tx })
    }

    async fn find_match(&self, match_id: Uuid) -> Result<Option<Match>, StoreError> {
        let query = r#"
            SELECT id, user1_id, user2_id, created_at, expire_at
            FROM matches
            WHERE id = $1
        "#;

        let found = sqlx::query_as::<_, Match>(query)
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found)
    }

    async fn list_matches(&self, user_id: Uuid) -> Result<Vec<Match>, StoreError> {
        let query = r#"
            SELECT id, user1_id, user2_id, created_at, expire_at
            FROM matches
            WHERE user1_id = $1 OR user2_id = $1
            ORDER BY created_at DESC
        "#;

        let matches = sqlx::query_as::<_, Match>(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("User {} has {} matches", user_id, matches.len());

        Ok(matches)
    }

    async fn list_blocks(&self, user_id: Uuid) -> Result<Vec<Block>, StoreError> {
        let query = r#"
            SELECT id, user_id, blocked_id, reason, created_at
            FROM blocks
            WHERE user_id = $1
            ORDER BY created_at DESC
        "#;

        let blocks = sqlx::query_as::<_, Block>(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(blocks)
    }

    async fn list_messages(&self, pair: UserPair) -> Result<Vec<Message>, StoreError> {
        let query = r#"
            SELECT id, sender_id, receiver_id, content, created_at, seen, deleted
            FROM messages
            WHERE ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1))
              AND deleted = FALSE
            ORDER BY created_at ASC, id ASC
        "#;

        let messages = sqlx::query_as::<_, Message>(query)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_all(&self.pool)
            .await?;

        Ok(messages)
    }

    async fn list_exclusions(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let query = r#"
            SELECT target_id AS excluded_id FROM likes WHERE user_id = $1
            UNION
            SELECT target_id FROM dislikes WHERE user_id = $1
            UNION
            SELECT blocked_id FROM blocks WHERE user_id = $1
            UNION
            SELECT user_id FROM blocks WHERE blocked_id = $1
            ORDER BY excluded_id
        "#;

        let ids: Vec<Uuid> = sqlx::query_scalar(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    async fn all_likes(&self) -> Result<Vec<Like>, StoreError> {
        let likes = sqlx::query_as::<_, Like>(
            "SELECT id, user_id, target_id, created_at, matched FROM likes ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(likes)
    }

    async fn all_matches(&self) -> Result<Vec<Match>, StoreError> {
        let matches = sqlx::query_as::<_, Match>(
            "SELECT id, user1_id, user2_id, created_at, expire_at FROM matches ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(matches)
    }

    async fn all_blocks(&self) -> Result<Vec<Block>, StoreError> {
        let blocks = sqlx::query_as::<_, Block>(
            "SELECT id, user_id, blocked_id, reason, created_at FROM blocks ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(blocks)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("TRUNCATE messages, matches, likes, dislikes, blocks")
            .execute(&self.pool)
            .await?;

        tracing::warn!("Cleared all interaction tables");

        Ok(())
    }
}

/// Open transaction holding the advisory lock for one pair
///
/// The lock and every write are released or rolled back when the underlying
/// sqlx transaction is dropped without commit.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PairTransaction for PostgresTransaction {
    async fn find_like(&mut self, user_id: Uuid, target_id: Uuid) -> Result<Option<Like>, StoreError> {
        let query = r#"
            SELECT id, user_id, target_id, created_at, matched
            FROM likes
            WHERE user_id = $1 AND target_id = $2
        "#;

        let like = sqlx::query_as::<_, Like>(query)
            .bind(user_id)
            .bind(target_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(like)
    }

    async fn find_dislike(
        &mut self,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<Option<Dislike>, StoreError> {
        let query = r#"
            SELECT id, user_id, target_id, created_at
            FROM dislikes
            WHERE user_id = $1 AND target_id = $2
        "#;

        let dislike = sqlx::query_as::<_, Dislike>(query)
            .bind(user_id)
            .bind(target_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(dislike)
    }

    async fn find_block(&mut self, user_id: Uuid, blocked_id: Uuid) -> Result<Option<Block>, StoreError> {
        let query = r#"
            SELECT id, user_id, blocked_id, reason, created_at
            FROM blocks
            WHERE user_id = $1 AND blocked_id = $2
        "#;

        let block = sqlx::query_as::<_, Block>(query)
            .bind(user_id)
            .bind(blocked_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(block)
    }

    async fn find_block_between(&mut self, a: Uuid, b: Uuid) -> Result<Option<Block>, StoreError> {
        let query = r#"
            SELECT id, user_id, blocked_id, reason, created_at
            FROM blocks
            WHERE (user_id = $1 AND blocked_id = $2) OR (user_id = $2 AND blocked_id = $1)
            LIMIT 1
        "#;

        let block = sqlx::query_as::<_, Block>(query)
            .bind(a)
            .bind(b)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(block)
    }

    async fn find_match(&mut self, match_id: Uuid) -> Result<Option<Match>, StoreError> {
        let query = r#"
            SELECT id, user1_id, user2_id, created_at, expire_at
            FROM matches
            WHERE id = $1
        "#;

        let found = sqlx::query_as::<_, Match>(query)
            .bind(match_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(found)
    }

    async fn find_match_for_pair(&mut self, pair: UserPair) -> Result<Option<Match>, StoreError> {
        let query = r#"
            SELECT id, user1_id, user2_id, created_at, expire_at
            FROM matches
            WHERE user1_id = $1 AND user2_id = $2
        "#;

        let found = sqlx::query_as::<_, Match>(query)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(found)
    }

    async fn insert_like(&mut self, like: &Like) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO likes (id, user_id, target_id, created_at, matched)
            VALUES ($1, $2, $3, $4, $5)
        "#;

        sqlx::query(query)
            .bind(like.id)
            .bind(like.user_id)
            .bind(like.target_id)
            .bind(like.created_at)
            .bind(like.matched)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn mark_like_matched(&mut self, like_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE likes SET matched = TRUE WHERE id = $1")
            .bind(like_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn insert_dislike(&mut self, dislike: &Dislike) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO dislikes (id, user_id, target_id, created_at)
            VALUES ($1, $2, $3, $4)
        "#;

        sqlx::query(query)
            .bind(dislike.id)
            .bind(dislike.user_id)
            .bind(dislike.target_id)
            .bind(dislike.created_at)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn insert_match(&mut self, m: &Match) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO matches (id, user1_id, user2_id, created_at, expire_at)
            VALUES ($1, $2, $3, $4, $5)
        "#;

        sqlx::query(query)
            .bind(m.id)
            .bind(m.user1_id)
            .bind(m.user2_id)
            .bind(m.created_at)
            .bind(m.expire_at)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn insert_message(&mut self, message: &Message) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO messages (id, sender_id, receiver_id, content, created_at, seen, deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#;

        sqlx::query(query)
            .bind(message.id)
            .bind(message.sender_id)
            .bind(message.receiver_id)
            .bind(&message.content)
            .bind(message.created_at)
            .bind(message.seen)
            .bind(message.deleted)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn insert_block(&mut self, block: &Block) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO blocks (id, user_id, blocked_id, reason, created_at)
            VALUES ($1, $2, $3, $4, $5)
        "#;

        sqlx::query(query)
            .bind(block.id)
            .bind(block.user_id)
            .bind(block.blocked_id)
            .bind(&block.reason)
            .bind(block.created_at)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn purge_pair(&mut self, pair: UserPair) -> Result<PurgeSummary, StoreError> {
        let (a, b) = (pair.low(), pair.high());

        let likes = sqlx::query(
            "DELETE FROM likes WHERE (user_id = $1 AND target_id = $2) OR (user_id = $2 AND target_id = $1)",
        )
        .bind(a)
        .bind(b)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        let dislikes = sqlx::query(
            "DELETE FROM dislikes WHERE (user_id = $1 AND target_id = $2) OR (user_id = $2 AND target_id = $1)",
        )
        .bind(a)
        .bind(b)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        let matches = sqlx::query(
            "DELETE FROM matches WHERE (user1_id = $1 AND user2_id = $2) OR (user1_id = $2 AND user2_id = $1)",
        )
        .bind(a)
        .bind(b)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        let messages = sqlx::query(
            "DELETE FROM messages WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1)",
        )
        .bind(a)
        .bind(b)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        Ok(PurgeSummary {
            likes,
            dislikes,
            matches,
            messages,
        })
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
