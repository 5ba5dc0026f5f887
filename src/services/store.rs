use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::UserPair;
use crate::models::{Block, Dislike, Like, Match, Message};

/// Errors raised by a relationship store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::Conflict(constraint);
            }
        }
        StoreError::Database(err)
    }
}

/// Rows removed by a block cascade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeSummary {
    pub likes: u64,
    pub dislikes: u64,
    pub matches: u64,
    pub messages: u64,
}

/// Durable home of likes, dislikes, matches, messages and blocks
///
/// Every write goes through a [`PairTransaction`] opened with [`begin`],
/// which serialises writers touching the same unordered pair. Reads that
/// only list rows go straight to the store.
///
/// [`begin`]: RelationshipStore::begin
#[async_trait]
pub trait RelationshipStore: Send + Sync + 'static {
    type Transaction: PairTransaction;

    /// Open a unit of work for `pair`
    async fn begin(&self, pair: UserPair) -> Result<Self::Transaction, StoreError>;

    async fn find_match(&self, match_id: Uuid) -> Result<Option<Match>, StoreError>;

    /// All matches `user_id` is a member of
    async fn list_matches(&self, user_id: Uuid) -> Result<Vec<Match>, StoreError>;

    /// Blocks placed by `user_id`
    async fn list_blocks(&self, user_id: Uuid) -> Result<Vec<Block>, StoreError>;

    /// Non-deleted messages exchanged within `pair`, oldest first
    async fn list_messages(&self, pair: UserPair) -> Result<Vec<Message>, StoreError>;

    /// Users `user_id` liked, disliked or blocked, and users who blocked `user_id`
    async fn list_exclusions(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;

    async fn all_likes(&self) -> Result<Vec<Like>, StoreError>;

    async fn all_matches(&self) -> Result<Vec<Match>, StoreError>;

    async fn all_blocks(&self) -> Result<Vec<Block>, StoreError>;

    /// Delete every row of every relation
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Writes scoped to one unordered pair
///
/// Dropping the transaction without calling [`commit`] discards every write
/// made through it.
///
/// [`commit`]: PairTransaction::commit
#[async_trait]
pub trait PairTransaction: Send {
    async fn find_like(&mut self, user_id: Uuid, target_id: Uuid) -> Result<Option<Like>, StoreError>;

    async fn find_dislike(
        &mut self,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<Option<Dislike>, StoreError>;

    /// Block placed by `user_id` on `blocked_id` (directional)
    async fn find_block(&mut self, user_id: Uuid, blocked_id: Uuid) -> Result<Option<Block>, StoreError>;

    /// Any block between `a` and `b`, in either direction
    async fn find_block_between(&mut self, a: Uuid, b: Uuid) -> Result<Option<Block>, StoreError>;

    async fn find_match(&mut self, match_id: Uuid) -> Result<Option<Match>, StoreError>;

    async fn find_match_for_pair(&mut self, pair: UserPair) -> Result<Option<Match>, StoreError>;

    async fn insert_like(&mut self, like: &Like) -> Result<(), StoreError>;

    async fn mark_like_matched(&mut self, like_id: Uuid) -> Result<(), StoreError>;

    async fn insert_dislike(&mut self, dislike: &Dislike) -> Result<(), StoreError>;

    async fn insert_match(&mut self, m: &Match) -> Result<(), StoreError>;

    async fn insert_message(&mut self, message: &Message) -> Result<(), StoreError>;

    async fn insert_block(&mut self, block: &Block) -> Result<(), StoreError>;

    /// Delete likes, dislikes, matches and messages between the pair's members
    async fn purge_pair(&mut self, pair: UserPair) -> Result<PurgeSummary, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}
