use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::core::UserPair;
use crate::models::{Block, Dislike, Like, Match, Message};
use crate::services::store::{PairTransaction, PurgeSummary, RelationshipStore, StoreError};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    likes: Vec<Like>,
    dislikes: Vec<Dislike>,
    matches: Vec<Match>,
    messages: Vec<Message>,
    blocks: Vec<Block>,
}

/// In-process relationship store
///
/// Applies the same uniqueness rules as the Postgres schema. A transaction
/// holds the store-wide lock and works on a private copy of the state that
/// replaces the shared state only on commit, so an abandoned transaction
/// leaves no trace.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_next_purge: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test support: make the next `purge_pair` fail with `StoreError::Unavailable`
    ///
    /// Fault injection for exercising block cascade rollback. Not for use by
    /// the running service.
    #[doc(hidden)]
    pub fn fail_next_purge(&self) {
        self.fail_next_purge.store(true, Ordering::SeqCst);
    }

    /// Mark a message as soft-deleted
    pub async fn soft_delete_message(&self, message_id: Uuid) -> bool {
        let mut state = self.state.lock().await;
        match state.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                message.deleted = true;
                true
            }
            None => false,
        }
    }

    /// Number of rows per relation: (likes, dislikes, matches, messages, blocks)
    pub async fn row_counts(&self) -> (usize, usize, usize, usize, usize) {
        let state = self.state.lock().await;
        (
            state.likes.len(),
            state.dislikes.len(),
            state.matches.len(),
            state.messages.len(),
            state.blocks.len(),
        )
    }
}

#[async_trait]
impl RelationshipStore for InMemoryStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self, pair: UserPair) -> Result<InMemoryTransaction, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();

        tracing::trace!("Opened in-memory transaction for pair {}", pair);

        Ok(InMemoryTransaction {
            guard,
            working,
            fail_next_purge: self.fail_next_purge.clone(),
        })
    }

    async fn find_match(&self, match_id: Uuid) -> Result<Option<Match>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.matches.iter().find(|m| m.id == match_id).cloned())
    }

    async fn list_matches(&self, user_id: Uuid) -> Result<Vec<Match>, StoreError> {
        let state = self.state.lock().await;
        let mut matches: Vec<Match> = state
            .matches
            .iter()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn list_blocks(&self, user_id: Uuid) -> Result<Vec<Block>, StoreError> {
        let state = self.state.lock().await;
        let mut blocks: Vec<Block> = state
            .blocks
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        blocks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(blocks)
    }

    async fn list_messages(&self, pair: UserPair) -> Result<Vec<Message>, StoreError> {
        let state = self.state.lock().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| !m.deleted && pair.is(m.sender_id, m.receiver_id))
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn list_exclusions(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let state = self.state.lock().await;
        let mut excluded = BTreeSet::new();

        excluded.extend(state.likes.iter().filter(|l| l.user_id == user_id).map(|l| l.target_id));
        excluded.extend(state.dislikes.iter().filter(|d| d.user_id == user_id).map(|d| d.target_id));
        for block in &state.blocks {
            if block.user_id == user_id {
                excluded.insert(block.blocked_id);
            } else if block.blocked_id == user_id {
                excluded.insert(block.user_id);
            }
        }

        Ok(excluded.into_iter().collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }

    async fn all_likes(&self) -> Result<Vec<Like>, StoreError> {
        Ok(self.state.lock().await.likes.clone())
    }

    async fn all_matches(&self) -> Result<Vec<Match>, StoreError> {
        Ok(self.state.lock().await.matches.clone())
    }

    async fn all_blocks(&self) -> Result<Vec<Block>, StoreError> {
        Ok(self.state.lock().await.blocks.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.state.lock().await = MemoryState::default();
        Ok(())
    }
}

/// Transaction over the in-memory store
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_next_purge: Arc<AtomicBool>,
}

#[async_trait]
impl PairTransaction for InMemoryTransaction {
    async fn find_like(&mut self, user_id: Uuid, target_id: Uuid) -> Result<Option<Like>, StoreError> {
        Ok(self
            .working
            .likes
            .iter()
            .find(|l| l.user_id == user_id && l.target_id == target_id)
            .cloned())
    }

    async fn find_dislike(
        &mut self,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<Option<Dislike>, StoreError> {
        Ok(self
            .working
            .dislikes
            .iter()
            .find(|d| d.user_id == user_id && d.target_id == target_id)
            .cloned())
    }

    async fn find_block(&mut self, user_id: Uuid, blocked_id: Uuid) -> Result<Option<Block>, StoreError> {
        Ok(self
            .working
            .blocks
            .iter()
            .find(|b| b.user_id == user_id && b.blocked_id == blocked_id)
            .cloned())
    }

    async fn find_block_between(&mut self, a: Uuid, b: Uuid) -> Result<Option<Block>, StoreError> {
        let pair = UserPair::new(a, b);
        Ok(self
            .working
            .blocks
            .iter()
            .find(|block| pair.is(block.user_id, block.blocked_id))
            .cloned())
    }

    async fn find_match(&mut self, match_id: Uuid) -> Result<Option<Match>, StoreError> {
        Ok(self.working.matches.iter().find(|m| m.id == match_id).cloned())
    }

    async fn find_match_for_pair(&mut self, pair: UserPair) -> Result<Option<Match>, StoreError> {
        Ok(self.working.matches.iter().find(|m| m.pair() == pair).cloned())
    }

    async fn insert_like(&mut self, like: &Like) -> Result<(), StoreError> {
        if self
            .working
            .likes
            .iter()
            .any(|l| l.user_id == like.user_id && l.target_id == like.target_id)
        {
            return Err(StoreError::Conflict("likes_user_target_key".to_string()));
        }
        self.working.likes.push(like.clone());
        Ok(())
    }

    async fn mark_like_matched(&mut self, like_id: Uuid) -> Result<(), StoreError> {
        if let Some(like) = self.working.likes.iter_mut().find(|l| l.id == like_id) {
            like.matched = true;
        }
        Ok(())
    }

    async fn insert_dislike(&mut self, dislike: &Dislike) -> Result<(), StoreError> {
        if self
            .working
            .dislikes
            .iter()
            .any(|d| d.user_id == dislike.user_id && d.target_id == dislike.target_id)
        {
            return Err(StoreError::Conflict("dislikes_user_target_key".to_string()));
        }
        self.working.dislikes.push(dislike.clone());
        Ok(())
    }

    async fn insert_match(&mut self, m: &Match) -> Result<(), StoreError> {
        let pair = m.pair();
        if self.working.matches.iter().any(|existing| existing.pair() == pair) {
            return Err(StoreError::Conflict("matches_pair_key".to_string()));
        }
        self.working.matches.push(m.clone());
        Ok(())
    }

    async fn insert_message(&mut self, message: &Message) -> Result<(), StoreError> {
        self.working.messages.push(message.clone());
        Ok(())
    }

    async fn insert_block(&mut self, block: &Block) -> Result<(), StoreError> {
        if self
            .working
            .blocks
            .iter()
            .any(|b| b.user_id == block.user_id && b.blocked_id == block.blocked_id)
        {
            return Err(StoreError::Conflict("blocks_user_blocked_key".to_string()));
        }
        self.working.blocks.push(block.clone());
        Ok(())
    }

    async fn purge_pair(&mut self, pair: UserPair) -> Result<PurgeSummary, StoreError> {
        if self.fail_next_purge.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected purge failure".to_string()));
        }

        let state = &mut self.working;

        let before = state.likes.len();
        state.likes.retain(|l| !pair.is(l.user_id, l.target_id));
        let likes = (before - state.likes.len()) as u64;

        let before = state.dislikes.len();
        state.dislikes.retain(|d| !pair.is(d.user_id, d.target_id));
        let dislikes = (before - state.dislikes.len()) as u64;

        let before = state.matches.len();
        state.matches.retain(|m| m.pair() != pair);
        let matches = (before - state.matches.len()) as u64;

        let before = state.messages.len();
        state.messages.retain(|m| !pair.is(m.sender_id, m.receiver_id));
        let messages = (before - state.messages.len()) as u64;

        Ok(PurgeSummary {
            likes,
            dislikes,
            matches,
            messages,
        })
    }

    async fn commit(self) -> Result<(), StoreError> {
        let InMemoryTransaction {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }
}
