use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{InteractionError, Signal};
use crate::core::pair::UserPair;
use crate::models::{Block, Dislike, Like, Match, Message};
use crate::services::{PairTransaction, RelationshipStore};

/// Stateless rules for likes, dislikes, matches, messages and blocks
///
/// Every operation checks its preconditions and writes inside one
/// [`PairTransaction`]; a rejected operation returns before anything is
/// written and the transaction is dropped uncommitted.
pub struct InteractionEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for InteractionEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RelationshipStore> InteractionEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Record that `actor` likes `target`, creating a match if `target`
    /// already likes `actor`
    ///
    /// Returns the new like with its final `matched` flag.
    pub async fn record_like(&self, actor: Uuid, target: Uuid) -> Result<Like, InteractionError> {
        ensure_distinct(actor, target)?;

        let pair = UserPair::new(actor, target);
        let mut tx = self.store.begin(pair).await?;

        ensure_not_blocked(&mut tx, actor, target).await?;
        if tx.find_like(actor, target).await?.is_some() {
            tracing::debug!("Rejected like {} -> {}: already liked", actor, target);
            return Err(InteractionError::Duplicate(Signal::Like));
        }
        if tx.find_dislike(actor, target).await?.is_some() {
            tracing::debug!("Rejected like {} -> {}: already disliked", actor, target);
            return Err(InteractionError::ConflictingSignal {
                attempted: Signal::Like,
                existing: Signal::Dislike,
            });
        }

        let mut like = Like::new(actor, target);
        let reciprocal = tx.find_like(target, actor).await?;

        if let Some(reciprocal) = &reciprocal {
            like.matched = true;
            if !reciprocal.matched {
                tx.mark_like_matched(reciprocal.id).await?;
            }
        }

        tx.insert_like(&like)
            .await
            .map_err(|e| InteractionError::from_insert(e, Signal::Like))?;

        let mut created_match = None;
        if reciprocal.is_some() && tx.find_match_for_pair(pair).await?.is_none() {
            let m = Match::new(pair);
            tx.insert_match(&m).await?;
            created_match = Some(m.id);
        }

        tx.commit().await?;

        match created_match {
            Some(match_id) => tracing::info!("Like {} -> {} created match {}", actor, target, match_id),
            None => tracing::info!("Recorded like {} -> {}", actor, target),
        }

        Ok(like)
    }

    /// Record that `actor` dislikes `target`
    ///
    /// Only the `actor -> target` direction is checked; `target` may still
    /// like `actor`.
    pub async fn record_dislike(&self, actor: Uuid, target: Uuid) -> Result<Dislike, InteractionError> {
        ensure_distinct(actor, target)?;

        let mut tx = self.store.begin(UserPair::new(actor, target)).await?;

        ensure_not_blocked(&mut tx, actor, target).await?;
        if tx.find_dislike(actor, target).await?.is_some() {
            tracing::debug!("Rejected dislike {} -> {}: already disliked", actor, target);
            return Err(InteractionError::Duplicate(Signal::Dislike));
        }
        if tx.find_like(actor, target).await?.is_some() {
            tracing::debug!("Rejected dislike {} -> {}: already liked", actor, target);
            return Err(InteractionError::ConflictingSignal {
                attempted: Signal::Dislike,
                existing: Signal::Like,
            });
        }

        let dislike = Dislike::new(actor, target);
        tx.insert_dislike(&dislike)
            .await
            .map_err(|e| InteractionError::from_insert(e, Signal::Dislike))?;
        tx.commit().await?;

        tracing::info!("Recorded dislike {} -> {}", actor, target);

        Ok(dislike)
    }

    /// Block `blocked` on behalf of `actor` and erase every like, dislike,
    /// match and message between them
    ///
    /// The block and the cleanup commit together or not at all. A block in the
    /// opposite direction does not prevent this one.
    pub async fn record_block(
        &self,
        actor: Uuid,
        blocked: Uuid,
        reason: Option<String>,
    ) -> Result<Block, InteractionError> {
        ensure_distinct(actor, blocked)?;

        let pair = UserPair::new(actor, blocked);
        let mut tx = self.store.begin(pair).await?;

        if tx.find_block(actor, blocked).await?.is_some() {
            tracing::debug!("Rejected block {} -> {}: already blocked", actor, blocked);
            return Err(InteractionError::Duplicate(Signal::Block));
        }

        let block = Block::new(actor, blocked, reason);
        tx.insert_block(&block)
            .await
            .map_err(|e| InteractionError::from_insert(e, Signal::Block))?;
        let purged = tx.purge_pair(pair).await?;
        tx.commit().await?;

        tracing::info!(
            "Recorded block {} -> {} (removed {} likes, {} dislikes, {} matches, {} messages)",
            actor,
            blocked,
            purged.likes,
            purged.dislikes,
            purged.matches,
            purged.messages
        );

        Ok(block)
    }

    /// Send `content` from `actor` to the other member of `match_id`
    ///
    /// Membership is re-read under the pair lock, so a match removed by a
    /// concurrent block is reported as `NotParticipant`.
    pub async fn send_message(
        &self,
        actor: Uuid,
        match_id: Uuid,
        content: String,
    ) -> Result<Message, InteractionError> {
        let m = self.member_match(actor, match_id).await?;
        let pair = m.pair();
        let mut tx = self.store.begin(pair).await?;

        let other = tx
            .find_match(match_id)
            .await?
            .and_then(|m| m.other_member(actor))
            .ok_or(InteractionError::NotParticipant)?;

        ensure_not_blocked(&mut tx, actor, other).await?;

        let message = Message::new(actor, other, content);
        tx.insert_message(&message).await?;
        tx.commit().await?;

        tracing::info!("Message {} sent {} -> {} on match {}", message.id, actor, other, match_id);

        Ok(message)
    }

    /// Non-deleted messages of `match_id`, oldest first
    pub async fn list_messages(&self, actor: Uuid, match_id: Uuid) -> Result<Vec<Message>, InteractionError> {
        let m = self.member_match(actor, match_id).await?;
        Ok(self.store.list_messages(m.pair()).await?)
    }

    /// Matches `actor` belongs to
    pub async fn list_matches(&self, actor: Uuid) -> Result<Vec<Match>, InteractionError> {
        Ok(self.store.list_matches(actor).await?)
    }

    /// Blocks placed by `actor`; blocks placed on `actor` are not included
    pub async fn list_blocks(&self, actor: Uuid) -> Result<Vec<Block>, InteractionError> {
        Ok(self.store.list_blocks(actor).await?)
    }

    /// Users `actor` has liked, disliked or blocked, plus users who blocked
    /// `actor`, sorted and de-duplicated
    pub async fn list_exclusions(&self, actor: Uuid) -> Result<Vec<Uuid>, InteractionError> {
        let mut ids = self.store.list_exclusions(actor).await?;
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// The match `match_id` if `actor` is a member. A missing match and a
    /// foreign match are indistinguishable to the caller.
    async fn member_match(&self, actor: Uuid, match_id: Uuid) -> Result<Match, InteractionError> {
        self.store
            .find_match(match_id)
            .await?
            .filter(|m| m.involves(actor))
            .ok_or(InteractionError::NotParticipant)
    }
}

#[inline]
fn ensure_distinct(actor: Uuid, target: Uuid) -> Result<(), InteractionError> {
    if actor == target {
        tracing::debug!("Rejected self-targeted interaction by {}", actor);
        return Err(InteractionError::SelfTarget);
    }
    Ok(())
}

async fn ensure_not_blocked<T: PairTransaction>(
    tx: &mut T,
    actor: Uuid,
    target: Uuid,
) -> Result<(), InteractionError> {
    if tx.find_block_between(actor, target).await?.is_some() {
        tracing::debug!("Rejected interaction {} -> {}: blocked", actor, target);
        return Err(InteractionError::Blocked);
    }
    Ok(())
}
