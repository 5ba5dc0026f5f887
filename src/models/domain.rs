use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::UserPair;

/// `user_id` expressing interest in `target_id`
///
/// `matched` flips to true on both sides once the reciprocal like exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub matched: bool,
}

impl Like {
    pub fn new(user_id: Uuid, target_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            target_id,
            created_at: Utc::now(),
            matched: false,
        }
    }
}

/// `user_id` rejecting `target_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Dislike {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Dislike {
    pub fn new(user_id: Uuid, target_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            target_id,
            created_at: Utc::now(),
        }
    }
}

/// Mutual match between two users
///
/// Membership is a set: `user1_id`/`user2_id` carry no ordering meaning.
/// Rows are written canonicalised (`user1_id < user2_id`) so the store can
/// enforce one match per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn new(pair: UserPair) -> Self {
        Self {
            id: Uuid::new_v4(),
            user1_id: pair.low(),
            user2_id: pair.high(),
            created_at: Utc::now(),
            expire_at: None,
        }
    }

    pub fn pair(&self) -> UserPair {
        UserPair::new(self.user1_id, self.user2_id)
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The member that is not `user_id`, or `None` if `user_id` is not a member
    pub fn other_member(&self, user_id: Uuid) -> Option<Uuid> {
        self.pair().other(user_id)
    }
}

/// Direct message between two matched users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub seen: bool,
    pub deleted: bool,
}

impl Message {
    pub fn new(sender_id: Uuid, receiver_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content,
            created_at: Utc::now(),
            seen: false,
            deleted: false,
        }
    }
}

/// `user_id` blocking `blocked_id`
///
/// A block in either direction disables every interaction between the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Block {
    pub id: Uuid,
    pub user_id: Uuid,
    pub blocked_id: Uuid,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Block {
    pub fn new(user_id: Uuid, blocked_id: Uuid, reason: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            blocked_id,
            reason,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_is_canonicalised() {
        let a = Uuid::from_u128(2);
        let b = Uuid::from_u128(1);
        let m = Match::new(UserPair::new(a, b));

        assert_eq!(m.user1_id, b);
        assert_eq!(m.user2_id, a);
        assert!(m.expire_at.is_none());
    }

    #[test]
    fn test_match_membership() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let outsider = Uuid::from_u128(3);
        let m = Match::new(UserPair::new(a, b));

        assert!(m.involves(a));
        assert!(m.involves(b));
        assert!(!m.involves(outsider));
        assert_eq!(m.other_member(a), Some(b));
        assert_eq!(m.other_member(b), Some(a));
        assert_eq!(m.other_member(outsider), None);
    }

    #[test]
    fn test_new_message_defaults() {
        let msg = Message::new(Uuid::from_u128(1), Uuid::from_u128(2), "hi".to_string());
        assert!(!msg.seen);
        assert!(!msg.deleted);
    }
}
