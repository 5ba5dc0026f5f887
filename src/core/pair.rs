use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unordered pair of two users
///
/// Stored canonicalised so `UserPair::new(a, b) == UserPair::new(b, a)`.
/// Likes, dislikes and blocks are directional; matches, message threads and
/// block cleanup are keyed by the unordered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserPair {
    low: Uuid,
    high: Uuid,
}

impl UserPair {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    #[inline]
    pub fn low(&self) -> Uuid {
        self.low
    }

    #[inline]
    pub fn high(&self) -> Uuid {
        self.high
    }

    #[inline]
    pub fn contains(&self, user_id: Uuid) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// The member that is not `user_id`
    pub fn other(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.low {
            Some(self.high)
        } else if user_id == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    /// Whether `(a, b)` names this pair in either direction
    #[inline]
    pub fn is(&self, a: Uuid, b: Uuid) -> bool {
        *self == UserPair::new(a, b)
    }

    /// 64-bit key for per-pair advisory locking (FNV-1a over both ids)
    pub fn lock_key(&self) -> i64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in self.low.as_bytes().iter().chain(self.high.as_bytes()) {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash as i64
    }
}

impl std::fmt::Display for UserPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}, {}}}", self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_unordered() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(UserPair::new(a, b), UserPair::new(b, a));
        assert_eq!(UserPair::new(a, b).lock_key(), UserPair::new(b, a).lock_key());
        assert!(UserPair::new(a, b).is(b, a));
    }

    #[test]
    fn test_pair_other() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let pair = UserPair::new(b, a);

        assert_eq!(pair.low(), a);
        assert_eq!(pair.other(a), Some(b));
        assert_eq!(pair.other(b), Some(a));
        assert_eq!(pair.other(Uuid::from_u128(3)), None);
    }

    #[test]
    fn test_lock_key_differs_between_pairs() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let c = Uuid::from_u128(3);

        assert_ne!(UserPair::new(a, b).lock_key(), UserPair::new(a, c).lock_key());
    }
}
