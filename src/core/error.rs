use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::StoreError;

/// Directional signals a user can record about another user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Like,
    Dislike,
    Block,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Signal::Like => "like",
            Signal::Dislike => "dislike",
            Signal::Block => "block",
        };
        f.write_str(name)
    }
}

/// Errors returned by the interaction engine
///
/// Every variant except `Store` is a rejected precondition: nothing was
/// written.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("cannot target yourself")]
    SelfTarget,

    #[error("{0} already recorded")]
    Duplicate(Signal),

    #[error("cannot {attempted}: {existing} already recorded")]
    ConflictingSignal { attempted: Signal, existing: Signal },

    #[error("interaction blocked")]
    Blocked,

    #[error("no such match or not a participant")]
    NotParticipant,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl InteractionError {
    /// Stable machine-readable kind, used as the `error` field of HTTP responses
    pub fn kind(&self) -> &'static str {
        match self {
            InteractionError::SelfTarget => "self_target",
            InteractionError::Duplicate(_) => "duplicate",
            InteractionError::ConflictingSignal { .. } => "conflicting_signal",
            InteractionError::Blocked => "blocked",
            InteractionError::NotParticipant => "not_participant",
            InteractionError::Store(_) => "store_error",
        }
    }

    /// Map a failed insert of `signal`, turning a uniqueness conflict into
    /// `Duplicate`
    pub(crate) fn from_insert(err: StoreError, signal: Signal) -> Self {
        match err {
            StoreError::Conflict(_) => InteractionError::Duplicate(signal),
            other => InteractionError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_on_insert_is_duplicate() {
        let err = InteractionError::from_insert(
            StoreError::Conflict("likes_user_target_key".to_string()),
            Signal::Like,
        );
        assert!(matches!(err, InteractionError::Duplicate(Signal::Like)));
    }

    #[test]
    fn test_other_store_errors_pass_through() {
        let err = InteractionError::from_insert(
            StoreError::Unavailable("down".to_string()),
            Signal::Block,
        );
        assert!(matches!(err, InteractionError::Store(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_error_messages() {
        let err = InteractionError::ConflictingSignal {
            attempted: Signal::Like,
            existing: Signal::Dislike,
        };
        assert_eq!(err.to_string(), "cannot like: dislike already recorded");
        assert_eq!(InteractionError::Duplicate(Signal::Block).to_string(), "block already recorded");
    }
}
