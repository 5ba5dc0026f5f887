use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request to like or dislike a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRequest {
    #[serde(alias = "targetId")]
    pub target_id: Uuid,
}

/// Request to block a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BlockRequest {
    #[serde(alias = "blockedId")]
    pub blocked_id: Uuid,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request to send a message on a match
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[serde(alias = "matchId")]
    pub match_id: Uuid,
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message_rejected() {
        let req = SendMessageRequest {
            match_id: Uuid::new_v4(),
            content: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_block_reason_optional() {
        let req: BlockRequest = serde_json::from_str(
            r#"{"blocked_id": "11111111-1111-1111-1111-111111111111"}"#,
        )
        .unwrap();
        assert!(req.reason.is_none());
        assert!(req.validate().is_ok());
    }
}
