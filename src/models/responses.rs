use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Users a caller has already acted on or cannot interact with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionsResponse {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "excludedUserIds")]
    pub excluded_user_ids: Vec<Uuid>,
    pub count: usize,
}
