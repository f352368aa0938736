use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionSummary {
    pub id: Uuid,
    pub session_id: Uuid,
    pub summary: String,
    pub model: String,
    pub tokens: i32,
    pub created_at: DateTime<Utc>,
}
