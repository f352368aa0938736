use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

impl TryFrom<String> for Sender {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(Sender::User),
            "agent" => Ok(Sender::Agent),
            _ => Err(ModelError::UnknownSender(value)),
        }
    }
}

/// One transcript line. `tokens` and `tool_used` are nullable columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    #[sqlx(try_from = "String")]
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub tokens: Option<i32>,
    pub tool_used: Option<String>,
}
