use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ModelError, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SessionStatus {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            _ => Err(ModelError::UnknownStatus(value)),
        }
    }
}

/// A session row. Users are referenced by phone number only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_phone: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    /// `None` while the session is active.
    pub end_time: Option<DateTime<Utc>>,
    pub channel: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

/// Whole minutes and leftover whole seconds of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDuration {
    pub minutes: i64,
    pub seconds: i64,
}

impl SessionDuration {
    pub fn from_millis(ms: i64) -> Self {
        let ms = ms.max(0);
        Self {
            minutes: ms / 60_000,
            seconds: (ms % 60_000) / 1_000,
        }
    }
}

impl fmt::Display for SessionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m {}s", self.minutes, self.seconds)
    }
}

/// Duration of a completed session with both timestamps, otherwise `None`.
pub fn compute_duration(session: &Session) -> Option<SessionDuration> {
    if session.status != SessionStatus::Completed {
        return None;
    }
    let end = session.end_time?;
    let span = end.signed_duration_since(session.start_time);
    Some(SessionDuration::from_millis(span.num_milliseconds()))
}

/// A session as the views see it: the row, its derived duration and,
/// when the phone join found one, its user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(flatten)]
    pub session: Session,
    pub duration: Option<SessionDuration>,
    pub user: Option<User>,
}

impl SessionRecord {
    pub fn new(session: Session) -> Self {
        let duration = compute_duration(&session);
        Self {
            session,
            duration,
            user: None,
        }
    }

    pub fn with_user(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }
}
