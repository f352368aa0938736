//! JSON fixture store.
//!
//! Reads `users.json`, `sessions.json`, `session_messages.json`,
//! `session_summaries.json` and `seat_availability.json` from one directory.
//! A missing file is an empty table. Seat updates are applied in memory and
//! never written back.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MessageRange, SessionQuery, Store};
use crate::error::AgentDeskError;
use crate::models::{SeatAvailability, Session, SessionMessage, SessionSummary, User};

/// The five tables held in memory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
    #[serde(default)]
    pub summaries: Vec<SessionSummary>,
    #[serde(default)]
    pub seats: Vec<SeatAvailability>,
}

#[derive(Debug, Default)]
pub struct FixtureStore {
    data: RwLock<FixtureData>,
}

impl FixtureStore {
    pub fn new(data: FixtureData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    pub fn load(dir: impl AsRef<Path>) -> Result<Self, AgentDeskError> {
        let dir = dir.as_ref();
        let data = FixtureData {
            users: read_table(dir, "users.json")?,
            sessions: read_table(dir, "sessions.json")?,
            messages: read_table(dir, "session_messages.json")?,
            summaries: read_table(dir, "session_summaries.json")?,
            seats: read_table(dir, "seat_availability.json")?,
        };
        tracing::info!(
            dir = %dir.display(),
            users = data.users.len(),
            sessions = data.sessions.len(),
            messages = data.messages.len(),
            seats = data.seats.len(),
            "Loaded fixture tables"
        );
        Ok(Self::new(data))
    }
}

fn read_table<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>, AgentDeskError> {
    let path = dir.join(file);
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Fixture file missing, table is empty");
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(&path)?;
    serde_json::from_str(&raw).map_err(|source| AgentDeskError::Fixture {
        file: path.display().to_string(),
        source,
    })
}

#[async_trait]
impl Store for FixtureStore {
    async fn users(&self) -> Result<Vec<User>, AgentDeskError> {
        let data = self.data.read().await;
        let mut users = data.users.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn users_by_phones(&self, phones: &[String]) -> Result<Vec<User>, AgentDeskError> {
        let data = self.data.read().await;
        Ok(data
            .users
            .iter()
            .filter(|u| phones.contains(&u.phone))
            .cloned()
            .collect())
    }

    async fn sessions(&self, query: &SessionQuery) -> Result<Vec<Session>, AgentDeskError> {
        let data = self.data.read().await;
        let mut sessions: Vec<Session> = data
            .sessions
            .iter()
            .filter(|s| match &query.user_phone {
                Some(phone) => s.user_phone.as_deref() == Some(phone.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        if let Some(limit) = query.limit {
            sessions.truncate(limit.max(0) as usize);
        }
        Ok(sessions)
    }

    async fn session(&self, id: Uuid) -> Result<Option<Session>, AgentDeskError> {
        let data = self.data.read().await;
        Ok(data.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn session_messages(
        &self,
        session_id: Uuid,
        range: Option<MessageRange>,
    ) -> Result<Vec<SessionMessage>, AgentDeskError> {
        let data = self.data.read().await;
        let mut messages: Vec<SessionMessage> = data
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let messages = match range {
            Some(r) => messages
                .into_iter()
                .skip(r.offset.max(0) as usize)
                .take(r.limit.max(0) as usize)
                .collect(),
            None => messages,
        };
        Ok(messages)
    }

    async fn session_summary(
        &self,
        session_id: Uuid,
    ) -> Result<Option<SessionSummary>, AgentDeskError> {
        let data = self.data.read().await;
        Ok(data
            .summaries
            .iter()
            .filter(|s| s.session_id == session_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn seats(&self) -> Result<Vec<SeatAvailability>, AgentDeskError> {
        let data = self.data.read().await;
        let mut seats = data.seats.clone();
        seats.sort_by(|a, b| (&a.campus, &a.program).cmp(&(&b.campus, &b.program)));
        Ok(seats)
    }

    async fn update_seat(
        &self,
        program_id: &str,
        available: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<SeatAvailability>, AgentDeskError> {
        let mut data = self.data.write().await;
        let Some(seat) = data.seats.iter_mut().find(|s| s.program_id == program_id) else {
            return Ok(None);
        };
        seat.available = available;
        seat.last_updated = seat.last_updated.max(updated_at);
        Ok(Some(seat.clone()))
    }

    async fn health(&self) -> Result<String, AgentDeskError> {
        let data = self.data.read().await;
        Ok(format!(
            "fixtures ({} users, {} sessions, {} seats)",
            data.users.len(),
            data.sessions.len(),
            data.seats.len()
        ))
    }

    fn name(&self) -> &str {
        "fixtures"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::models::{Sender, SessionStatus};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn message(session_id: Uuid, minute: i64, text: &str) -> SessionMessage {
        SessionMessage {
            id: Uuid::new_v4(),
            session_id,
            sender: Sender::User,
            text: text.to_string(),
            created_at: t0() + Duration::minutes(minute),
            tokens: None,
            tool_used: None,
        }
    }

    fn session(phone: &str, hours: i64) -> Session {
        Session {
            id: Uuid::new_v4(),
            user_phone: Some(phone.to_string()),
            status: SessionStatus::Active,
            start_time: t0() + Duration::hours(hours),
            end_time: None,
            channel: "sms".to_string(),
            meta: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_messages_sorted_ascending_and_windowed() {
        let sid = Uuid::new_v4();
        let store = FixtureStore::new(FixtureData {
            messages: vec![
                message(sid, 3, "third"),
                message(sid, 1, "first"),
                message(Uuid::new_v4(), 2, "other session"),
                message(sid, 2, "second"),
            ],
            ..Default::default()
        });

        let all = store.session_messages(sid, None).await.unwrap();
        let texts: Vec<&str> = all.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);

        let window = store
            .session_messages(sid, Some(MessageRange { offset: 1, limit: 1 }))
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].text, "second");
    }

    #[tokio::test]
    async fn test_sessions_filtered_by_phone_newest_first_with_limit() {
        let store = FixtureStore::new(FixtureData {
            sessions: vec![
                session("+1", 1),
                session("+2", 2),
                session("+1", 3),
                session("+1", 2),
            ],
            ..Default::default()
        });

        let query = SessionQuery {
            user_phone: Some("+1".to_string()),
            limit: Some(2),
        };
        let rows = store.sessions(&query).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|s| s.user_phone.as_deref() == Some("+1")));
        assert!(rows[0].start_time > rows[1].start_time);
    }

    #[tokio::test]
    async fn test_update_seat_unknown_program_returns_none() {
        let store = FixtureStore::default();
        let result = store.update_seat("nope", 3, Utc::now()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_load_missing_directory_yields_empty_tables() {
        let store = FixtureStore::load("/nonexistent/agentdesk-fixtures").unwrap();
        assert!(store.users().await.unwrap().is_empty());
        assert!(store.seats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_bundled_fixtures() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures");
        let store = FixtureStore::load(dir).expect("bundled fixtures parse");
        assert!(!store.users().await.unwrap().is_empty());
        assert!(!store.seats().await.unwrap().is_empty());
        let sessions = store.sessions(&SessionQuery::default()).await.unwrap();
        assert!(sessions.len() >= 12);
    }
}
