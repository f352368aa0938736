use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{MessageRange, SessionQuery, Store};
use crate::error::AgentDeskError;
use crate::models::{SeatAvailability, Session, SessionMessage, SessionSummary, User};

const USER_COLUMNS: &str = "id, name, phone, email, created_at, last_seen";
const SESSION_COLUMNS: &str = "id, user_phone, status, start_time, end_time, channel, meta";
const MESSAGE_COLUMNS: &str = "id, session_id, sender, text, created_at, tokens, tool_used";
const SUMMARY_COLUMNS: &str = "id, session_id, summary, model, tokens, created_at";
const SEAT_COLUMNS: &str = "program_id, program, campus, quota, available_seats, last_updated";

/// `Store` over the hosted Postgres schema.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn users(&self) -> Result<Vec<User>, AgentDeskError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn users_by_phones(&self, phones: &[String]) -> Result<Vec<User>, AgentDeskError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE phone = ANY($1)");
        let rows = sqlx::query_as::<_, User>(&sql)
            .bind(phones)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn sessions(&self, query: &SessionQuery) -> Result<Vec<Session>, AgentDeskError> {
        // LIMIT NULL is no limit
        let sql = format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sessions
            WHERE ($1::text IS NULL OR user_phone = $1)
            ORDER BY start_time DESC
            LIMIT $2
            "#
        );
        let rows = sqlx::query_as::<_, Session>(&sql)
            .bind(query.user_phone.as_deref())
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn session(&self, id: Uuid) -> Result<Option<Session>, AgentDeskError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1");
        let row = sqlx::query_as::<_, Session>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn session_messages(
        &self,
        session_id: Uuid,
        range: Option<MessageRange>,
    ) -> Result<Vec<SessionMessage>, AgentDeskError> {
        let (offset, limit) = match range {
            Some(r) => (r.offset, Some(r.limit)),
            None => (0, None),
        };
        let sql = format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM session_messages
            WHERE session_id = $1
            ORDER BY created_at ASC
            OFFSET $2
            LIMIT $3
            "#
        );
        let rows = sqlx::query_as::<_, SessionMessage>(&sql)
            .bind(session_id)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn session_summary(
        &self,
        session_id: Uuid,
    ) -> Result<Option<SessionSummary>, AgentDeskError> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM session_summaries WHERE session_id = $1 \
             ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, SessionSummary>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn seats(&self) -> Result<Vec<SeatAvailability>, AgentDeskError> {
        let sql = format!("SELECT {SEAT_COLUMNS} FROM seat_availability ORDER BY campus, program");
        let rows = sqlx::query_as::<_, SeatAvailability>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update_seat(
        &self,
        program_id: &str,
        available: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<SeatAvailability>, AgentDeskError> {
        // last_updated never moves backwards
        let sql = format!(
            r#"
            UPDATE seat_availability
            SET available_seats = $1,
                last_updated = GREATEST($2, last_updated)
            WHERE program_id = $3
            RETURNING {SEAT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, SeatAvailability>(&sql)
            .bind(available)
            .bind(updated_at)
            .bind(program_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn health(&self) -> Result<String, AgentDeskError> {
        Ok(crate::db::health_check(&self.pool).await?)
    }

    fn name(&self) -> &str {
        "postgres"
    }
}
