//! Table access behind one trait.
//!
//! Provides a `Store` trait with implementations for:
//! - `PgStore`: the managed Postgres backend (sqlx)
//! - `FixtureStore`: JSON files on disk, one per table, with seat writes kept in memory
//!
//! A `Store` only talks to tables: every method returns the raw rows or the
//! underlying error. Degrading to empty results, the user join and derived
//! fields live in `crate::repository`.

pub mod fixtures;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::{AgentDeskConfig, BackendCredentials, BackendKind};
use crate::error::AgentDeskError;
use crate::models::{SeatAvailability, Session, SessionMessage, SessionSummary, User};

pub use fixtures::{FixtureData, FixtureStore};
pub use postgres::PgStore;

/// Filter for the `sessions` table. Rows always come back newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionQuery {
    pub user_phone: Option<String>,
    pub limit: Option<i64>,
}

/// Offset/limit window over a session's messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRange {
    pub offset: i64,
    pub limit: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn users(&self) -> Result<Vec<User>, AgentDeskError>;

    /// Users whose phone is in `phones`. One round trip regardless of length.
    async fn users_by_phones(&self, phones: &[String]) -> Result<Vec<User>, AgentDeskError>;

    async fn sessions(&self, query: &SessionQuery) -> Result<Vec<Session>, AgentDeskError>;

    /// `Ok(None)` when no row has this id.
    async fn session(&self, id: Uuid) -> Result<Option<Session>, AgentDeskError>;

    /// Messages ascending by `created_at`.
    async fn session_messages(
        &self,
        session_id: Uuid,
        range: Option<MessageRange>,
    ) -> Result<Vec<SessionMessage>, AgentDeskError>;

    /// `Ok(None)` when the session has no summary.
    async fn session_summary(
        &self,
        session_id: Uuid,
    ) -> Result<Option<SessionSummary>, AgentDeskError>;

    async fn seats(&self) -> Result<Vec<SeatAvailability>, AgentDeskError>;

    /// Set `available` and `last_updated` on one row. `Ok(None)` when no row matched.
    async fn update_seat(
        &self,
        program_id: &str,
        available: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<SeatAvailability>, AgentDeskError>;

    /// Backend version string, or the error that made it unreachable.
    async fn health(&self) -> Result<String, AgentDeskError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Build the store selected by `database.backend`.
///
/// Postgres credentials are read from the environment; a missing or malformed
/// credential is fatal here rather than at first query.
pub async fn create_store(config: &AgentDeskConfig) -> Result<Box<dyn Store>, AgentDeskError> {
    match config.database.backend {
        BackendKind::Postgres => {
            let credentials = BackendCredentials::from_env()?;
            let pool = crate::db::create_pool(&config.database, &credentials).await?;
            Ok(Box::new(PgStore::new(pool)))
        }
        BackendKind::Fixtures => Ok(Box::new(FixtureStore::load(&config.database.fixtures_dir)?)),
    }
}
