//! Data access layer used by the views.
//!
//! Wraps a `Store` and applies the read policy:
//! - query failures are logged and degrade to an empty collection / `None`
//! - a missing row for a singular lookup is `None`, not an error
//! - sessions are joined to users by phone with one batched lookup per call
//! - completed sessions carry a derived duration

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AgentDeskError;
use crate::models::{SeatAvailability, Session, SessionMessage, SessionRecord, SessionSummary, User};
use crate::store::{MessageRange, SessionQuery, Store};

/// Default transcript page size.
pub const DEFAULT_MESSAGE_PAGE_SIZE: i64 = 50;

/// Largest transcript page a caller may ask for.
pub const MAX_MESSAGE_PAGE_SIZE: i64 = 500;

/// 1-based page of a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagePage {
    pub page: i64,
    pub page_size: i64,
}

impl MessagePage {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_MESSAGE_PAGE_SIZE),
        }
    }

    pub fn range(&self) -> MessageRange {
        MessageRange {
            // page comes from the request; huge values saturate past the last row
            offset: self.page.saturating_sub(1).saturating_mul(self.page_size),
            limit: self.page_size,
        }
    }
}

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn Store>,
}

impl Repository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &str {
        self.store.name()
    }

    /// Unlike the reads below, health errors are returned to the caller.
    pub async fn health(&self) -> Result<String, AgentDeskError> {
        self.store.health().await
    }

    pub async fn users(&self) -> Vec<User> {
        match self.store.users().await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch users");
                Vec::new()
            }
        }
    }

    /// All sessions, newest first, with users attached.
    pub async fn sessions(&self) -> Vec<SessionRecord> {
        self.query_sessions(SessionQuery::default()).await
    }

    /// The newest `limit` sessions, with users attached.
    pub async fn recent_sessions(&self, limit: i64) -> Vec<SessionRecord> {
        self.query_sessions(SessionQuery {
            user_phone: None,
            limit: Some(limit.max(0)),
        })
        .await
    }

    /// Sessions belonging to the user with this phone number.
    pub async fn sessions_for_phone(&self, phone: &str) -> Vec<SessionRecord> {
        self.query_sessions(SessionQuery {
            user_phone: Some(phone.to_string()),
            limit: None,
        })
        .await
    }

    pub async fn session(&self, id: Uuid) -> Option<SessionRecord> {
        match self.store.session(id).await {
            Ok(Some(session)) => self.attach_users(vec![session]).await.pop(),
            Ok(None) => {
                tracing::debug!(session_id = %id, "Session not found");
                None
            }
            Err(e) => {
                tracing::error!(session_id = %id, error = %e, "Failed to fetch session");
                None
            }
        }
    }

    /// Transcript ascending by `created_at`; the whole transcript when `page` is `None`.
    pub async fn session_messages(
        &self,
        session_id: Uuid,
        page: Option<MessagePage>,
    ) -> Vec<SessionMessage> {
        let range = page.map(|p| p.range());
        match self.store.session_messages(session_id, range).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Failed to fetch messages");
                Vec::new()
            }
        }
    }

    /// `None` both when the session has no summary and when the lookup fails.
    pub async fn session_summary(&self, session_id: Uuid) -> Option<SessionSummary> {
        match self.store.session_summary(session_id).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Failed to fetch summary");
                None
            }
        }
    }

    pub async fn seats(&self) -> Vec<SeatAvailability> {
        match self.store.seats().await {
            Ok(seats) => seats,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch seat availability");
                Vec::new()
            }
        }
    }

    /// Raw seat write. Validation and failure reporting live in `crate::actions`.
    pub async fn write_seat(
        &self,
        program_id: &str,
        available: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<SeatAvailability>, AgentDeskError> {
        self.store.update_seat(program_id, available, updated_at).await
    }

    async fn query_sessions(&self, query: SessionQuery) -> Vec<SessionRecord> {
        match self.store.sessions(&query).await {
            Ok(sessions) => self.attach_users(sessions).await,
            Err(e) => {
                tracing::error!(
                    user_phone = ?query.user_phone,
                    error = %e,
                    "Failed to fetch sessions"
                );
                Vec::new()
            }
        }
    }

    /// Compute durations and attach users. Issues at most one user lookup.
    async fn attach_users(&self, sessions: Vec<Session>) -> Vec<SessionRecord> {
        let phones: Vec<String> = sessions
            .iter()
            .filter_map(|s| s.user_phone.as_deref())
            .filter(|p| !p.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut by_phone: HashMap<String, User> = HashMap::new();
        if !phones.is_empty() {
            match self.store.users_by_phones(&phones).await {
                Ok(users) => {
                    by_phone.extend(users.into_iter().map(|u| (u.phone.clone(), u)));
                }
                Err(e) => {
                    tracing::warn!(
                        phones = phones.len(),
                        error = %e,
                        "Failed to fetch users for mapping by phone"
                    );
                }
            }
        }

        sessions
            .into_iter()
            .map(|s| {
                let user = s.user_phone.as_ref().and_then(|p| by_phone.get(p)).cloned();
                SessionRecord::new(s).with_user(user)
            })
            .collect()
    }
}
