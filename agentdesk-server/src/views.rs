//! View assembly: fetch what each page needs from the repository, then
//! apply the request's list state.

use agentdesk_core::config::ListingConfig;
use agentdesk_core::listing::{self, Page, UserRow, ViewState};
use agentdesk_core::models::{
    SeatAvailability, SessionMessage, SessionRecord, SessionStatus, SessionSummary,
};
use agentdesk_core::nav::{self, Crumb, NavEntry, ShellState};
use agentdesk_core::{MessagePage, Repository};
use serde::Serialize;
use uuid::Uuid;

use crate::cache::SeatCache;

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub total_users: usize,
    pub total_sessions: usize,
    pub active_sessions: usize,
    pub completed_sessions: usize,
    pub recent_sessions: Vec<SessionRecord>,
}

#[derive(Debug, Serialize)]
pub struct SessionDetailView {
    pub session: SessionRecord,
    pub messages: Vec<SessionMessage>,
    pub message_page: i64,
    pub message_page_size: i64,
    /// `None` when no summary has been generated yet.
    pub summary: Option<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct NavView {
    pub items: Vec<NavEntry>,
    pub breadcrumbs: Vec<Crumb>,
    /// Shell flags after following the link to this path.
    pub shell: ShellState,
}

pub async fn dashboard(repo: &Repository, listing: &ListingConfig) -> DashboardView {
    let (users, sessions, recent) = tokio::join!(
        repo.users(),
        repo.sessions(),
        repo.recent_sessions(listing.recent_sessions),
    );

    let count = |status: SessionStatus| {
        sessions
            .iter()
            .filter(|s| s.session.status == status)
            .count()
    };

    DashboardView {
        total_users: users.len(),
        total_sessions: sessions.len(),
        active_sessions: count(SessionStatus::Active),
        completed_sessions: count(SessionStatus::Completed),
        recent_sessions: recent,
    }
}

pub async fn sessions(
    repo: &Repository,
    state: &ViewState,
    listing: &ListingConfig,
) -> Page<SessionRecord> {
    let all = repo.sessions().await;
    listing::apply(&all, state, &listing::sessions_spec(listing.page_size))
}

pub async fn users(repo: &Repository, state: &ViewState, listing: &ListingConfig) -> Page<UserRow> {
    let (users, sessions) = tokio::join!(repo.users(), repo.sessions());
    let rows = listing::user_rows(users, &sessions);
    listing::apply(&rows, state, &listing::users_spec(listing.page_size))
}

pub async fn user_sessions(repo: &Repository, phone: &str) -> Vec<SessionRecord> {
    repo.sessions_for_phone(phone).await
}

/// `None` when the session does not exist.
pub async fn session_detail(
    repo: &Repository,
    id: Uuid,
    page: MessagePage,
) -> Option<SessionDetailView> {
    let (session, messages, summary) = tokio::join!(
        repo.session(id),
        repo.session_messages(id, Some(page)),
        repo.session_summary(id),
    );

    session.map(|session| SessionDetailView {
        session,
        messages,
        message_page: page.page,
        message_page_size: page.page_size,
        summary,
    })
}

pub async fn seats(repo: &Repository, cache: &SeatCache) -> Vec<SeatAvailability> {
    cache.get_or_load(repo).await
}

/// Static settings page. Nothing here is persisted.
pub fn settings(listing: &ListingConfig) -> serde_json::Value {
    serde_json::json!({
        "persisted": false,
        "profile": {
            "name": "Operator",
            "email": null,
        },
        "notifications": {
            "email_alerts": true,
            "weekly_digest": false,
        },
        "listing": {
            "page_size": listing.page_size,
            "recent_sessions": listing.recent_sessions,
            "message_page_size": listing.message_page_size,
        },
    })
}

pub fn navigation(path: &str, mut shell: ShellState) -> NavView {
    shell.navigate();
    NavView {
        items: nav::nav_entries(path),
        breadcrumbs: nav::breadcrumbs(path),
        shell,
    }
}
