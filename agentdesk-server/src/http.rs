//! AgentDesk HTTP API
//!
//! Axum-based HTTP server exposing the admin views as JSON.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to an
//! inner function returning `(StatusCode, serde_json::Value)`. The inner
//! functions are directly testable without axum dispatch machinery.
//!
//! Endpoints:
//! - GET   /health                    : backend health
//! - GET   /version                   : server version info
//! - GET   /api/dashboard             : KPIs + recent sessions
//! - GET   /api/sessions              : sessions list (search, status, page)
//! - GET   /api/sessions/:id          : session, transcript page, summary
//! - GET   /api/users                 : users list (search, page)
//! - GET   /api/users/:phone/sessions : sessions of one user
//! - GET   /api/seats                 : seat availability
//! - PATCH /api/seats/:program_id     : set available seats
//! - GET   /api/settings              : static settings
//! - GET   /api/nav                   : sidebar items, breadcrumbs and shell flags for a path

use std::sync::Arc;

use agentdesk_core::listing::ViewState;
use agentdesk_core::nav::ShellState;
use agentdesk_core::{AgentDeskConfig, MessagePage, Repository, SeatCount, SeatUpdateOutcome};
use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::cache::SeatCache;
use crate::views;

/// Shared state for all HTTP handlers
pub struct HttpState {
    pub repo: Repository,
    pub config: AgentDeskConfig,
    pub seat_cache: SeatCache,
}

impl HttpState {
    pub fn new(repo: Repository, config: AgentDeskConfig) -> Self {
        let seat_cache = SeatCache::new(config.http.seat_cache);
        Self {
            repo,
            config,
            seat_cache,
        }
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/sessions", get(sessions_handler))
        .route("/api/sessions/:id", get(session_detail_handler))
        .route("/api/users", get(users_handler))
        .route("/api/users/:phone/sessions", get(user_sessions_handler))
        .route("/api/seats", get(seats_handler))
        .route("/api/seats/:program_id", patch(seat_update_handler))
        .route("/api/settings", get(settings_handler))
        .route("/api/nav", get(nav_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<HttpState>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("AgentDesk HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<usize>,
}

impl ListParams {
    pub fn view_state(self) -> ViewState {
        ViewState::from_params(self.search, self.status, self.page)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct TranscriptParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SeatUpdateRequest {
    /// Kept loose so non-numeric input reaches validation instead of a 422 from serde.
    pub available: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct NavParams {
    pub path: Option<String>,
    /// Current shell flags as held by the client.
    pub collapsed: Option<bool>,
    pub mobile_open: Option<bool>,
}

fn error_body(msg: impl Into<String>) -> serde_json::Value {
    serde_json::json!({
        "error": msg.into(),
        "status": "error",
    })
}

fn to_body<T: serde::Serialize>(value: &T) -> (StatusCode, serde_json::Value) {
    match serde_json::to_value(value) {
        Ok(v) => (StatusCode::OK, v),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize view");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body("failed to render view"))
        }
    }
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

/// Inner health check: checks the backend and returns (status_code, json_body).
pub async fn health_inner(repo: &Repository) -> (StatusCode, serde_json::Value) {
    match repo.health().await {
        Ok(backend_version) => (
            StatusCode::OK,
            serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "backend": repo.backend_name(),
                "backend_version": backend_version,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "unhealthy",
                "backend": repo.backend_name(),
                "error": e.to_string(),
            }),
        ),
    }
}

/// Inner version: returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "api": "agentdesk/1",
    })
}

pub async fn dashboard_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    let view = views::dashboard(&state.repo, &state.config.listing).await;
    to_body(&view)
}

pub async fn sessions_inner(
    state: &HttpState,
    params: ListParams,
) -> (StatusCode, serde_json::Value) {
    let view_state = params.view_state();
    let page = views::sessions(&state.repo, &view_state, &state.config.listing).await;
    to_body(&page)
}

pub async fn session_detail_inner(
    state: &HttpState,
    id: &str,
    params: TranscriptParams,
) -> (StatusCode, serde_json::Value) {
    let Ok(id) = Uuid::parse_str(id) else {
        return (StatusCode::NOT_FOUND, error_body(format!("session {} not found", id)));
    };
    let page = MessagePage::new(
        params.page.unwrap_or(1),
        params
            .page_size
            .unwrap_or(state.config.listing.message_page_size),
    );

    match views::session_detail(&state.repo, id, page).await {
        Some(view) => to_body(&view),
        None => (StatusCode::NOT_FOUND, error_body(format!("session {} not found", id))),
    }
}

pub async fn users_inner(state: &HttpState, params: ListParams) -> (StatusCode, serde_json::Value) {
    let view_state = params.view_state();
    let page = views::users(&state.repo, &view_state, &state.config.listing).await;
    to_body(&page)
}

pub async fn user_sessions_inner(state: &HttpState, phone: &str) -> (StatusCode, serde_json::Value) {
    let sessions = views::user_sessions(&state.repo, phone).await;
    to_body(&serde_json::json!({
        "phone": phone,
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

pub async fn seats_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    let seats = views::seats(&state.repo, &state.seat_cache).await;
    to_body(&serde_json::json!({
        "seats": seats,
        "count": seats.len(),
    }))
}

/// Inner seat update: validates before writing, invalidates the seat cache on success.
pub async fn seat_update_inner(
    state: &HttpState,
    program_id: &str,
    req: SeatUpdateRequest,
) -> (StatusCode, serde_json::Value) {
    let raw = req.available.unwrap_or(serde_json::Value::Null);
    let count = match SeatCount::from_json(&raw) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(program_id = %program_id, input = %raw, "Rejected seat input");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({
                    "error": e.to_string(),
                    "title": "Invalid Input",
                    "status": "error",
                }),
            );
        }
    };

    let outcome = agentdesk_core::update_seat(&state.repo, program_id, count).await;
    let message = outcome.user_message();
    match outcome {
        SeatUpdateOutcome::Updated(seat) => {
            state.seat_cache.invalidate().await;
            (
                StatusCode::OK,
                serde_json::json!({
                    "status": "ok",
                    "message": message,
                    "seat": seat,
                }),
            )
        }
        SeatUpdateOutcome::NotFound => (StatusCode::NOT_FOUND, error_body(message)),
        SeatUpdateOutcome::Failed(_) => (StatusCode::BAD_GATEWAY, error_body(message)),
    }
}

pub fn nav_inner(params: NavParams) -> serde_json::Value {
    let path = params.path.unwrap_or_else(|| "/dashboard".to_string());
    let shell = ShellState {
        collapsed: params.collapsed.unwrap_or(false),
        mobile_open: params.mobile_open.unwrap_or(false),
    };
    serde_json::to_value(views::navigation(&path, shell)).unwrap_or_else(|_| serde_json::json!({}))
}

// ============================================================================
// Axum handler wrappers (thin: delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.repo).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn dashboard_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = dashboard_inner(&state).await;
    (status, Json(body))
}

pub async fn sessions_handler(
    State(state): State<Arc<HttpState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let (status, body) = sessions_inner(&state, params).await;
    (status, Json(body))
}

pub async fn session_detail_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
    Query(params): Query<TranscriptParams>,
) -> impl IntoResponse {
    let (status, body) = session_detail_inner(&state, &id, params).await;
    (status, Json(body))
}

pub async fn users_handler(
    State(state): State<Arc<HttpState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let (status, body) = users_inner(&state, params).await;
    (status, Json(body))
}

pub async fn user_sessions_handler(
    State(state): State<Arc<HttpState>>,
    Path(phone): Path<String>,
) -> impl IntoResponse {
    let (status, body) = user_sessions_inner(&state, &phone).await;
    (status, Json(body))
}

pub async fn seats_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = seats_inner(&state).await;
    (status, Json(body))
}

pub async fn seat_update_handler(
    State(state): State<Arc<HttpState>>,
    Path(program_id): Path<String>,
    Json(req): Json<SeatUpdateRequest>,
) -> impl IntoResponse {
    let (status, body) = seat_update_inner(&state, &program_id, req).await;
    (status, Json(body))
}

pub async fn settings_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(views::settings(&state.config.listing)))
}

pub async fn nav_handler(Query(params): Query<NavParams>) -> impl IntoResponse {
    (StatusCode::OK, Json(nav_inner(params)))
}

// ============================================================================
// Unit Tests: call inner functions directly
// ============================================================================
