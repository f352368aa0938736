//! agentdesk-cli: operator command line for the AgentDesk HTTP API
//!
//! Every subcommand is one HTTP call against `agentdesk-server`. Output is a
//! plain-text table by default, or the raw JSON body with `--json`.
//!
//! # Subcommands
//! - `status`                                        : server and backend health
//! - `users [--search <s>] [--page <n>]`             : users list
//! - `sessions [--search <s>] [--status <s>] [--page <n>]`: sessions list
//! - `session <id> [--page <n>]`                     : one session with transcript
//! - `seats`                                         : seat availability
//! - `set-seats <program_id> <count>`                : update available seats

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8780";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "agentdesk-cli", version, about = "AgentDesk admin command line")]
struct Cli {
    /// AgentDesk HTTP server URL (overrides AGENTDESK_HTTP_URL env var)
    #[arg(long, env = "AGENTDESK_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show server and backend health
    Status {
        #[arg(long)]
        json: bool,
    },

    /// List users with their session counts
    Users {
        /// Case-insensitive match on name, phone or email
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long)]
        json: bool,
    },

    /// List sessions, newest first
    Sessions {
        /// Case-insensitive match on session id, phone or user name
        #[arg(long)]
        search: Option<String>,

        /// active, completed, failed or all
        #[arg(long)]
        status: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long)]
        json: bool,
    },

    /// Show one session with its transcript and summary
    Session {
        id: String,

        /// Transcript page
        #[arg(long, default_value_t = 1)]
        page: i64,

        #[arg(long)]
        json: bool,
    },

    /// Show seat availability per program
    Seats {
        #[arg(long)]
        json: bool,
    },

    /// Set the available seat count of one program
    SetSeats {
        program_id: String,

        /// Kept as text; the server validates it
        count: String,

        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct Duration {
    pub minutes: i64,
    pub seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct UserRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRow {
    pub id: String,
    pub user_phone: Option<String>,
    pub status: String,
    pub start_time: String,
    pub channel: String,
    pub duration: Option<Duration>,
    pub user: Option<UserRef>,
}

#[derive(Debug, Deserialize)]
pub struct UserRow {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub session_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub sender: String,
    pub text: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionDetail {
    pub session: SessionRow,
    pub messages: Vec<Message>,
    pub message_page: i64,
    pub summary: Option<Summary>,
}

#[derive(Debug, Deserialize)]
pub struct Seat {
    pub program_id: String,
    pub program: String,
    pub campus: String,
    pub quota: i32,
    pub available: i32,
    pub last_updated: String,
}

#[derive(Debug, Deserialize)]
pub struct SeatList {
    pub seats: Vec<Seat>,
}

// ============================================================================
// Text Output
// ============================================================================

/// Truncate to `max` chars, marking the cut with "…".
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn format_duration(d: Option<&Duration>) -> String {
    match d {
        Some(d) => format!("{}m {}s", d.minutes, d.seconds),
        None => "-".to_string(),
    }
}

/// Timestamps print as `YYYY-MM-DD HH:MM`.
pub fn format_time(ts: &str) -> String {
    let t = ts.replacen('T', " ", 1);
    t.chars().take(16).collect()
}

pub fn format_session_row(s: &SessionRow) -> String {
    let who = match (&s.user, &s.user_phone) {
        (Some(u), _) => u.name.clone(),
        (None, Some(phone)) => phone.clone(),
        (None, None) => "-".to_string(),
    };
    format!(
        "{:<36}  {:<20}  {:<9}  {:<8}  {:<16}  {}",
        s.id,
        truncate(&who, 20),
        s.status,
        s.channel,
        format_time(&s.start_time),
        format_duration(s.duration.as_ref()),
    )
}

pub fn format_user_row(u: &UserRow) -> String {
    format!(
        "{:<24}  {:<16}  {:<28}  {}",
        truncate(&u.name, 24),
        u.phone,
        truncate(u.email.as_deref().unwrap_or("-"), 28),
        u.session_count,
    )
}

pub fn format_seat_row(s: &Seat) -> String {
    format!(
        "{:<10}  {:<26}  {:<10}  {:>4}/{:<4}  {}",
        s.program_id,
        truncate(&s.program, 26),
        s.campus,
        s.available,
        s.quota,
        format_time(&s.last_updated),
    )
}

pub fn page_footer<T>(p: &Page<T>) -> String {
    format!("Page {} of {} ({} total)", p.page, p.page_count, p.total)
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}

/// Send a request and return the JSON body, exiting on transport or HTTP errors.
fn fetch(req: reqwest::blocking::RequestBuilder, url: &str) -> anyhow::Result<serde_json::Value> {
    let resp = match req.send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("agentdesk-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    let status = resp.status();
    let body: serde_json::Value = resp.json().unwrap_or_default();
    if !status.is_success() {
        let msg = body["error"].as_str().unwrap_or("request failed");
        eprintln!("agentdesk-cli: server returned {}: {}", status, msg);
        std::process::exit(1);
    }
    Ok(body)
}

fn get(server: &str, path: &str, query: &[(&str, String)]) -> anyhow::Result<serde_json::Value> {
    let url = format!("{}{}", server, path);
    let req = client()?.get(&url).query(query);
    fetch(req, &url)
}

fn print_json(body: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}

fn do_status(server: &str, json: bool) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let resp = client()?.get(&url).send();

    match resp {
        Ok(r) => {
            let healthy = r.status().is_success();
            let body: serde_json::Value = r.json().unwrap_or_default();
            if json {
                print_json(&body)?;
            } else {
                println!("AgentDesk server: {}", body["status"].as_str().unwrap_or("unknown"));
                println!("Version:          {}", body["version"].as_str().unwrap_or("?"));
                println!("Backend:          {}", body["backend"].as_str().unwrap_or("?"));
                match body["backend_version"].as_str() {
                    Some(v) => println!("Backend version:  {}", v),
                    None => println!("Error:            {}", body["error"].as_str().unwrap_or("?")),
                }
            }
            if !healthy {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("agentdesk-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn do_users(server: &str, search: Option<String>, page: usize, json: bool) -> anyhow::Result<()> {
    let mut query = vec![("page", page.to_string())];
    if let Some(s) = search {
        query.push(("search", s));
    }
    let body = get(server, "/api/users", &query)?;
    if json {
        return print_json(&body);
    }

    let users: Page<UserRow> = serde_json::from_value(body)?;
    if users.items.is_empty() {
        eprintln!("No users found");
        return Ok(());
    }
    for u in &users.items {
        println!("{}", format_user_row(u));
    }
    println!("\n{}", page_footer(&users));
    Ok(())
}

fn do_sessions(
    server: &str,
    search: Option<String>,
    status: Option<String>,
    page: usize,
    json: bool,
) -> anyhow::Result<()> {
    let mut query = vec![("page", page.to_string())];
    if let Some(s) = search {
        query.push(("search", s));
    }
    if let Some(s) = status {
        query.push(("status", s));
    }
    let body = get(server, "/api/sessions", &query)?;
    if json {
        return print_json(&body);
    }

    let sessions: Page<SessionRow> = serde_json::from_value(body)?;
    if sessions.items.is_empty() {
        eprintln!("No sessions found");
        return Ok(());
    }
    for s in &sessions.items {
        println!("{}", format_session_row(s));
    }
    println!("\n{}", page_footer(&sessions));
    Ok(())
}

fn do_session(server: &str, id: &str, page: i64, json: bool) -> anyhow::Result<()> {
    let body = get(server, &format!("/api/sessions/{}", id), &[("page", page.to_string())])?;
    if json {
        return print_json(&body);
    }

    let detail: SessionDetail = serde_json::from_value(body)?;
    println!("{}", format_session_row(&detail.session));
    println!();
    match &detail.summary {
        Some(s) => println!("Summary ({}):\n  {}\n", s.model, s.summary),
        None => println!("Summary: not generated yet\n"),
    }
    if detail.messages.is_empty() {
        println!("No messages on page {}", detail.message_page);
    }
    for m in &detail.messages {
        println!("[{}] {:<5}  {}", format_time(&m.created_at), m.sender, m.text);
    }
    Ok(())
}

fn do_seats(server: &str, json: bool) -> anyhow::Result<()> {
    let body = get(server, "/api/seats", &[])?;
    if json {
        return print_json(&body);
    }

    let list: SeatList = serde_json::from_value(body)?;
    for s in &list.seats {
        println!("{}", format_seat_row(s));
    }
    Ok(())
}

fn do_set_seats(server: &str, program_id: &str, count: &str, json: bool) -> anyhow::Result<()> {
    let url = format!("{}/api/seats/{}", server, program_id);
    let req = client()?
        .patch(&url)
        .json(&serde_json::json!({ "available": count }));
    let body = fetch(req, &url)?;
    if json {
        return print_json(&body);
    }

    println!("{}", body["message"].as_str().unwrap_or("Updated"));
    let seat: Seat = serde_json::from_value(body["seat"].clone())?;
    println!("{}", format_seat_row(&seat));
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Status { json } => do_status(&server, json),
        Commands::Users { search, page, json } => do_users(&server, search, page, json),
        Commands::Sessions {
            search,
            status,
            page,
            json,
        } => do_sessions(&server, search, status, page, json),
        Commands::Session { id, page, json } => do_session(&server, &id, page, json),
        Commands::Seats { json } => do_seats(&server, json),
        Commands::SetSeats {
            program_id,
            count,
            json,
        } => do_set_seats(&server, &program_id, &count, json),
    };

    if let Err(e) = result {
        eprintln!("agentdesk-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
