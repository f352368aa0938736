use std::fmt;
use std::str::FromStr;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::error::AgentDeskError;

/// Environment variable holding the backend service URL.
pub const DATABASE_URL_ENV: &str = "AGENTDESK_DATABASE_URL";

/// Environment variable holding the backend access key.
pub const ACCESS_KEY_ENV: &str = "AGENTDESK_ACCESS_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AgentDeskConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Which `Store` implementation backs the data access layer.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Postgres,
    Fixtures,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: BackendKind,
    pub max_connections: u32,
    /// Directory of `<table>.json` files, read when `backend = "fixtures"`.
    pub fixtures_dir: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Postgres,
            max_connections: 5,
            fixtures_dir: "fixtures".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Keep the seat list in memory between requests until a write invalidates it.
    pub seat_cache: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8780,
            seat_cache: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
    pub recent_sessions: i64,
    pub message_page_size: i64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 8,
            recent_sessions: 5,
            message_page_size: 50,
        }
    }
}

impl AgentDeskConfig {
    /// Load `path` (optional) and overlay `AGENTDESK__SECTION__KEY` variables.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("AGENTDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        s.try_deserialize()
    }
}

/// Service URL + access key for the Postgres backend.
#[derive(Clone)]
pub struct BackendCredentials {
    url: String,
    access_key: String,
}

impl BackendCredentials {
    pub fn from_env() -> Result<Self, AgentDeskError> {
        Self::from_values(
            std::env::var(DATABASE_URL_ENV).ok(),
            std::env::var(ACCESS_KEY_ENV).ok(),
        )
    }

    /// Validate both values. Blank counts as missing.
    pub fn from_values(
        url: Option<String>,
        access_key: Option<String>,
    ) -> Result<Self, AgentDeskError> {
        let url = url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(AgentDeskError::MissingCredential(DATABASE_URL_ENV))?;
        let access_key = access_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AgentDeskError::MissingCredential(ACCESS_KEY_ENV))?;

        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(AgentDeskError::InvalidDatabaseUrl {
                url: redact_url(&url),
                reason: "expected a postgres:// or postgresql:// URL".to_string(),
            });
        }
        if let Err(e) = PgConnectOptions::from_str(&url) {
            return Err(AgentDeskError::InvalidDatabaseUrl {
                url: redact_url(&url),
                reason: e.to_string(),
            });
        }

        Ok(Self { url, access_key })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connection options with the access key applied as the password.
    pub fn connect_options(&self) -> Result<PgConnectOptions, AgentDeskError> {
        let options = PgConnectOptions::from_str(&self.url).map_err(|e| {
            AgentDeskError::InvalidDatabaseUrl {
                url: redact_url(&self.url),
                reason: e.to_string(),
            }
        })?;
        Ok(options.password(&self.access_key))
    }
}

/// `raw` with any inline password masked. Unparseable input is not echoed at all.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparseable url>".to_string(),
    }
}

impl fmt::Debug for BackendCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendCredentials")
            .field("url", &redact_url(&self.url))
            .field("access_key", &"<redacted>")
            .finish()
    }
}
