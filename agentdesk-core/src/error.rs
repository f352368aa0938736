use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentDeskError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fixture error in {file}: {source}")]
    Fixture {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing backend credential: set {0}")]
    MissingCredential(&'static str),

    #[error("Invalid database URL {url}: {reason}. Please check AGENTDESK_DATABASE_URL")]
    InvalidDatabaseUrl { url: String, reason: String },

    #[error("Other error: {0}")]
    Other(String),
}
