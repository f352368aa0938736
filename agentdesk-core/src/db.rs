use crate::config::{BackendCredentials, DatabaseConfig};
use crate::error::AgentDeskError;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool(
    config: &DatabaseConfig,
    credentials: &BackendCredentials,
) -> Result<PgPool, AgentDeskError> {
    let options = credentials.connect_options()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}
