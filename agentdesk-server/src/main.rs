use std::sync::Arc;

use agentdesk_core::{AgentDeskConfig, Repository};
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use agentdesk_server::http::{self, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "agentdesk.toml")]
    config: String,

    /// Probe the configured backend and exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience; production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match AgentDeskConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging: RUST_LOG wins over service.log_level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    // Missing credentials are fatal before anything is served
    let store = match agentdesk_core::create_store(&config).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialise {:?} backend: {}", config.database.backend, e);
            std::process::exit(1);
        }
    };
    let repo = Repository::new(Arc::from(store));

    if args.health {
        match repo.health().await {
            Ok(v) => println!("✅ {} backend reachable: {}", repo.backend_name(), v),
            Err(e) => {
                println!("❌ {} backend check failed: {}", repo.backend_name(), e);
                std::process::exit(1);
            }
        }
        println!("✅ AgentDesk health check passed");
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    tracing::info!(backend = repo.backend_name(), "AgentDesk starting");
    let state = Arc::new(HttpState::new(repo, config));
    http::start_http_server(state, tx.subscribe()).await?;

    Ok(())
}
