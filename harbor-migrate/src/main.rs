//! harbor-migrate - yacht listing migration service
//!
//! Serves `POST /migrate` (listing URL → canonical yacht record) and
//! `GET /health`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use harbor_migrate::config::MigratorConfig;
use harbor_migrate::{build_router, AppState, MigrationOrchestrator};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "harbor-migrate", version, about = "Yacht listing migration service")]
struct Args {
    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config file)
    #[arg(long, env = "HARBOR_HOST")]
    host: Option<String>,

    /// Port (overrides config file)
    #[arg(long, env = "HARBOR_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = MigratorConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting harbor-migrate v{}", env!("CARGO_PKG_VERSION"));
    info!("Scraper: {}", config.scraper_url);
    info!("Image storage: {}", config.storage_url);
    info!(
        "Deadline: {}s, image workers: {}",
        config.deadline().as_secs(),
        config.images.effective_concurrency()
    );

    let orchestrator =
        MigrationOrchestrator::from_config(&config).context("initializing migration pipeline")?;
    let app = build_router(AppState::new(orchestrator));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    info!("Listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app).await.context("serving HTTP")?;

    Ok(())
}
