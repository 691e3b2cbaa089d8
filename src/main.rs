// src/main.rs
// =============================================================================
// This is the entry point of our backend service.
//
// What happens here:
// 1. Parse configuration (flags and environment variables)
// 2. Initialize logging
// 3. Create the storage directories and the shared state
// 4. Spawn the janitor that expires old temp files
// 5. Bind the listener and serve the router until shutdown
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli; // src/cli.rs - configuration
mod crawl; // src/crawl/ - breadth-first image crawling
mod download; // src/download/ - batch image downloads and zip bundles
mod generate; // src/generate/ - image generation API client
mod janitor; // src/janitor/ - temp storage cleanup
mod server; // src/server/ - HTTP facade

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Config;
use server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tokio::fs::create_dir_all(&config.temp_dir)
        .await
        .with_context(|| format!("failed to create {}", config.temp_dir.display()))?;
    tokio::fs::create_dir_all(&config.zip_dir)
        .await
        .with_context(|| format!("failed to create {}", config.zip_dir.display()))?;

    let bind = config.bind.clone();
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    let entry_ttl = Duration::from_secs(config.entry_ttl_secs);
    let swept_dirs = vec![config.temp_dir.clone(), config.zip_dir.clone()];

    let state = AppState::new(config).await?;

    // The janitor runs for the lifetime of the process, independently of
    // request handling
    tokio::spawn(janitor::run(swept_dirs, sweep_interval, entry_ttl));

    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("snapcrawl listening on http://{bind}");

    axum::serve(listener, app).await.context("server shutdown")?;
    Ok(())
}
