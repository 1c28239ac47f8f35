//! tutor-gateway entrypoint.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use tutor_common::{init_logging, Config};
use tutor_core::{BackendClient, Dispatcher, HttpBackend, MemoryBackend, SessionStore};
use tutor_gateway::{build_router, AppState};

#[derive(Parser)]
#[command(name = "tutor-gateway", about = "Webhook gateway for the tutor assistant")]
struct Args {
    /// Path to a config file (defaults to ~/.tutor/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_with_env()?,
    };
    init_logging(&config.logging.level, &config.logging.format);

    let backend: Arc<dyn BackendClient> = match &config.backend.base_url {
        Some(base_url) => Arc::new(HttpBackend::new(
            base_url,
            Duration::from_secs(config.backend.timeout_secs),
        )),
        None => {
            tracing::warn!("no backend URL configured; using the seeded in-memory catalog");
            Arc::new(MemoryBackend::with_demo_data())
        }
    };

    let catalog = Arc::new(tutor_actions::build_catalog());
    let state = AppState {
        dispatcher: Arc::new(Dispatcher::new(catalog, backend)),
        sessions: Arc::new(SessionStore::new()),
    };

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address()))?;
    tracing::info!(%addr, "tutor gateway listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, build_router(state))
        .await
        .context("Server error")?;

    Ok(())
}
