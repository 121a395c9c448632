//! stash-worker entry point.
//!
//! Boots the worker for the configured release, then serves the MCP tools on
//! stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use stash_client::{FetchClient, FetchConfig, RemoteUpdateCheck};
use stash_core::{AppConfig, CacheDb, Worker};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    tracing::info!(tag = %config.version_tag, origin = %config.origin, db = %config.db_path.display(), "starting stash-worker on stdio transport");

    let cache = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;

    let mut worker = Worker::new(&config, Arc::new(cache.clone()), Arc::new(network))?;
    if let Some(update_url) = &config.update_url {
        worker = worker.with_update_check(Arc::new(RemoteUpdateCheck::new(update_url, &config.user_agent)?));
    }
    let worker = Arc::new(worker);

    match worker.start().await {
        Ok(state) => tracing::info!(%state, "worker ready"),
        Err(e) => tracing::error!(error = %e, "worker failed to start; requests pass through"),
    }

    let handler = handler::StashServer::new(worker.clone(), cache);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    worker.wait_until_idle().await;

    Ok(())
}
