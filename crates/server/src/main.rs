//! mcp-search server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::path::Path;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use fathom_core::{AppConfig, StoreDb};

mod handler;
mod tools;

/// Open the backing store and sweep out rows that expired in earlier runs.
///
/// Expiry is otherwise lazy (reads filter on it but never delete), so the
/// startup sweep is what keeps the store file from growing across restarts.
/// A missing store disables caching and rate limiting; requests still go
/// through.
async fn open_store(path: &Path) -> Option<StoreDb> {
    let db = match StoreDb::open(path).await {
        Ok(db) => db,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "store unavailable, caching and rate limiting disabled");
            return None;
        }
    };

    match db.purge_expired().await {
        Ok(purged) => tracing::debug!(purged, "expired store entries purged"),
        Err(e) => tracing::warn!(error = %e, "startup purge failed"),
    }

    Some(db)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!("Starting mcp-search server on stdio transport");

    let config = AppConfig::load()?;
    let store = open_store(&config.db_path).await;

    let handler = handler::SearchServer::new(&config, store)?;
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
