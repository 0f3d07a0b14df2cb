//! Deepstate MCP Server
//!
//! This binary runs a virtual agent workspace as an MCP server over stdio.
//! It exposes the built-in workspace tools (`ls`, `read_file`, `write_file`,
//! `edit_file`, `write_todos`) over one shared in-memory workspace.

use std::path::PathBuf;

use clap::Parser;
use deepstate::FileStore;
use deepstate_mcp::{DeepstateServer, load_seed};
use rmcp::ServiceExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "deepstate-mcp")]
#[command(about = "Serve a virtual agent workspace over MCP stdio")]
struct Args {
    /// JSON object of path to content loaded into the workspace at startup
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing - output to stderr so it doesn't interfere with MCP stdio
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();

    let files = match &args.seed {
        Some(path) => load_seed(path)?,
        None => FileStore::new(),
    };
    tracing::info!(files = files.len(), "Starting Deepstate MCP server");

    let server = DeepstateServer::new(files);

    // Serve over stdio
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("Failed to start MCP service: {}", e);
        })?;

    tracing::info!("Deepstate MCP server running");

    service.waiting().await?;

    tracing::info!("Deepstate MCP server shutting down");

    Ok(())
}
