//! Folio server binary
//!
//! Starts the HTTP server for document extraction jobs.

use anyhow::Context;
use clap::Parser;
use folio_server::{config::ServerConfig, init_tracing, start_server};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Folio - extraction job store and artifact server
#[derive(Parser, Debug)]
#[command(name = "folio-server", version, about)]
struct Cli {
    /// Load configuration from TOML file
    #[arg(short, long, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind address (e.g., 0.0.0.0:5000)
    #[arg(long, env = "FOLIO_BIND")]
    bind: Option<SocketAddr>,

    /// Override the extraction service endpoint
    #[arg(long, env = "FOLIO_ENGINE_ENDPOINT")]
    engine_endpoint: Option<String>,
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            tracing::warn!("No config file specified, using defaults");
            ServerConfig::default()
        }
    };

    if let Some(addr) = cli.bind {
        config.bind_address = addr.ip().to_string();
        config.bind_port = addr.port();
    }
    if let Some(endpoint) = cli.engine_endpoint {
        config.engine.endpoint = Some(endpoint);
    }

    start_server(config).await?;

    Ok(())
}
