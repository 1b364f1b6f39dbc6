//! Folio Server
//!
//! HTTP front end for the extraction job store. Accepts document uploads,
//! runs them through an extraction engine, and serves the resulting tables
//! until the retention sweeper reclaims them.
//!
//! | route | operation |
//! |---|---|
//! | `POST /upload` | run an extraction, returns the job id and summary |
//! | `GET /status/:id` | summary of a live job |
//! | `GET /download/:id` | every artifact as a zip archive |
//! | `GET /download_csv/:id/:filename` | one artifact |
//! | `GET\|POST /cleanup` | evict expired jobs now |
//! | `GET /health` | liveness and live job count |

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod orchestrator;
mod upload;

use config::ServerConfig;
use folio_engine::{EngineError, ExtractionEngine, MockEngine, RemoteEngine};
use folio_janitor::JanitorWorker;
use folio_store::JobStore;
use handlers::{create_router, AppState};
use orchestrator::Orchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Engine could not be constructed
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Server binding or directory setup error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber (`RUST_LOG`, default `info`)
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

/// Build the engine named by the configuration
///
/// Without an endpoint the mock engine is used, which is only useful for
/// local development.
pub fn build_engine(config: &ServerConfig) -> Result<Arc<dyn ExtractionEngine>, ServerError> {
    let engine_config = &config.engine;
    match &engine_config.endpoint {
        Some(endpoint) => {
            let engine = RemoteEngine::with_timeout(
                endpoint.clone(),
                engine_config.output_dir.clone(),
                Duration::from_secs(engine_config.timeout_secs),
            )?
            .with_max_retries(engine_config.max_retries);
            info!("Extraction engine: {}", engine.endpoint());
            Ok(Arc::new(engine))
        }
        None => {
            tracing::warn!("No engine endpoint configured, using the mock engine");
            Ok(Arc::new(MockEngine::new(engine_config.output_dir.clone())))
        }
    }
}

/// Build the application state for `config` around `engine`
pub fn build_state(config: &ServerConfig, engine: Arc<dyn ExtractionEngine>) -> AppState {
    let store = Arc::new(JobStore::new());
    AppState {
        orchestrator: Arc::new(Orchestrator::new(engine, store, config)),
        max_upload_bytes: config.max_upload_bytes,
    }
}

/// Start the Folio HTTP server
///
/// Validates configuration, prepares directories, starts the background
/// sweeper when enabled and serves until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;

    info!("Starting Folio server");
    info!("Bind address: {}", config.bind_addr());
    info!("Retention: {} seconds", config.janitor.retention_secs);

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.engine.output_dir).await?;

    let engine = build_engine(&config)?;
    let state = build_state(&config, engine);

    let shutdown = CancellationToken::new();
    let worker = if config.janitor.background_sweep {
        let worker = JanitorWorker::new(state.orchestrator.janitor().clone(), &config.janitor);
        let token = shutdown.clone();
        Some(tokio::spawn(async move { worker.run(token).await }))
    } else {
        info!("Background sweep disabled; use /cleanup");
        None
    };

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Folio listening on {}", config.bind_addr());

    let signal = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
            signal.cancel();
        })
        .await
        .map_err(|e| ServerError::Server(e.to_string()));

    shutdown.cancel();
    if let Some(handle) = worker {
        if let Err(e) = handle.await {
            tracing::error!("Janitor worker ended abnormally: {}", e);
        }
    }

    served
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_engine_without_endpoint() {
        let config = ServerConfig::default();
        assert!(build_engine(&config).is_ok());
    }

    #[test]
    fn test_remote_engine_with_endpoint() {
        let mut config = ServerConfig::default();
        config.engine.endpoint = Some("http://127.0.0.1:7000".to_string());
        assert!(build_engine(&config).is_ok());
    }

    #[test]
    fn test_build_state_carries_limit() {
        let config = ServerConfig {
            max_upload_bytes: 1024,
            ..ServerConfig::default()
        };
        let engine = build_engine(&config).unwrap();
        let state = build_state(&config, engine);
        assert_eq!(state.max_upload_bytes, 1024);
        assert_eq!(state.orchestrator.job_count(), 0);
    }
}
