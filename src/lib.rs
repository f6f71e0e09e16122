//! codeshot - chat service that renders code snippets and diagrams to images
//!
//! A hosted model picks what to illustrate, external renderers produce PNGs,
//! and an artifact store publishes them locally or to S3.

pub mod agent;
pub mod api;
pub mod artifacts;
pub mod config;
pub mod generator;
pub mod render;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use agent::{Agent, LlmPlanner, SnippetPlanner};
use api::AppState;
use artifacts::build_store;
use config::{Config, StorageBackend};
use generator::ContentGenerator;

/// The codeshot server instance
pub struct Server {
    config: Config,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance backed by the configured model
    pub async fn new(config: Config) -> Result<Self> {
        let planner = LlmPlanner::new(&config.agent)?;
        if !planner.is_configured() {
            warn!("No model API key configured; chat requests will fail");
        }
        Self::with_planner(config, Arc::new(planner)).await
    }

    /// Create a server with a specific planner
    pub async fn with_planner(config: Config, planner: Arc<dyn SnippetPlanner>) -> Result<Self> {
        let store = build_store(&config.storage).await?;
        let generator = ContentGenerator::new(config.renderer.clone(), store);
        let agent = Agent::new(planner, generator.clone(), config.agent.max_snippets);

        let public_dir = match config.storage.backend {
            StorageBackend::Local => Some(config.storage.public_dir.clone()),
            StorageBackend::S3 => None,
        };
        let state = AppState {
            agent,
            generator,
            public_dir,
            image_prefix: config.storage.url_prefix.clone(),
            request_timeout: config.server.request_timeout(),
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            state,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Build the router
    pub fn router(&self) -> Router {
        api::router(self.state.clone())
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.server.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("codeshot listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("codeshot shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.server.bind_addr
    }
}
