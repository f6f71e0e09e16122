//! codeshot - chat service that renders code snippets and diagrams

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use codeshot::config::{Config, StorageBackend};
use codeshot::Server;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// codeshot server
#[derive(Parser, Debug)]
#[command(name = "codeshot", version, about = "Render code snippets and diagrams for chat")]
struct Args {
    /// Path to TOML config file (ignored if missing)
    #[arg(short, long, default_value = "codeshot.toml")]
    config: PathBuf,

    /// Address to listen on, overrides the config file
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Artifact store backend: local or s3
    #[arg(long)]
    storage: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "codeshot=info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(args.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!args.log_json).then(tracing_subscriber::fmt::layer))
        .init();

    let mut config = Config::load(Some(&args.config))?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    if let Some(storage) = args.storage.as_deref() {
        config.storage.backend = StorageBackend::from_str(storage)
            .ok_or_else(|| anyhow!("unknown storage backend: {}", storage))?;
    }
    info!("Using {:?} artifact store", config.storage.backend);

    // Create and run server
    let server = Arc::new(Server::new(config).await?);

    let signal_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            signal_server.shutdown();
        }
    });

    server.run().await?;

    Ok(())
}
