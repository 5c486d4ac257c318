//! huginnd, the Huginn daemon.
//!
//! Serves the [`LookupService`](huginn::LookupService) over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use huginn::server::{self, Config};

/// Huginn daemon: cached search and stream resolution service.
#[derive(Parser)]
#[command(name = "huginnd")]
#[command(version = huginn::PKG_VERSION)]
#[command(about = "Huginn search and stream lookup daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "HUGINN_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Address to bind to, overriding the config file.
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(address) = args.address {
        config.server.address = address;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    // Parse address
    let addr: SocketAddr = config.server.address.parse().map_err(|e| {
        huginn::HuginnError::Configuration(format!("Invalid address: {e}"))
    })?;

    let service = Arc::new(config.builder().build()?);

    info!(
        version = huginn::version_string(),
        %addr,
        extractor = service.extractor_name(),
        "huginnd starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::serve(listener, Arc::clone(&service), shutdown_signal()).await?;

    info!("draining worker pools");
    service.shutdown().await;
    info!("huginnd stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to install Ctrl+C handler");
    }
}
