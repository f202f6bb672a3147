use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cacao::{
    config::Config,
    geo::{GeoCache, GeoProxy},
    photos::PhotoPipeline,
    utils::SystemClock,
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "cacao")]
#[command(version)]
#[command(about = "Tasting catalogue service: cached geocoding proxy and photo uploads")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("cacao={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cacao v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    let clock = Arc::new(SystemClock);
    let cache = Arc::new(GeoCache::new(config.geocoding.sweep_every, clock.clone()));
    let geo = Arc::new(GeoProxy::new(&config.geocoding, cache)?);
    info!(
        "Geocoding proxy initialized (ttl {}s, sweep every {} writes)",
        config.geocoding.cache_ttl_secs, config.geocoding.sweep_every
    );

    let photos = Arc::new(PhotoPipeline::new(
        config.photos.clone(),
        &config.storage,
        clock,
    )?);
    info!(
        "Photo pipeline initialized (uploads configured: {})",
        photos.is_upload_configured()
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Received Ctrl+C, shutting down gracefully");
        signal_token.cancel();
    });

    let web_server = WebServer::new(
        &config,
        AppState {
            geo,
            photos,
            shutdown,
        },
    )?;

    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}
