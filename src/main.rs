use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weather_uv_server::{router, AppState, Config, FileCacheStore, WeatherAggregator};

/// Weather and UV index HTTP service
#[derive(Parser)]
#[command(name = "weather-uv-server", version, about)]
struct Cli {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Cache document path (overrides WEATHER_CACHE_PATH)
    #[arg(long)]
    cache_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_uv_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(cache_path) = cli.cache_path {
        config.cache_path = cache_path;
    }

    tracing::info!(
        "Weather token configured: {}, UV token configured: {}",
        config.weather_token.is_some(),
        config.uv_token.is_some()
    );
    if config.weather_token.is_none() || config.uv_token.is_none() {
        tracing::warn!("Missing upstream token; stale requests will likely be rejected upstream");
    }
    tracing::info!(
        "Cache at {} ({}s), allowed cities: {}",
        config.cache_path.display(),
        config.max_cache_seconds,
        config.allowed_cities.join(", ")
    );

    let addr = config.bind_address();
    let store = Arc::new(FileCacheStore::new(config.cache_path.clone()));
    let aggregator = WeatherAggregator::new(config, store)?;
    let app = router(Arc::new(AppState { aggregator }));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
