use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use brixspark_catalog::config::Config;
use brixspark_catalog::web;
use brixspark_catalog::wordpress::ContentGateway;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting brixspark-catalog");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        wordpress_url = %config.wordpress_url,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        cache_max_entries = config.cache_max_entries,
        "Configuration loaded"
    );

    let gateway = ContentGateway::new(&config).context("Failed to create WordPress gateway")?;
    if !gateway.cache().is_enabled() {
        info!("Response cache disabled (CACHE_TTL_SECS or CACHE_MAX_ENTRIES is 0)");
    }

    web::serve(config, gateway).await
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,brixspark_catalog=debug"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
