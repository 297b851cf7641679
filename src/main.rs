//! CryptoCorr collector
//!
//! Fetches daily prices for every configured window, aligns them and
//! writes return correlations against the reference asset.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cryptocorr::config::{AppConfig, LoggingConfig};
use cryptocorr::market_data::{CoinGeckoClient, FixedDelay, REQUEST_DELAY};
use cryptocorr::persistence::JsonPersistence;
use cryptocorr::pipeline::CorrelationPipeline;

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging);

    info!("Starting cryptocorr v{}", env!("CARGO_PKG_VERSION"));
    info!("Config: {}", config);

    let pipeline_config = config
        .pipeline_config()
        .context("Invalid collector configuration")?;

    let limiter = Arc::new(FixedDelay::new(REQUEST_DELAY));
    let fetcher = CoinGeckoClient::new(config.coingecko_config(), limiter)
        .context("Failed to build CoinGecko client")?;
    let persistence = JsonPersistence::new(&config.persistence.output_dir)?;

    let pipeline = CorrelationPipeline::new(pipeline_config, fetcher, persistence);
    let summary = pipeline.run().await;

    for report in &summary.reports {
        info!(
            window = %report.window,
            failed = ?report.failed_assets,
            "{}",
            report.outcome
        );
    }

    info!(
        completed = summary.completed(),
        windows = summary.reports.len(),
        "Data collection complete!"
    );
    Ok(())
}
