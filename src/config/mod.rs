//! Configuration management for CryptoCorr
//!
//! Loads built-in defaults, optional TOML/YAML/JSON files and environment
//! variables (via .env).

mod types;

pub use types::*;

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

use crate::market_data::CoinGeckoConfig;
use crate::pipeline::{PipelineConfig, PipelineConfigError};

/// Tracked assets and windows. Tables are awkward to express through
/// `set_default`, so they ship as an embedded document.
const DEFAULT_COLLECTOR: &str = r#"
[collector]
reference_asset = "nillion"

[[collector.assets]]
id = "bitcoin"
symbol = "BTC"

[[collector.assets]]
id = "ethereum"
symbol = "ETH"

[[collector.assets]]
id = "nillion"
symbol = "NIL"

[[collector.assets]]
id = "mind-network"
symbol = "MIND"

[[collector.windows]]
name = "30d"
days = 30

[[collector.windows]]
name = "90d"
days = 90
"#;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub collector: CollectorConfig,
    pub coingecko: CoinGeckoSettings,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from defaults, config files and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::defaults_builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (CRYPTOCORR__*)
            .add_source(Environment::with_prefix("CRYPTOCORR").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Built-in defaults only, ignoring files and environment
    pub fn defaults() -> Result<Self> {
        Self::from_builder(Self::defaults_builder()?)
    }

    /// Built-in defaults overlaid with a TOML document
    pub fn from_toml(overrides: &str) -> Result<Self> {
        Self::from_builder(
            Self::defaults_builder()?.add_source(File::from_str(overrides, FileFormat::Toml)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    fn defaults_builder() -> Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_COLLECTOR, FileFormat::Toml))
            // CoinGecko defaults
            .set_default("coingecko.base_url", "https://api.coingecko.com/api/v3")?
            .set_default("coingecko.vs_currency", "usd")?
            .set_default("coingecko.timeout_secs", 30)?
            // Persistence defaults
            .set_default("persistence.output_dir", "data/correlation")?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?;
        Ok(builder)
    }

    /// Immutable run configuration for the pipeline
    pub fn pipeline_config(&self) -> Result<PipelineConfig, PipelineConfigError> {
        PipelineConfig::new(
            self.collector.assets.clone(),
            self.collector.reference_asset.clone(),
            self.collector.windows.clone(),
        )
    }

    /// HTTP settings for the CoinGecko client
    pub fn coingecko_config(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            base_url: self.coingecko.base_url.clone(),
            vs_currency: self.coingecko.vs_currency.clone(),
            timeout: Duration::from_secs(self.coingecko.timeout_secs),
        }
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        let assets: Vec<&str> = self
            .collector
            .assets
            .iter()
            .map(|a| a.symbol.as_str())
            .collect();
        let windows: Vec<&str> = self
            .collector
            .windows
            .iter()
            .map(|w| w.name.as_str())
            .collect();
        format!(
            "assets={:?} reference={} windows={:?} out={}",
            assets,
            self.collector.reference_asset,
            windows,
            self.persistence.output_dir
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
