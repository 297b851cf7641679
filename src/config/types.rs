//! Configuration section types

use serde::Deserialize;

use crate::types::{AssetSpec, LookbackWindow};

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Tracked assets in fetch order
    pub assets: Vec<AssetSpec>,
    /// Asset id every other asset is correlated against
    pub reference_asset: String,
    /// Lookback windows, processed in order
    pub windows: Vec<LookbackWindow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinGeckoSettings {
    /// API base URL
    pub base_url: String,
    /// Quote currency
    pub vs_currency: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Directory for raw, aligned and correlation JSON files
    pub output_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}
