//! Market data module - Historical daily prices
//!
//! A [`PriceFetcher`] returns the price history of one asset over a
//! lookback window. Every request passes through a [`RateLimiter`] first.

mod coingecko;
pub mod rate_limit;

pub use coingecko::{parse_market_chart, CoinGeckoClient, CoinGeckoConfig};
pub use rate_limit::{FixedDelay, NoDelay, RateLimiter, REQUEST_DELAY};

use async_trait::async_trait;
use thiserror::Error;

use crate::types::PriceSeries;

/// Why a price history could not be retrieved
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Trait for historical price sources
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Fetch `days` of daily prices for `asset_id`, oldest first
    async fn fetch(&self, asset_id: &str, days: u32) -> Result<PriceSeries, FetchError>;
}
