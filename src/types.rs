//! Core types used throughout CryptoCorr
//!
//! Defines price samples, tracked assets and lookback windows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Milliseconds in one UTC day
pub const MS_PER_DAY: i64 = 86_400_000;

/// A single (timestamp, price) observation as returned by the data source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Price in USD
    pub price: f64,
}

impl PriceSample {
    pub fn new(timestamp: i64, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Samples for one asset in source order. May contain duplicate or
/// irregularly spaced timestamps.
pub type PriceSeries = Vec<PriceSample>;

/// Pair key (see [`pair_key`]) -> correlation coefficient
pub type CorrelationResult = BTreeMap<String, f64>;

/// A tracked asset: data-source identifier plus display symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetSpec {
    /// CoinGecko coin id (e.g., "bitcoin")
    pub id: String,
    /// Display symbol (e.g., "BTC")
    pub symbol: String,
}

impl AssetSpec {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for AssetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.symbol)
    }
}

/// A named lookback window (e.g., "30d" covering 30 days)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindow {
    pub name: String,
    pub days: u32,
}

impl LookbackWindow {
    pub fn new(name: impl Into<String>, days: u32) -> Self {
        Self {
            name: name.into(),
            days,
        }
    }
}

impl fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Key used in correlation results: lower-case `<ref>_<target>` symbols
pub fn pair_key(reference: &AssetSpec, target: &AssetSpec) -> String {
    format!(
        "{}_{}",
        reference.symbol.to_lowercase(),
        target.symbol.to_lowercase()
    )
}
