//! Correlation pipeline - fetch, align, correlate, persist
//!
//! Each lookback window runs independently: a failure in one window is
//! reported in its [`WindowReport`] and the next window still runs.

mod report;

pub use report::{RunSummary, WindowOutcome, WindowReport};

use anyhow::Result;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::analysis::{align_series, correlate};
use crate::market_data::PriceFetcher;
use crate::persistence::JsonPersistence;
use crate::types::{pair_key, AssetSpec, CorrelationResult, LookbackWindow, PriceSeries};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineConfigError {
    #[error("no assets configured")]
    NoAssets,
    #[error("no lookback windows configured")]
    NoWindows,
    #[error("asset {0} is configured more than once")]
    DuplicateAsset(String),
    #[error("symbol {0} is used by more than one asset")]
    DuplicateSymbol(String),
    #[error("reference asset {0} is not among the configured assets")]
    UnknownReference(String),
    #[error("window {0} must cover at least one day")]
    EmptyWindow(String),
}

/// Immutable run configuration: what to fetch and what to correlate against
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    assets: Vec<AssetSpec>,
    reference: usize,
    windows: Vec<LookbackWindow>,
}

impl PipelineConfig {
    pub fn new(
        assets: Vec<AssetSpec>,
        reference_asset: impl Into<String>,
        windows: Vec<LookbackWindow>,
    ) -> Result<Self, PipelineConfigError> {
        let reference_asset = reference_asset.into();

        if assets.is_empty() {
            return Err(PipelineConfigError::NoAssets);
        }
        if windows.is_empty() {
            return Err(PipelineConfigError::NoWindows);
        }

        let mut seen_ids = HashSet::new();
        let mut seen_symbols = HashSet::new();
        for asset in &assets {
            if !seen_ids.insert(asset.id.as_str()) {
                return Err(PipelineConfigError::DuplicateAsset(asset.id.clone()));
            }
            // Pair keys are built from lower-cased symbols
            let symbol = asset.symbol.to_lowercase();
            if !seen_symbols.insert(symbol.clone()) {
                return Err(PipelineConfigError::DuplicateSymbol(symbol));
            }
        }

        if let Some(window) = windows.iter().find(|w| w.days == 0) {
            return Err(PipelineConfigError::EmptyWindow(window.name.clone()));
        }

        let reference = assets
            .iter()
            .position(|a| a.id == reference_asset)
            .ok_or(PipelineConfigError::UnknownReference(reference_asset))?;

        Ok(Self {
            assets,
            reference,
            windows,
        })
    }

    pub fn assets(&self) -> &[AssetSpec] {
        &self.assets
    }

    pub fn reference(&self) -> &AssetSpec {
        &self.assets[self.reference]
    }

    pub fn windows(&self) -> &[LookbackWindow] {
        &self.windows
    }
}

/// Drives fetch → align → correlate → persist for every window
pub struct CorrelationPipeline<F: PriceFetcher> {
    config: PipelineConfig,
    fetcher: F,
    persistence: JsonPersistence,
}

impl<F: PriceFetcher> CorrelationPipeline<F> {
    pub fn new(config: PipelineConfig, fetcher: F, persistence: JsonPersistence) -> Self {
        Self {
            config,
            fetcher,
            persistence,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Process every configured window in order
    pub async fn run(&self) -> RunSummary {
        info!(
            source = self.fetcher.name(),
            assets = self.config.assets.len(),
            windows = self.config.windows.len(),
            reference = %self.config.reference().id,
            "Starting correlation run"
        );

        let mut reports = Vec::with_capacity(self.config.windows.len());
        for window in &self.config.windows {
            reports.push(self.run_window(window).await);
        }

        RunSummary { reports }
    }

    /// Fetch, align, correlate and persist a single window
    pub async fn run_window(&self, window: &LookbackWindow) -> WindowReport {
        info!(window = %window.name, days = window.days, "Fetching data for window");

        let (series, failed_assets) = self.fetch_all(window).await;
        let outcome = self.process_window(window, &series);

        match &outcome {
            WindowOutcome::Completed { .. } => {}
            WindowOutcome::PersistenceFailed { error } => {
                error!(window = %window.name, %error, "Failed to persist window artifacts")
            }
            other => warn!(window = %window.name, "Skipping correlation: {}", other),
        }

        WindowReport {
            window: window.name.clone(),
            failed_assets,
            outcome,
        }
    }

    /// Fetch each asset in configured order. Errors and empty responses
    /// mark the asset as failed.
    async fn fetch_all(
        &self,
        window: &LookbackWindow,
    ) -> (BTreeMap<String, PriceSeries>, Vec<String>) {
        let mut series = BTreeMap::new();
        let mut failed = Vec::new();

        for asset in &self.config.assets {
            info!(asset = %asset.id, window = %window.name, "Fetching price history");
            match self.fetcher.fetch(&asset.id, window.days).await {
                Ok(samples) if !samples.is_empty() => {
                    series.insert(asset.id.clone(), samples);
                }
                Ok(_) => {
                    warn!(asset = %asset.id, window = %window.name, "No price data returned");
                    failed.push(asset.id.clone());
                }
                Err(e) => {
                    warn!(asset = %asset.id, window = %window.name, error = %e, "Failed to fetch price history");
                    failed.push(asset.id.clone());
                }
            }
        }

        (series, failed)
    }

    fn process_window(
        &self,
        window: &LookbackWindow,
        series: &BTreeMap<String, PriceSeries>,
    ) -> WindowOutcome {
        if series.len() < 2 {
            return WindowOutcome::InsufficientData {
                succeeded: series.len(),
            };
        }

        let reference = self.config.reference();
        if !series.contains_key(&reference.id) {
            return WindowOutcome::ReferenceMissing {
                asset: reference.id.clone(),
            };
        }

        match self.correlate_window(window, series) {
            Ok(outcome) => outcome,
            Err(e) => WindowOutcome::PersistenceFailed {
                error: format!("{:#}", e),
            },
        }
    }

    fn correlate_window(
        &self,
        window: &LookbackWindow,
        series: &BTreeMap<String, PriceSeries>,
    ) -> Result<WindowOutcome> {
        for (asset_id, samples) in series {
            self.persistence
                .save_raw_series(asset_id, &window.name, samples)?;
        }

        info!(window = %window.name, "Processing data");
        let aligned = match align_series(series) {
            Ok(aligned) => aligned,
            Err(e) => {
                return Ok(WindowOutcome::NoCommonTimeline {
                    reason: e.to_string(),
                })
            }
        };
        self.persistence.save_aligned(&window.name, &aligned)?;

        let reference = self.config.reference();
        let reference_prices = aligned.series(&reference.id).unwrap_or_default();

        let mut correlations = CorrelationResult::new();
        for asset in &self.config.assets {
            if asset.id == reference.id {
                continue;
            }
            let Some(target_prices) = aligned.series(&asset.id) else {
                continue;
            };
            let coefficient = correlate(reference_prices, target_prices);
            let key = pair_key(reference, asset);
            info!(window = %window.name, pair = %key, "{}: {:.4}", key, coefficient);
            correlations.insert(key, coefficient);
        }

        self.persistence
            .save_correlations(&window.name, &correlations)?;

        Ok(WindowOutcome::Completed {
            aligned_days: aligned.len(),
            correlations,
        })
    }
}
