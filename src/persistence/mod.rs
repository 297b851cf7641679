//! JSON Persistence Module
//!
//! Stores raw series, aligned datasets and correlation results for each
//! lookback window under a single output directory:
//!
//! - `{asset_id}_{window}.json`: raw `[{timestamp, price}, ...]`
//! - `aligned_{window}.json`: `{dates, prices}`
//! - `correlation_{window}.json`: `{"<ref>_<target>": coefficient}`
//!
//! Non-finite coefficients are written as `null` and read back as `NaN`.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analysis::AlignedDataset;
use crate::types::{CorrelationResult, PriceSample, PriceSeries};

/// Writes pipeline artifacts as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonPersistence {
    output_dir: PathBuf,
}

impl JsonPersistence {
    /// Create a persistence manager, creating `output_dir` if needed
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory {}", output_dir.display())
        })?;

        info!(output_dir = %output_dir.display(), "JSON persistence ready");
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn raw_series_path(&self, asset_id: &str, window: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}.json", asset_id, window))
    }

    pub fn aligned_path(&self, window: &str) -> PathBuf {
        self.output_dir.join(format!("aligned_{}.json", window))
    }

    pub fn correlation_path(&self, window: &str) -> PathBuf {
        self.output_dir.join(format!("correlation_{}.json", window))
    }

    /// Save one asset's raw price series for a window
    pub fn save_raw_series(
        &self,
        asset_id: &str,
        window: &str,
        series: &[PriceSample],
    ) -> Result<PathBuf> {
        let path = self.raw_series_path(asset_id, window);
        write_json(&path, &series)?;
        debug!(asset = %asset_id, window = %window, points = series.len(), "Saved raw series");
        Ok(path)
    }

    /// Save the aligned dataset for a window
    pub fn save_aligned(&self, window: &str, dataset: &AlignedDataset) -> Result<PathBuf> {
        let path = self.aligned_path(window);
        write_json(&path, dataset)?;
        info!(window = %window, days = dataset.len(), path = %path.display(), "Saved aligned dataset");
        Ok(path)
    }

    /// Save the correlation mapping for a window
    pub fn save_correlations(&self, window: &str, result: &CorrelationResult) -> Result<PathBuf> {
        let path = self.correlation_path(window);
        write_json(&path, result)?;
        info!(window = %window, pairs = result.len(), path = %path.display(), "Saved correlations");
        Ok(path)
    }

    pub fn load_raw_series(&self, asset_id: &str, window: &str) -> Result<PriceSeries> {
        read_json(&self.raw_series_path(asset_id, window))
    }

    pub fn load_aligned(&self, window: &str) -> Result<AlignedDataset> {
        read_json(&self.aligned_path(window))
    }

    pub fn load_correlations(&self, window: &str) -> Result<CorrelationResult> {
        let stored: BTreeMap<String, Option<f64>> = read_json(&self.correlation_path(window))?;
        Ok(stored
            .into_iter()
            .map(|(pair, value)| (pair, value.unwrap_or(f64::NAN)))
            .collect())
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}
