//! Series Aligner - Buckets irregular price series into UTC days
//!
//! Produces a rectangular dataset over the days present in every series.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

use crate::types::{PriceSample, MS_PER_DAY};

/// Start-of-day timestamp (ms) used as the alignment key
pub type DayBucket = i64;

/// At most one price per day for one asset
pub type PriceMap = HashMap<DayBucket, f64>;

/// Prices for several assets on a shared daily timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedDataset {
    /// Calendar dates (YYYY-MM-DD, UTC) in ascending order
    pub dates: Vec<String>,
    /// Asset id -> prices, positionally aligned with `dates`
    pub prices: BTreeMap<String, Vec<f64>>,
}

impl AlignedDataset {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Aligned price vector for one asset
    pub fn series(&self, asset_id: &str) -> Option<&[f64]> {
        self.prices.get(asset_id).map(Vec::as_slice)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignError {
    #[error("no day is covered by all {assets} series")]
    EmptyTimeline { assets: usize },
}

/// Floor a millisecond timestamp to the start of its UTC day
pub fn day_bucket(timestamp: i64) -> DayBucket {
    timestamp - timestamp.rem_euclid(MS_PER_DAY)
}

/// Render a bucket as a UTC calendar date
pub fn bucket_date(bucket: DayBucket) -> String {
    DateTime::from_timestamp_millis(bucket)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| bucket.to_string())
}

/// Collapse a series into one price per day. A later sample in the same
/// day overwrites an earlier one.
pub fn build_price_map(series: &[PriceSample]) -> PriceMap {
    let mut map = PriceMap::with_capacity(series.len());
    for sample in series {
        map.insert(day_bucket(sample.timestamp), sample.price);
    }
    map
}

/// Align several series onto the days they all cover.
///
/// Fails with [`AlignError::EmptyTimeline`] when no day is shared, which
/// includes the case where any series is empty.
pub fn align_series<S>(series: &BTreeMap<String, S>) -> Result<AlignedDataset, AlignError>
where
    S: AsRef<[PriceSample]>,
{
    let price_maps: BTreeMap<&str, PriceMap> = series
        .iter()
        .map(|(id, samples)| (id.as_str(), build_price_map(samples.as_ref())))
        .collect();

    let candidates: BTreeSet<DayBucket> = price_maps
        .values()
        .flat_map(|map| map.keys().copied())
        .collect();

    let common: Vec<DayBucket> = candidates
        .into_iter()
        .filter(|bucket| price_maps.values().all(|map| map.contains_key(bucket)))
        .collect();

    if common.is_empty() {
        return Err(AlignError::EmptyTimeline {
            assets: series.len(),
        });
    }

    let dates: Vec<String> = common.iter().map(|&b| bucket_date(b)).collect();
    let prices: BTreeMap<String, Vec<f64>> = price_maps
        .iter()
        .map(|(id, map)| (id.to_string(), common.iter().map(|b| map[b]).collect()))
        .collect();

    Ok(AlignedDataset { dates, prices })
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-11-14 00:00:00 UTC
    const DAY0: i64 = 1_699_920_000_000;

    fn day(n: i64) -> i64 {
        DAY0 + n * MS_PER_DAY
    }

    fn series(points: &[(i64, f64)]) -> Vec<PriceSample> {
        points
            .iter()
            .map(|&(ts, p)| PriceSample::new(ts, p))
            .collect()
    }

    #[test]
    fn test_day_bucket_floors_to_midnight() {
        assert_eq!(day_bucket(DAY0), DAY0);
        assert_eq!(day_bucket(DAY0 + 13 * 3_600_000 + 17), DAY0);
        assert_eq!(day_bucket(DAY0 + MS_PER_DAY - 1), DAY0);
        assert_eq!(day_bucket(-1), -MS_PER_DAY);
    }

    #[test]
    fn test_bucket_date_is_utc() {
        assert_eq!(bucket_date(DAY0), "2023-11-14");
        assert_eq!(bucket_date(0), "1970-01-01");
    }

    #[test]
    fn test_common_timeline_is_intersection() {
        let mut input = BTreeMap::new();
        input.insert(
            "a".to_string(),
            series(&[(day(1), 1.0), (day(2), 2.0), (day(3), 3.0)]),
        );
        input.insert(
            "b".to_string(),
            series(&[(day(2), 20.0), (day(3), 30.0), (day(4), 40.0)]),
        );

        let aligned = align_series(&input).unwrap();
        assert_eq!(aligned.dates, vec![bucket_date(day(2)), bucket_date(day(3))]);
        assert_eq!(aligned.series("a").unwrap(), &[2.0, 3.0]);
        assert_eq!(aligned.series("b").unwrap(), &[20.0, 30.0]);
    }

    #[test]
    fn test_timeline_sorted_even_if_source_is_not() {
        let mut input = BTreeMap::new();
        input.insert(
            "a".to_string(),
            series(&[(day(3), 3.0), (day(1), 1.0), (day(2), 2.0)]),
        );

        let aligned = align_series(&input).unwrap();
        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned.series("a").unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_series_empties_timeline() {
        let mut input = BTreeMap::new();
        input.insert("a".to_string(), series(&[(day(1), 1.0), (day(2), 2.0)]));
        input.insert("b".to_string(), Vec::new());

        assert_eq!(
            align_series(&input),
            Err(AlignError::EmptyTimeline { assets: 2 })
        );
    }

    #[test]
    fn test_disjoint_series_fail() {
        let mut input = BTreeMap::new();
        input.insert("a".to_string(), series(&[(day(1), 1.0)]));
        input.insert("b".to_string(), series(&[(day(2), 2.0)]));

        assert!(align_series(&input).is_err());
    }

    #[test]
    fn test_later_sample_wins_within_day() {
        let mut input = BTreeMap::new();
        input.insert(
            "a".to_string(),
            series(&[(day(1), 10.0), (day(1) + 3_600_000, 11.0), (day(2), 12.0)]),
        );

        let aligned = align_series(&input).unwrap();
        assert_eq!(aligned.series("a").unwrap(), &[11.0, 12.0]);
    }

    #[test]
    fn test_intraday_offsets_share_bucket() {
        // Daily closes from the API are rarely exactly at midnight
        let mut input = BTreeMap::new();
        input.insert("a".to_string(), series(&[(day(5) + 1_234, 1.0)]));
        input.insert("b".to_string(), series(&[(day(5) + 80_000_000, 2.0)]));

        let aligned = align_series(&input).unwrap();
        assert_eq!(aligned.dates, vec![bucket_date(day(5))]);
    }

    #[test]
    fn test_every_vector_matches_dates_length() {
        let mut input = BTreeMap::new();
        for (id, offset) in [("a", 0), ("b", 1), ("c", 2)] {
            let points: Vec<(i64, f64)> =
                (offset..offset + 10).map(|d| (day(d), d as f64)).collect();
            input.insert(id.to_string(), series(&points));
        }

        let aligned = align_series(&input).unwrap();
        assert_eq!(aligned.len(), 8);
        for prices in aligned.prices.values() {
            assert_eq!(prices.len(), aligned.dates.len());
        }
    }
}
