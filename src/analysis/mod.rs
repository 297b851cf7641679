//! Analysis module - Daily alignment and return correlation
//!
//! Turns independently sampled price series into a shared daily timeline
//! and measures how closely each asset's returns track a reference asset.

pub mod align;
pub mod correlation;

pub use align::{
    align_series, bucket_date, build_price_map, day_bucket, AlignError, AlignedDataset, DayBucket,
    PriceMap,
};
pub use correlation::{correlate, pearson, simple_returns, INSUFFICIENT_DATA};
