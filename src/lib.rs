//! CryptoCorr Library
//!
//! Historical price collection and return-correlation analysis for a
//! fixed set of crypto assets

pub mod analysis;
pub mod config;
pub mod market_data;
pub mod persistence;
pub mod pipeline;
pub mod types;
