//! Market data access for the stock council.
//!
//! This crate provides:
//! - The [`MarketData`] trait, the boundary any price feed plugs into
//! - A CSV-backed provider for local daily histories
//! - A read-through [`PriceCache`] shared by concurrent readers

pub mod cache;
pub mod error;
pub mod provider;

// Re-export commonly used types
pub use cache::PriceCache;
pub use error::{DataError, Result};
pub use provider::{CsvMarketData, MarketData};
