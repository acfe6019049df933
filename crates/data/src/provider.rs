//! Market data providers.
//!
//! The [`MarketData`] trait is the boundary behind which live feeds
//! would sit; this crate ships a CSV-backed implementation for local
//! histories and backtesting.

use crate::error::{DataError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use stock_council_core::PricePoint;

/// A source of daily closing prices.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Returns the price series for `ticker` between `start` and `end`
    /// inclusive, strictly ascending by date with no duplicates. Only
    /// trading days appear; gaps are normal.
    ///
    /// # Errors
    /// Returns [`DataError::Unavailable`] when the ticker is unknown or
    /// the window holds no prices, [`DataError::Malformed`] when the
    /// source itself is invalid.
    async fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>>;
}

/// CSV-backed provider reading `<dir>/<TICKER>.csv`.
///
/// Expected format: a `date,close` header followed by one row per
/// trading day, dates as `YYYY-MM-DD`.
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    dir: PathBuf,
}

impl CsvMarketData {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory being read.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validates a ticker before it becomes part of a file name.
    ///
    /// Valid tickers contain only alphanumeric characters and dots
    /// (for suffixed symbols like "0700.HK").
    fn validate_ticker(ticker: &str) -> Result<&str> {
        if ticker.is_empty() {
            return Err(DataError::malformed("ticker cannot be empty"));
        }
        if ticker.contains("..") || ticker.contains('/') || ticker.contains('\\') {
            return Err(DataError::malformed(format!(
                "invalid ticker: contains forbidden characters: {ticker}"
            )));
        }
        if !ticker.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(DataError::malformed(format!(
                "invalid ticker: must contain only alphanumeric or dot: {ticker}"
            )));
        }
        if ticker.len() > 16 {
            return Err(DataError::malformed(format!(
                "invalid ticker: exceeds maximum length of 16: {}",
                ticker.len()
            )));
        }
        Ok(ticker)
    }

    /// Loads and validates the full series for a ticker.
    fn load_series(&self, ticker: &str) -> Result<Vec<PricePoint>> {
        let path = self.dir.join(format!("{ticker}.csv"));
        if !path.exists() {
            return Err(DataError::unavailable(
                ticker,
                format!("no file at {}", path.display()),
            ));
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut points: Vec<PricePoint> = Vec::new();

        for (row, result) in reader.records().enumerate() {
            let record = result?;
            if record.len() < 2 {
                return Err(DataError::malformed(format!(
                    "{}: row {} has {} fields, expected date,close",
                    path.display(),
                    row + 1,
                    record.len()
                )));
            }
            let date = NaiveDate::parse_from_str(&record[0], "%Y-%m-%d").map_err(|e| {
                DataError::malformed(format!("{}: bad date {:?}: {e}", path.display(), &record[0]))
            })?;
            let close = Decimal::from_str(record[1].trim()).map_err(|e| {
                DataError::malformed(format!(
                    "{}: bad close {:?}: {e}",
                    path.display(),
                    &record[1]
                ))
            })?;
            // Rows must arrive strictly ascending; a repeated or
            // backwards date means the file itself is broken.
            if let Some(prev) = points.last() {
                if date <= prev.date {
                    return Err(DataError::malformed(format!(
                        "{}: row {} date {} is not after {}",
                        path.display(),
                        row + 1,
                        date,
                        prev.date
                    )));
                }
            }
            points.push(PricePoint::new(ticker, date, close));
        }

        Ok(points)
    }
}

#[async_trait]
impl MarketData for CsvMarketData {
    async fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        let ticker = Self::validate_ticker(ticker)?;
        let series = self.load_series(ticker)?;
        let total = series.len();

        let window: Vec<PricePoint> = series
            .into_iter()
            .filter(|p| p.date >= start && p.date <= end)
            .collect();

        tracing::debug!(
            ticker,
            %start,
            %end,
            rows = total,
            in_window = window.len(),
            "loaded price history"
        );

        if window.is_empty() {
            return Err(DataError::unavailable(
                ticker,
                format!("no prices between {start} and {end}"),
            ));
        }

        Ok(window)
    }
}
