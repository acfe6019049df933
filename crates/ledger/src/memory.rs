//! In-memory ledger.
//!
//! Each ticker gets its own book behind its own lock, so appends to
//! different tickers never contend while appends to the same ticker
//! are strictly serialized.

use crate::store::{AppendOutcome, RecommendationStore, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use stock_council_core::Recommendation;
use tokio::sync::RwLock;

/// All versions for one ticker, keyed by date, oldest version first.
type TickerBook = BTreeMap<NaiveDate, Vec<Recommendation>>;

/// Thread-safe in-memory recommendation store.
#[derive(Default)]
pub struct MemoryLedger {
    books: RwLock<HashMap<String, Arc<RwLock<TickerBook>>>>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the book for a ticker, creating it if absent.
    async fn book(&self, ticker: &str) -> Arc<RwLock<TickerBook>> {
        if let Some(book) = self.books.read().await.get(ticker) {
            return Arc::clone(book);
        }
        let mut books = self.books.write().await;
        Arc::clone(books.entry(ticker.to_string()).or_default())
    }

    /// Returns the book for a ticker without creating it.
    async fn existing_book(&self, ticker: &str) -> Option<Arc<RwLock<TickerBook>>> {
        self.books.read().await.get(ticker).map(Arc::clone)
    }
}

#[async_trait]
impl RecommendationStore for MemoryLedger {
    async fn append(&self, rec: Recommendation) -> Result<AppendOutcome> {
        let book = self.book(&rec.ticker).await;
        let mut book = book.write().await;
        let versions = book.entry(rec.date).or_default();

        if let Some(idx) = versions.iter().position(|existing| existing == &rec) {
            let version = (idx + 1) as u32;
            tracing::debug!(
                ticker = %rec.ticker,
                date = %rec.date,
                version,
                "identical recommendation already stored, append is a no-op"
            );
            return Ok(AppendOutcome::Unchanged { version });
        }

        versions.push(rec);
        let version = versions.len() as u32;
        Ok(AppendOutcome::Inserted { version })
    }

    async fn latest(&self, ticker: &str, date: NaiveDate) -> Result<Option<Recommendation>> {
        let Some(book) = self.existing_book(ticker).await else {
            return Ok(None);
        };
        let book = book.read().await;
        Ok(book.get(&date).and_then(|v| v.last().cloned()))
    }

    async fn version(
        &self,
        ticker: &str,
        date: NaiveDate,
        version: u32,
    ) -> Result<Option<Recommendation>> {
        if version == 0 {
            return Ok(None);
        }
        let Some(book) = self.existing_book(ticker).await else {
            return Ok(None);
        };
        let book = book.read().await;
        Ok(book
            .get(&date)
            .and_then(|v| v.get((version - 1) as usize).cloned()))
    }

    async fn versions(&self, ticker: &str, date: NaiveDate) -> Result<Vec<Recommendation>> {
        let Some(book) = self.existing_book(ticker).await else {
            return Ok(Vec::new());
        };
        let book = book.read().await;
        Ok(book.get(&date).cloned().unwrap_or_default())
    }

    async fn range(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Recommendation>> {
        if end < start {
            return Ok(Vec::new());
        }
        let Some(book) = self.existing_book(ticker).await else {
            return Ok(Vec::new());
        };
        let book = book.read().await;
        Ok(book
            .range(start..=end)
            .filter_map(|(_, v)| v.last().cloned())
            .collect())
    }

    async fn tickers(&self) -> Result<Vec<String>> {
        let mut tickers: Vec<String> = self.books.read().await.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}
