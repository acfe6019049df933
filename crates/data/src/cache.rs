//! Read-through price cache.
//!
//! Each `(ticker, start, end)` window is fetched from the underlying
//! provider at most once per process and never mutated afterwards;
//! concurrent readers share the same immutable slice.

use crate::error::Result;
use crate::provider::MarketData;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use stock_council_core::PricePoint;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    ticker: String,
    start: NaiveDate,
    end: NaiveDate,
}

/// Caching wrapper around any [`MarketData`] provider.
pub struct PriceCache {
    provider: Arc<dyn MarketData>,
    entries: RwLock<HashMap<CacheKey, Arc<[PricePoint]>>>,
}

impl PriceCache {
    #[must_use]
    pub fn new(provider: Arc<dyn MarketData>) -> Self {
        Self {
            provider,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached window, fetching it on first use.
    ///
    /// # Errors
    /// Propagates the provider's error on a cache miss; errors are not
    /// cached, so a later call may succeed.
    pub async fn get(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<[PricePoint]>> {
        let key = CacheKey {
            ticker: ticker.to_string(),
            start,
            end,
        };

        if let Some(hit) = self.entries.read().await.get(&key) {
            tracing::debug!(ticker, %start, %end, "price cache hit");
            return Ok(Arc::clone(hit));
        }

        let fetched: Arc<[PricePoint]> =
            Arc::from(self.provider.price_history(ticker, start, end).await?);

        let mut entries = self.entries.write().await;
        // A racing task may have inserted first; keep the existing slice
        // so every reader shares one allocation.
        let slice = entries.entry(key).or_insert(fetched);
        Ok(Arc::clone(slice))
    }

    /// Number of cached windows.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl MarketData for PriceCache {
    async fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        let slice = self.get(ticker, start, end).await?;
        Ok(slice.to_vec())
    }
}
