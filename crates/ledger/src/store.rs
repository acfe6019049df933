//! The recommendation store boundary.
//!
//! A ledger is append-only: recommendations are never overwritten or
//! deleted, and re-analysis of an already-covered (ticker, date) key
//! creates a new version instead of replacing the old one.

use async_trait::async_trait;
use chrono::NaiveDate;
use stock_council_core::Recommendation;
use thiserror::Error;

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// IO error reading/writing the backing file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Outcome of an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A new version was stored.
    Inserted {
        /// Version number, starting at 1 per (ticker, date) key.
        version: u32,
    },
    /// An identical recommendation was already stored; nothing changed.
    Unchanged {
        /// Version of the matching stored recommendation.
        version: u32,
    },
}

impl AppendOutcome {
    /// The version the appended recommendation lives at.
    #[must_use]
    pub const fn version(self) -> u32 {
        match self {
            Self::Inserted { version } | Self::Unchanged { version } => version,
        }
    }

    /// True if the append actually stored something.
    #[must_use]
    pub const fn is_inserted(self) -> bool {
        matches!(self, Self::Inserted { .. })
    }
}

/// Append-only, versioned store of recommendations.
///
/// Writes for the same ticker are serialized; writes for different
/// tickers proceed independently; reads never block reads.
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Appends a recommendation.
    ///
    /// Idempotent per content: appending a recommendation equal to one
    /// already stored under its (ticker, date) key is a no-op returning
    /// the existing version. A differing recommendation for an existing
    /// key becomes the next version and the new active one.
    ///
    /// # Errors
    /// Returns error if the backing medium rejects the write.
    async fn append(&self, rec: Recommendation) -> Result<AppendOutcome>;

    /// Latest (active) version for a key, if any.
    async fn latest(&self, ticker: &str, date: NaiveDate) -> Result<Option<Recommendation>>;

    /// A specific version for a key. Versions start at 1.
    async fn version(
        &self,
        ticker: &str,
        date: NaiveDate,
        version: u32,
    ) -> Result<Option<Recommendation>>;

    /// Every version for a key, oldest first.
    async fn versions(&self, ticker: &str, date: NaiveDate) -> Result<Vec<Recommendation>>;

    /// The active recommendation per date in `[start, end]`, date-ascending.
    async fn range(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Recommendation>>;

    /// All tickers with at least one recommendation, sorted.
    async fn tickers(&self) -> Result<Vec<String>>;
}
