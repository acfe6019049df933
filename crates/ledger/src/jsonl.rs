//! File-backed ledger.
//!
//! One serialized recommendation per line, append-only. On open the
//! file is replayed through the same append path as live writes, so
//! version numbers and idempotence survive restarts. Corrupt lines are
//! skipped with a warning rather than poisoning the whole ledger.

use crate::memory::MemoryLedger;
use crate::store::{AppendOutcome, RecommendationStore, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use stock_council_core::Recommendation;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Append-only JSON-lines recommendation store.
pub struct JsonlLedger {
    path: PathBuf,
    index: MemoryLedger,
    // One writer at a time keeps line order equal to version order.
    file: Mutex<File>,
}

impl JsonlLedger {
    /// Opens (or creates) a ledger file and replays its contents.
    ///
    /// Creates parent directories if they don't exist.
    ///
    /// # Errors
    /// Returns error if the file cannot be created or read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.exists() && !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let index = MemoryLedger::new();
        let mut replayed = 0usize;
        let mut skipped = 0usize;

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Recommendation>(&line) {
                    Ok(rec) => {
                        index.append(rec).await?;
                        replayed += 1;
                    }
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            line = line_no + 1,
                            error = %e,
                            "skipping corrupt ledger line"
                        );
                        skipped += 1;
                    }
                }
            }
        }

        info!(
            path = %path.display(),
            replayed,
            skipped,
            "opened recommendation ledger"
        );

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            index,
            file: Mutex::new(file),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecommendationStore for JsonlLedger {
    async fn append(&self, rec: Recommendation) -> Result<AppendOutcome> {
        // Hold the writer lock across index update and file write so the
        // file's line order always matches version order on replay.
        let mut file = self.file.lock().await;
        let outcome = self.index.append(rec.clone()).await?;

        if outcome.is_inserted() {
            let mut line = serde_json::to_string(&rec)?;
            line.push('\n');
            file.write_all(line.as_bytes())?;
            file.flush()?;
        }

        Ok(outcome)
    }

    async fn latest(&self, ticker: &str, date: NaiveDate) -> Result<Option<Recommendation>> {
        self.index.latest(ticker, date).await
    }

    async fn version(
        &self,
        ticker: &str,
        date: NaiveDate,
        version: u32,
    ) -> Result<Option<Recommendation>> {
        self.index.version(ticker, date, version).await
    }

    async fn versions(&self, ticker: &str, date: NaiveDate) -> Result<Vec<Recommendation>> {
        self.index.versions(ticker, date).await
    }

    async fn range(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Recommendation>> {
        self.index.range(ticker, start, end).await
    }

    async fn tickers(&self) -> Result<Vec<String>> {
        self.index.tickers().await
    }
}
