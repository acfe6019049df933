use chrono::NaiveDate;
use stock_council_data::DataError;
use stock_council_ledger::LedgerError;
use thiserror::Error;

/// Errors from running the council.
///
/// Individual agent failures never surface here; they degrade to
/// abstentions inside the round. These are the failures that leave the
/// council without a result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Every agent abstained, so no vote was cast.
    #[error("all agents abstained for {ticker} on {date}")]
    AllAgentsAbstained { ticker: String, date: NaiveDate },

    /// The price window could not be loaded.
    #[error("price data error: {0}")]
    Data(#[from] DataError),

    /// The recommendation could not be recorded.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
