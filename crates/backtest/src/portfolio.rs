//! Portfolio snapshots and closed trades.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// End-of-day portfolio snapshot. One per trading day in the replay.
///
/// `shares` is negative while short; `equity = cash + shares * close`
/// holds at the day's close by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub date: NaiveDate,
    pub cash: Decimal,
    pub shares: Decimal,
    pub equity: Decimal,
}

/// Direction of a closed round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Long,
    Short,
}

/// A completed round trip: entry to exit, with all fees charged along
/// the way and the net profit after them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub side: TradeSide,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    /// Shares traded, always positive.
    pub shares: Decimal,
    /// Entry plus exit fees.
    pub fees: Decimal,
    /// Profit net of fees.
    pub pnl: Decimal,
}

impl ClosedTrade {
    /// A trade wins when its net profit is positive.
    #[must_use]
    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}
