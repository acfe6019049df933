//! Equity-curve performance metrics.
//!
//! [`summarize`] is a pure function of the replayed curve and the
//! closed trades; it touches no external state and is safe to call
//! from anywhere, including report rendering and tests.

use crate::portfolio::{ClosedTrade, PortfolioState};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Annualisation basis for daily-granularity series.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Summary statistics over one backtest run.
///
/// Money-derived figures stay `Decimal`; rates and ratios are `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Final equity over starting equity, minus one.
    pub total_return: Decimal,
    /// Total return annualised over the traded span.
    pub cagr: f64,
    /// Largest peak-to-trough equity decline, as a fraction of the peak.
    pub max_drawdown: Decimal,
    /// Mean daily return over its standard deviation, annualised.
    pub sharpe_ratio: f64,
    /// Completed round trips.
    pub num_trades: usize,
    /// Fraction of round trips with positive net profit.
    pub win_rate: f64,
}

impl PerformanceMetrics {
    /// All-zero metrics, the defined result for degenerate curves.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            total_return: Decimal::ZERO,
            cagr: 0.0,
            max_drawdown: Decimal::ZERO,
            sharpe_ratio: 0.0,
            num_trades: 0,
            win_rate: 0.0,
        }
    }
}

/// Summarises an equity curve and its closed trades.
///
/// An empty or single-point curve yields zero return and zero drawdown
/// rather than an error; trade statistics are still reported.
#[must_use]
pub fn summarize(curve: &[PortfolioState], trades: &[ClosedTrade]) -> PerformanceMetrics {
    let (num_trades, win_rate) = trade_stats(trades);
    let degenerate = PerformanceMetrics {
        num_trades,
        win_rate,
        ..PerformanceMetrics::zero()
    };

    let Some(first) = curve.first() else {
        return degenerate;
    };
    let Some(last) = curve.last() else {
        return degenerate;
    };
    if curve.len() < 2 || first.equity <= Decimal::ZERO {
        return degenerate;
    }

    let total_return = last.equity / first.equity - Decimal::ONE;
    PerformanceMetrics {
        total_return,
        cagr: annualize(total_return, curve.len()),
        max_drawdown: max_drawdown(curve),
        sharpe_ratio: sharpe_ratio(curve),
        num_trades,
        win_rate,
    }
}

fn trade_stats(trades: &[ClosedTrade]) -> (usize, f64) {
    if trades.is_empty() {
        return (0, 0.0);
    }
    let wins = trades.iter().filter(|t| t.is_win()).count();
    (trades.len(), wins as f64 / trades.len() as f64)
}

/// `(1 + r)^(252 / trading_days) - 1` over the replayed span.
fn annualize(total_return: Decimal, trading_days: usize) -> f64 {
    let growth = 1.0 + total_return.to_f64().unwrap_or(0.0);
    if growth <= 0.0 {
        // Equity wiped out; compounding is meaningless past that point.
        return -1.0;
    }
    growth.powf(TRADING_DAYS_PER_YEAR / trading_days as f64) - 1.0
}

/// Running-peak scan over the curve.
fn max_drawdown(curve: &[PortfolioState]) -> Decimal {
    let mut peak = Decimal::MIN;
    let mut worst = Decimal::ZERO;
    for state in curve {
        if state.equity > peak {
            peak = state.equity;
        }
        if peak > Decimal::ZERO {
            let drawdown = (peak - state.equity) / peak;
            if drawdown > worst {
                worst = drawdown;
            }
        }
    }
    worst
}

/// Annualised mean-over-deviation of day-to-day equity returns.
fn sharpe_ratio(curve: &[PortfolioState]) -> f64 {
    let returns: Vec<f64> = curve
        .windows(2)
        .filter_map(|pair| {
            let prev = pair[0].equity.to_f64()?;
            let next = pair[1].equity.to_f64()?;
            (prev.abs() > f64::EPSILON).then(|| next / prev - 1.0)
        })
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    let std_dev = variance.sqrt();
    if std_dev <= f64::EPSILON {
        return 0.0;
    }
    mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
}
