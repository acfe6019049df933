//! Deterministic recommendation replay.
//!
//! The engine walks the price series strictly chronologically. Each
//! trading day it executes whatever became due, marks the portfolio to
//! market, then schedules that day's recommendations for `delay`
//! trading days later. A recommendation dated `T` therefore never
//! touches a price at or before `T`, and identical inputs always
//! produce identical output: `Decimal` arithmetic, no clock, no
//! randomness, no hash-order iteration.

use crate::config::{SimulatorConfig, SizingPolicy};
use crate::error::{Result, SimulationError};
use crate::metrics::{summarize, PerformanceMetrics};
use crate::portfolio::{ClosedTrade, PortfolioState, TradeSide};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stock_council_core::{PricePoint, Recommendation, Verdict};
use tracing::{debug, info, warn};

/// Outcome of one replay: the full curve, the round trips, and the
/// summary metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub ticker: String,
    /// First trading day replayed.
    pub start: NaiveDate,
    /// Last trading day replayed.
    pub end: NaiveDate,
    pub config: SimulatorConfig,
    /// One state per trading day.
    pub curve: Vec<PortfolioState>,
    pub trades: Vec<ClosedTrade>,
    pub metrics: PerformanceMetrics,
}

/// An open position held by the replay book.
#[derive(Debug, Clone)]
struct OpenPosition {
    side: TradeSide,
    /// Always positive; the side carries the sign.
    shares: Decimal,
    /// Average entry price.
    entry_price: Decimal,
    entry_date: NaiveDate,
    entry_fees: Decimal,
}

/// Cash plus at most one open position.
#[derive(Debug)]
struct Book {
    cash: Decimal,
    position: Option<OpenPosition>,
}

impl Book {
    fn new(capital: Decimal) -> Self {
        Self {
            cash: capital,
            position: None,
        }
    }

    fn signed_shares(&self) -> Decimal {
        match &self.position {
            None => Decimal::ZERO,
            Some(p) if p.side == TradeSide::Short => -p.shares,
            Some(p) => p.shares,
        }
    }

    fn equity(&self, close: Decimal) -> Decimal {
        self.cash + self.signed_shares() * close
    }
}

/// Replays a recommendation stream against a price series.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: SimulatorConfig,
}

impl BacktestEngine {
    /// Creates an engine after validating the config.
    ///
    /// # Errors
    /// Returns [`SimulationError::InvalidConfig`] when a bound is
    /// violated.
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Runs the replay.
    ///
    /// Recommendations are sorted by date defensively. Ones dated after
    /// the last trading day, or too close to the end for their delayed
    /// execution to land inside the series, are dropped with a warning.
    ///
    /// # Errors
    /// Returns [`SimulationError::EmptyPrices`] when the series is
    /// empty.
    pub fn run(
        &self,
        ticker: &str,
        recommendations: &[Recommendation],
        prices: &[PricePoint],
    ) -> Result<BacktestRun> {
        let (Some(first), Some(last)) = (prices.first(), prices.last()) else {
            return Err(SimulationError::EmptyPrices {
                ticker: ticker.to_string(),
            });
        };
        info!(
            ticker,
            days = prices.len(),
            recommendations = recommendations.len(),
            "replaying recommendations"
        );

        let mut sorted: Vec<&Recommendation> = recommendations.iter().collect();
        sorted.sort_by_key(|rec| rec.date);
        let mut queue = sorted.into_iter().peekable();

        let delay = self.config.execution_delay_days as usize;
        let mut pending: BTreeMap<usize, Vec<Verdict>> = BTreeMap::new();
        let mut book = Book::new(self.config.capital);
        let mut curve = Vec::with_capacity(prices.len());
        let mut trades = Vec::new();

        for (index, point) in prices.iter().enumerate() {
            // Intents dated on non-trading days between the previous
            // close and this one arrive now; this day is their first
            // countable trading day, so delay 1 lands on this close.
            while let Some(rec) = queue.peek() {
                if rec.date >= point.date {
                    break;
                }
                if let Some(rec) = queue.next() {
                    self.schedule(&mut pending, rec, index + delay - 1, prices.len(), ticker);
                }
            }

            if let Some(actions) = pending.remove(&index) {
                for verdict in actions {
                    self.apply(&mut book, &mut trades, verdict, point);
                }
            }

            curve.push(PortfolioState {
                date: point.date,
                cash: book.cash,
                shares: book.signed_shares(),
                equity: book.equity(point.close),
            });

            while let Some(rec) = queue.peek() {
                if rec.date > point.date {
                    break;
                }
                if let Some(rec) = queue.next() {
                    self.schedule(&mut pending, rec, index + delay, prices.len(), ticker);
                }
            }
        }

        for rec in queue {
            warn!(
                ticker,
                date = %rec.date,
                "recommendation after the last trading day, dropped"
            );
        }

        let metrics = summarize(&curve, &trades);
        info!(
            ticker,
            final_equity = %book.equity(last.close).round_dp(4),
            trades = trades.len(),
            "backtest complete"
        );

        Ok(BacktestRun {
            ticker: ticker.to_string(),
            start: first.date,
            end: last.date,
            config: self.config.clone(),
            curve,
            trades,
            metrics,
        })
    }

    fn schedule(
        &self,
        pending: &mut BTreeMap<usize, Vec<Verdict>>,
        rec: &Recommendation,
        due: usize,
        len: usize,
        ticker: &str,
    ) {
        if !rec.verdict.is_actionable() {
            debug!(ticker, date = %rec.date, "hold recommendation, no action");
            return;
        }
        if due >= len {
            warn!(
                ticker,
                date = %rec.date,
                verdict = %rec.verdict,
                "recommendation too close to period end, dropped"
            );
            return;
        }
        debug!(
            ticker,
            date = %rec.date,
            verdict = %rec.verdict,
            due_index = due,
            "execution scheduled"
        );
        pending.entry(due).or_default().push(rec.verdict);
    }

    fn apply(
        &self,
        book: &mut Book,
        trades: &mut Vec<ClosedTrade>,
        verdict: Verdict,
        point: &PricePoint,
    ) {
        match verdict {
            Verdict::Buy => self.apply_buy(book, trades, point),
            Verdict::Sell => self.apply_sell(book, trades, point),
            Verdict::Hold | Verdict::Abstain => {}
        }
    }

    fn apply_buy(&self, book: &mut Book, trades: &mut Vec<ClosedTrade>, point: &PricePoint) {
        match book.position.take() {
            None => {
                book.position = self.open(book, TradeSide::Long, point);
            }
            Some(mut position) if position.side == TradeSide::Long => {
                if self.config.averaging_in {
                    self.average_in(book, &mut position, point);
                } else {
                    debug!(date = %point.date, "buy while long ignored");
                }
                book.position = Some(position);
            }
            Some(position) => {
                trades.push(self.close(book, position, point));
            }
        }
    }

    fn apply_sell(&self, book: &mut Book, trades: &mut Vec<ClosedTrade>, point: &PricePoint) {
        match book.position.take() {
            None => {
                book.position = self.open(book, TradeSide::Short, point);
            }
            Some(position) if position.side == TradeSide::Long => {
                trades.push(self.close(book, position, point));
            }
            Some(position) => {
                debug!(date = %point.date, "sell while short ignored");
                book.position = Some(position);
            }
        }
    }

    /// Opens a position sized by the policy. The notional is chosen so
    /// notional plus fee exactly fits the committed budget; cash never
    /// goes negative.
    fn open(&self, book: &mut Book, side: TradeSide, point: &PricePoint) -> Option<OpenPosition> {
        if side == TradeSide::Short && !self.config.allow_short {
            debug!(date = %point.date, "sell while flat ignored, shorting disabled");
            return None;
        }
        if point.close <= Decimal::ZERO {
            warn!(date = %point.date, close = %point.close, "non-positive close, entry skipped");
            return None;
        }
        let budget = book.cash * self.config.sizing.fraction();
        let notional = budget / (Decimal::ONE + self.config.fee_rate());
        if notional <= Decimal::ZERO {
            debug!(date = %point.date, "no cash to commit, entry skipped");
            return None;
        }
        let fee = notional * self.config.fee_rate();
        let shares = notional / point.close;
        match side {
            TradeSide::Long => book.cash -= notional + fee,
            TradeSide::Short => book.cash += notional - fee,
        }
        info!(
            side = ?side,
            date = %point.date,
            price = %point.close,
            shares = %shares.round_dp(4),
            "opened position"
        );
        Some(OpenPosition {
            side,
            shares,
            entry_price: point.close,
            entry_date: point.date,
            entry_fees: fee,
        })
    }

    /// Adds to an open long, averaging the entry price over the total
    /// cost of both entries.
    fn average_in(&self, book: &mut Book, position: &mut OpenPosition, point: &PricePoint) {
        if point.close <= Decimal::ZERO {
            return;
        }
        let budget = book.cash * self.config.sizing.fraction();
        let notional = budget / (Decimal::ONE + self.config.fee_rate());
        if notional <= Decimal::ZERO {
            debug!(date = %point.date, "no cash left to average in");
            return;
        }
        let fee = notional * self.config.fee_rate();
        let added = notional / point.close;
        let total_cost = position.entry_price * position.shares + point.close * added;
        position.shares += added;
        position.entry_price = total_cost / position.shares;
        position.entry_fees += fee;
        book.cash -= notional + fee;
        info!(
            date = %point.date,
            price = %point.close,
            added = %added.round_dp(4),
            "averaged into position"
        );
    }

    fn close(&self, book: &mut Book, position: OpenPosition, point: &PricePoint) -> ClosedTrade {
        let notional = position.shares * point.close;
        let fee = notional * self.config.fee_rate();
        let gross = match position.side {
            TradeSide::Long => {
                book.cash += notional - fee;
                (point.close - position.entry_price) * position.shares
            }
            TradeSide::Short => {
                book.cash -= notional + fee;
                (position.entry_price - point.close) * position.shares
            }
        };
        let fees = position.entry_fees + fee;
        let trade = ClosedTrade {
            side: position.side,
            entry_date: position.entry_date,
            exit_date: point.date,
            entry_price: position.entry_price,
            exit_price: point.close,
            shares: position.shares,
            fees,
            pnl: gross - fees,
        };
        info!(
            side = ?trade.side,
            entry = %trade.entry_price,
            exit = %trade.exit_price,
            pnl = %trade.pnl.round_dp(4),
            "closed position"
        );
        trade
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stock_council_core::VoteScores;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn prices(points: &[(u32, Decimal)]) -> Vec<PricePoint> {
        points
            .iter()
            .map(|(d, close)| PricePoint::new("TEST", day(*d), *close))
            .collect()
    }

    fn rec(d: u32, verdict: Verdict) -> Recommendation {
        Recommendation {
            ticker: "TEST".to_string(),
            date: day(d),
            verdict,
            confidence: 0.8,
            method: "weighted-vote".to_string(),
            scores: VoteScores::default(),
            opinions: Vec::new(),
        }
    }

    fn engine(config: SimulatorConfig) -> BacktestEngine {
        BacktestEngine::new(config).unwrap()
    }

    // ============================================
    // Acceptance Scenario
    // ============================================

    #[test]
    fn buy_at_100_sell_at_110_returns_ten_percent() {
        let series = prices(&[
            (1, dec!(95)),
            (2, dec!(100)),
            (3, dec!(105)),
            (4, dec!(110)),
        ]);
        let recs = vec![rec(1, Verdict::Buy), rec(3, Verdict::Sell)];
        let run = engine(SimulatorConfig::default())
            .run("TEST", &recs, &series)
            .unwrap();

        // Buy dated day 1 executes at day 2's close of 100.
        assert_eq!(run.curve[1].shares, dec!(100));
        assert_eq!(run.curve[1].cash, dec!(0));
        // Sell dated day 3 executes at day 4's close of 110.
        assert_eq!(run.curve[3].cash, dec!(11000));
        assert_eq!(run.curve[3].shares, dec!(0));
        assert_eq!(run.curve[3].equity, dec!(11000));

        assert_eq!(run.metrics.total_return, dec!(0.10));
        assert_eq!(run.trades.len(), 1);
        assert_eq!(run.trades[0].pnl, dec!(1000));
        assert!(run.trades[0].is_win());
    }

    // ============================================
    // Determinism and Invariants
    // ============================================

    #[test]
    fn empty_stream_yields_flat_curve() {
        let series = prices(&[(1, dec!(100)), (2, dec!(101)), (3, dec!(99))]);
        let run = engine(SimulatorConfig::default())
            .run("TEST", &[], &series)
            .unwrap();

        assert_eq!(run.curve.len(), 3);
        assert!(run.curve.iter().all(|s| s.equity == dec!(10_000)));
        assert!(run.trades.is_empty());
        assert_eq!(run.metrics.total_return, Decimal::ZERO);
    }

    #[test]
    fn identical_inputs_produce_identical_output() {
        let series = prices(&[
            (1, dec!(100)),
            (2, dec!(104)),
            (3, dec!(101)),
            (4, dec!(108)),
            (5, dec!(103)),
        ]);
        let recs = vec![rec(1, Verdict::Buy), rec(4, Verdict::Sell)];
        let eng = engine(SimulatorConfig::default().with_fee_bps(10));

        let a = eng.run("TEST", &recs, &series).unwrap();
        let b = eng.run("TEST", &recs, &series).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn equity_always_equals_cash_plus_marked_shares() {
        let series = prices(&[
            (1, dec!(100)),
            (2, dec!(95)),
            (3, dec!(108)),
            (4, dec!(112)),
            (5, dec!(90)),
        ]);
        let recs = vec![rec(1, Verdict::Buy), rec(3, Verdict::Sell)];
        let run = engine(SimulatorConfig::default().with_fee_bps(50))
            .run("TEST", &recs, &series)
            .unwrap();

        for (state, point) in run.curve.iter().zip(&series) {
            assert_eq!(state.equity, state.cash + state.shares * point.close);
        }
    }

    #[test]
    fn no_state_changes_before_delayed_execution() {
        let series = prices(&[
            (1, dec!(100)),
            (2, dec!(110)),
            (3, dec!(120)),
            (4, dec!(130)),
        ]);
        let quiet = engine(SimulatorConfig::default())
            .run("TEST", &[], &series)
            .unwrap();
        let active = engine(SimulatorConfig::default())
            .run("TEST", &[rec(2, Verdict::Buy)], &series)
            .unwrap();

        // Days 1 and 2 are untouched by a recommendation dated day 2.
        assert_eq!(active.curve[0], quiet.curve[0]);
        assert_eq!(active.curve[1], quiet.curve[1]);
        // Execution lands on day 3.
        assert_ne!(active.curve[2], quiet.curve[2]);
    }

    // ============================================
    // Position State Machine
    // ============================================

    #[test]
    fn sell_while_flat_is_a_noop_without_shorting() {
        let series = prices(&[(1, dec!(100)), (2, dec!(90)), (3, dec!(80))]);
        let run = engine(SimulatorConfig::default())
            .run("TEST", &[rec(1, Verdict::Sell)], &series)
            .unwrap();
        assert!(run.trades.is_empty());
        assert!(run.curve.iter().all(|s| s.equity == dec!(10_000)));
    }

    #[test]
    fn buy_while_long_is_a_noop_without_averaging() {
        let series = prices(&[(1, dec!(100)), (2, dec!(100)), (3, dec!(100)), (4, dec!(100))]);
        let recs = vec![rec(1, Verdict::Buy), rec(2, Verdict::Buy)];
        let run = engine(SimulatorConfig::default())
            .run("TEST", &recs, &series)
            .unwrap();
        assert_eq!(run.curve[2].shares, dec!(100));
        assert_eq!(run.curve[2].cash, dec!(0));
    }

    #[test]
    fn averaging_in_adds_shares_at_the_new_close() {
        let series = prices(&[(1, dec!(100)), (2, dec!(100)), (3, dec!(125)), (4, dec!(125))]);
        let recs = vec![rec(1, Verdict::Buy), rec(2, Verdict::Buy)];
        let config = SimulatorConfig::default()
            .with_sizing(SizingPolicy::FixedFraction(dec!(0.5)))
            .with_averaging_in(true);
        let run = engine(config).run("TEST", &recs, &series).unwrap();

        // First entry: half of 10000 at 100 -> 50 shares, 5000 cash.
        assert_eq!(run.curve[1].shares, dec!(50));
        assert_eq!(run.curve[1].cash, dec!(5000));
        // Second entry: half of the remaining 5000 at 125 -> +20 shares.
        assert_eq!(run.curve[2].shares, dec!(70));
        assert_eq!(run.curve[2].cash, dec!(2500));
    }

    #[test]
    fn short_round_trip_profits_from_a_fall() {
        let series = prices(&[(1, dec!(100)), (2, dec!(100)), (3, dec!(90)), (4, dec!(80))]);
        let recs = vec![rec(1, Verdict::Sell), rec(3, Verdict::Buy)];
        let run = engine(SimulatorConfig::default().with_allow_short(true))
            .run("TEST", &recs, &series)
            .unwrap();

        // Short opened at 100: proceeds in cash, negative shares.
        assert_eq!(run.curve[1].shares, dec!(-100));
        assert_eq!(run.curve[1].cash, dec!(20_000));
        assert_eq!(run.curve[1].equity, dec!(10_000));
        // Covered at 80.
        assert_eq!(run.trades.len(), 1);
        assert_eq!(run.trades[0].side, TradeSide::Short);
        assert_eq!(run.trades[0].pnl, dec!(2000));
        assert_eq!(run.curve[3].equity, dec!(12_000));
    }

    #[test]
    fn holds_never_change_the_position() {
        let series = prices(&[(1, dec!(100)), (2, dec!(100)), (3, dec!(100)), (4, dec!(100))]);
        let recs = vec![rec(1, Verdict::Buy), rec(2, Verdict::Hold), rec(3, Verdict::Hold)];
        let run = engine(SimulatorConfig::default())
            .run("TEST", &recs, &series)
            .unwrap();
        assert_eq!(run.curve[1].shares, dec!(100));
        assert_eq!(run.curve[3].shares, dec!(100));
        assert!(run.trades.is_empty());
    }

    // ============================================
    // Fees
    // ============================================

    #[test]
    fn fees_come_out_of_notional_and_proceeds() {
        // 100 bps: entry notional 10000 out of 10100 budget, fee 100.
        let series = prices(&[(1, dec!(95)), (2, dec!(100)), (3, dec!(105)), (4, dec!(110))]);
        let recs = vec![rec(1, Verdict::Buy), rec(3, Verdict::Sell)];
        let config = SimulatorConfig::default()
            .with_capital(dec!(10_100))
            .with_fee_bps(100);
        let run = engine(config).run("TEST", &recs, &series).unwrap();

        assert_eq!(run.curve[1].shares, dec!(100));
        assert_eq!(run.curve[1].cash, dec!(0));

        let trade = &run.trades[0];
        assert_eq!(trade.fees, dec!(210));
        assert_eq!(trade.pnl, dec!(790));
        assert_eq!(run.curve[3].cash, dec!(10_890));
    }

    // ============================================
    // Scheduling
    // ============================================

    #[test]
    fn recommendation_on_non_trading_day_executes_at_next_close() {
        // Day 6 is absent from the series; a recommendation dated there
        // counts day 8 as its first trading day.
        let series = prices(&[(5, dec!(100)), (8, dec!(104)), (9, dec!(108))]);
        let run = engine(SimulatorConfig::default())
            .run("TEST", &[rec(6, Verdict::Buy)], &series)
            .unwrap();

        assert_eq!(run.curve[0].shares, dec!(0));
        assert!(run.curve[1].shares > dec!(0));
        assert_eq!(run.curve[1].cash, dec!(0));
    }

    #[test]
    fn delay_counts_trading_days() {
        let series = prices(&[(1, dec!(100)), (2, dec!(100)), (3, dec!(100)), (4, dec!(100))]);
        let run = engine(SimulatorConfig::default().with_execution_delay_days(2))
            .run("TEST", &[rec(1, Verdict::Buy)], &series)
            .unwrap();

        assert_eq!(run.curve[1].shares, dec!(0));
        assert_eq!(run.curve[2].shares, dec!(100));
    }

    #[test]
    fn too_late_recommendation_is_dropped() {
        let series = prices(&[(1, dec!(100)), (2, dec!(100)), (3, dec!(100))]);
        let run = engine(SimulatorConfig::default())
            .run("TEST", &[rec(3, Verdict::Buy)], &series)
            .unwrap();
        assert!(run.trades.is_empty());
        assert!(run.curve.iter().all(|s| s.shares == dec!(0)));
    }

    #[test]
    fn unsorted_recommendations_are_replayed_in_date_order() {
        let series = prices(&[
            (1, dec!(100)),
            (2, dec!(100)),
            (3, dec!(105)),
            (4, dec!(110)),
        ]);
        let recs = vec![rec(3, Verdict::Sell), rec(1, Verdict::Buy)];
        let run = engine(SimulatorConfig::default())
            .run("TEST", &recs, &series)
            .unwrap();
        assert_eq!(run.trades.len(), 1);
        assert_eq!(run.curve[3].equity, dec!(11_000));
    }

    // ============================================
    // Validation
    // ============================================

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = SimulatorConfig::default().with_capital(dec!(-5));
        assert!(BacktestEngine::new(config).is_err());
    }

    #[test]
    fn empty_prices_is_an_error() {
        let err = engine(SimulatorConfig::default())
            .run("TEST", &[], &[])
            .unwrap_err();
        assert!(matches!(err, SimulationError::EmptyPrices { .. }));
    }
}
