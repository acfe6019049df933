#![allow(clippy::format_push_string)]

use crate::engine::BacktestRun;
use rust_decimal::Decimal;
use stock_council_core::Market;

/// Renders a completed run as the fixed-width text report the CLI
/// prints. Amounts are shown in the currency of the ticker's market.
pub struct ReportFormatter;

impl ReportFormatter {
    #[must_use]
    pub fn format(run: &BacktestRun) -> String {
        let market = Market::classify(&run.ticker);
        let sym = market.currency_symbol();
        let metrics = &run.metrics;
        let final_equity = run
            .curve
            .last()
            .map_or(run.config.capital, |state| state.equity);
        let pct = Decimal::from(100);

        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                    BACKTEST RESULTS                           \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("Period\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "Ticker:                {} ({})\n",
            run.ticker, market
        ));
        output.push_str(&format!("Start:                 {}\n", run.start));
        output.push_str(&format!("End:                   {}\n", run.end));
        output.push_str(&format!("Trading Days:          {}\n", run.curve.len()));
        output.push('\n');

        output.push_str("Portfolio Performance\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "Initial Capital:       {sym}{:.2}\n",
            run.config.capital
        ));
        output.push_str(&format!(
            "Final Equity:          {sym}{:.2}\n",
            final_equity
        ));
        output.push_str(&format!(
            "Total Return:          {:.2}%\n",
            metrics.total_return * pct
        ));
        output.push_str(&format!("CAGR:                  {:.2}%\n", metrics.cagr * 100.0));
        output.push_str(&format!(
            "Sharpe Ratio:          {:.4}\n",
            metrics.sharpe_ratio
        ));
        output.push_str(&format!(
            "Max Drawdown:          {:.2}%\n",
            metrics.max_drawdown * pct
        ));
        output.push('\n');

        output.push_str("Trade Statistics\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("Total Trades:          {}\n", metrics.num_trades));
        if metrics.num_trades > 0 {
            output.push_str(&format!(
                "Win Rate:              {:.2}%\n",
                metrics.win_rate * 100.0
            ));
            let fees: Decimal = run.trades.iter().map(|t| t.fees).sum();
            output.push_str(&format!("Fees Paid:             {sym}{:.2}\n", fees));
        } else {
            output.push_str("Win Rate:              N/A (no trades)\n");
        }

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");

        if metrics.num_trades == 0 {
            output.push_str("\nNo trades were executed in this period.\n");
            output.push_str("Run `analyze` over the period to populate the ledger first.\n");
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulatorConfig;
    use crate::engine::BacktestEngine;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use stock_council_core::{PricePoint, Recommendation, Verdict, VoteScores};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn sample_run(recs: &[Recommendation]) -> BacktestRun {
        let prices: Vec<PricePoint> = [
            (1, dec!(95)),
            (2, dec!(100)),
            (3, dec!(105)),
            (4, dec!(110)),
        ]
        .iter()
        .map(|(d, close)| PricePoint::new("AAPL", day(*d), *close))
        .collect();
        BacktestEngine::new(SimulatorConfig::default())
            .unwrap()
            .run("AAPL", recs, &prices)
            .unwrap()
    }

    fn rec(d: u32, verdict: Verdict) -> Recommendation {
        Recommendation {
            ticker: "AAPL".to_string(),
            date: day(d),
            verdict,
            confidence: 0.8,
            method: "weighted-vote".to_string(),
            scores: VoteScores::default(),
            opinions: Vec::new(),
        }
    }

    #[test]
    fn report_names_the_ticker_and_market_currency() {
        let report = ReportFormatter::format(&sample_run(&[
            rec(1, Verdict::Buy),
            rec(3, Verdict::Sell),
        ]));
        assert!(report.contains("AAPL (US)"));
        assert!(report.contains("Initial Capital:       $10000.00"));
        assert!(report.contains("Total Return:          10.00%"));
        assert!(report.contains("Total Trades:          1"));
        assert!(report.contains("Win Rate:              100.00%"));
    }

    #[test]
    fn tradeless_report_points_at_the_ledger() {
        let report = ReportFormatter::format(&sample_run(&[]));
        assert!(report.contains("N/A (no trades)"));
        assert!(report.contains("populate the ledger"));
    }
}
