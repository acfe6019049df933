//! `backtest` command: replay the ledger's recommendations for one
//! ticker over a period and print the performance report.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use stock_council_backtest::{BacktestEngine, ReportFormatter, SimulationError, SimulatorConfig};
use stock_council_core::ConfigLoader;
use stock_council_data::{CsvMarketData, DataError, MarketData};
use stock_council_ledger::{JsonlLedger, RecommendationStore};
use tracing::{info, warn};

pub async fn run(
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
    capital: Option<Decimal>,
    config_path: &str,
) -> Result<()> {
    // Reject an inverted period before touching any file.
    if end < start {
        return Err(SimulationError::InvalidPeriod { start, end }.into());
    }

    let cfg = ConfigLoader::load_from(config_path).context("loading configuration")?;
    let mut sim = SimulatorConfig::from(&cfg.backtest);
    if let Some(capital) = capital {
        sim = sim.with_capital(capital);
    }
    let engine = BacktestEngine::new(sim)?;

    let ledger = JsonlLedger::open(&cfg.ledger.path)
        .await
        .context("opening ledger")?;
    let recommendations = ledger.range(ticker, start, end).await?;
    if recommendations.is_empty() {
        warn!(ticker, %start, %end, "no recommendations in the ledger for this period");
    }

    let provider = CsvMarketData::new(&cfg.data.csv_dir);
    let prices = provider.price_history(ticker, start, end).await?;

    info!(
        ticker,
        days = prices.len(),
        recommendations = recommendations.len(),
        "running backtest"
    );
    let run = engine.run(ticker, &recommendations, &prices)?;
    println!("{}", ReportFormatter::format(&run));
    Ok(())
}

/// Exit codes documented for `backtest`: 1 for an invalid period or
/// config, 2 when price data for the period is missing.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(sim) = error.downcast_ref::<SimulationError>() {
        return match sim {
            SimulationError::EmptyPrices { .. } => 2,
            SimulationError::InvalidPeriod { .. } | SimulationError::InvalidConfig(_) => 1,
        };
    }
    if error.downcast_ref::<DataError>().is_some() {
        return 2;
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[tokio::test]
    async fn inverted_period_fails_before_any_io() {
        let err = run("AAPL", day(20), day(10), None, "does-not-exist.toml")
            .await
            .unwrap_err();
        assert_eq!(exit_code(&err), 1);
        assert!(err.to_string().contains("before start"));
    }

    #[test]
    fn missing_prices_map_to_exit_2() {
        let err = anyhow::Error::new(DataError::unavailable("AAPL", "no file"));
        assert_eq!(exit_code(&err), 2);
        let err = anyhow::Error::new(SimulationError::EmptyPrices {
            ticker: "AAPL".to_string(),
        });
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn config_violations_map_to_exit_1() {
        let err = anyhow::Error::new(SimulationError::InvalidConfig(
            "starting capital must be positive".to_string(),
        ));
        assert_eq!(exit_code(&err), 1);
    }
}
