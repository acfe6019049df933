//! `analyze` command: one council evaluation, printed with its audit
//! trail and appended to the ledger.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use stock_council_agents::{AnalysisError, Orchestrator};
use stock_council_core::{ConfigLoader, Market, Recommendation};
use stock_council_data::{CsvMarketData, PriceCache};
use stock_council_ledger::{JsonlLedger, RecommendationStore};
use stock_council_llm::{HttpLlmClient, HttpLlmClientConfig, LlmClient};
use tracing::info;

pub async fn run(ticker: &str, date: Option<NaiveDate>, config_path: &str) -> Result<()> {
    let cfg = ConfigLoader::load_from(config_path).context("loading configuration")?;
    let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());

    let client: Arc<dyn LlmClient> = Arc::new(
        HttpLlmClient::new(HttpLlmClientConfig::from(&cfg.llm)).context("building LLM client")?,
    );
    let cache = Arc::new(PriceCache::new(Arc::new(CsvMarketData::new(
        &cfg.data.csv_dir,
    ))));
    let ledger: Arc<dyn RecommendationStore> = Arc::new(
        JsonlLedger::open(&cfg.ledger.path)
            .await
            .context("opening ledger")?,
    );

    let orchestrator = Orchestrator::from_config(&cfg.analysis, &client, cache, ledger);
    info!(ticker, %date, "running council analysis");
    let rec = orchestrator.evaluate(ticker, date).await?;
    print_recommendation(&rec);
    Ok(())
}

/// Exit codes documented for `analyze`: 1 for data or infrastructure
/// failures, 2 when every agent abstained.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<AnalysisError>() {
        Some(AnalysisError::AllAgentsAbstained { .. }) => 2,
        _ => 1,
    }
}

fn print_recommendation(rec: &Recommendation) {
    let market = Market::classify(&rec.ticker);
    println!();
    println!("{} [{}] {}", rec.ticker, market, rec.date);
    println!(
        "{} (confidence {:.0}%, method {})",
        rec.verdict,
        rec.confidence * 100.0,
        rec.method
    );
    println!(
        "scores: buy {:.2} / sell {:.2} / hold {:.2}",
        rec.scores.buy, rec.scores.sell, rec.scores.hold
    );
    println!();
    for op in &rec.opinions {
        let summary = op.rationale.lines().next().unwrap_or("");
        println!(
            "  {:<12} {:<8} conf {:.2}  weight {:.2}  {}",
            op.role, op.verdict, op.confidence, op.weight, summary
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stock_council_data::DataError;

    #[test]
    fn all_abstained_maps_to_exit_2() {
        let err = anyhow::Error::new(AnalysisError::AllAgentsAbstained {
            ticker: "AAPL".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        });
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn data_error_maps_to_exit_1() {
        let err = anyhow::Error::new(AnalysisError::Data(DataError::unavailable(
            "AAPL", "no file",
        )));
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn unrelated_error_maps_to_exit_1() {
        let err = anyhow::anyhow!("config file unreadable");
        assert_eq!(exit_code(&err), 1);
    }
}
