//! Analyst agents and the council orchestrator.
//!
//! This crate turns a roster of independent analyst roles into one
//! dated recommendation. Each role is an [`stock_council_core::Agent`]
//! evaluated in isolation; the [`Orchestrator`] fans the roster out
//! under a bounded pool, retries or degrades failures, optionally runs
//! the bull/bear/judge debate round, tallies the weighted vote, and
//! appends the result to the recommendation ledger.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use stock_council_agents::{build_roster, Orchestrator};
//! use stock_council_core::AnalysisConfig;
//! use stock_council_data::{CsvMarketData, PriceCache};
//! use stock_council_ledger::MemoryLedger;
//! use stock_council_llm::{HttpLlmClient, HttpLlmClientConfig, LlmClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client: Arc<dyn LlmClient> =
//!         Arc::new(HttpLlmClient::new(HttpLlmClientConfig::default())?);
//!     let cfg = AnalysisConfig::default();
//!     let orchestrator = Orchestrator::from_config(
//!         &cfg,
//!         &client,
//!         Arc::new(PriceCache::new(Arc::new(CsvMarketData::new("data/prices")))),
//!         Arc::new(MemoryLedger::new()),
//!     );
//!     let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
//!     let rec = orchestrator.evaluate("AAPL", date).await?;
//!     println!("{}: {}", rec.ticker, rec.verdict);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod indicators;
pub mod orchestrator;
pub mod parse;
pub mod roles;
pub mod roster;

pub use error::{AnalysisError, Result};
pub use orchestrator::{adjusted_tally, Orchestrator, RetryPolicy};
pub use roles::LlmAgent;
pub use roster::{build_debate_panel, build_roster, AgentRoster, DebatePanel};
