//! The agent abstraction every analyst role implements.
//!
//! Agents are isolated: each receives an immutable [`AgentContext`] and
//! returns one [`AgentOpinion`]. They never talk to each other directly;
//! the debate round passes prior opinions through the context instead.

use crate::market::Market;
use crate::types::{AgentOpinion, PricePoint};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

/// Everything an agent may look at while forming an opinion.
///
/// The price window never extends past `date`; whoever builds the
/// context enforces that (the orchestrator does).
#[derive(Debug, Clone)]
pub struct AgentContext {
    /// Ticker under analysis
    pub ticker: String,
    /// Analysis date
    pub date: NaiveDate,
    /// Venue inferred from the ticker
    pub market: Market,
    /// Company name, when the data source knows it
    pub company: Option<String>,
    /// Recent daily closes ending at or before `date`, oldest first
    pub prices: Arc<[PricePoint]>,
    /// First-round opinions, present only during the debate round
    pub prior_opinions: Vec<AgentOpinion>,
}

impl AgentContext {
    /// Creates a context with an empty price window.
    #[must_use]
    pub fn new(ticker: impl Into<String>, date: NaiveDate) -> Self {
        let ticker = ticker.into();
        let market = Market::classify(&ticker);
        Self {
            ticker,
            date,
            market,
            company: None,
            prices: Arc::from(Vec::new()),
            prior_opinions: Vec::new(),
        }
    }

    /// Sets the price window.
    #[must_use]
    pub fn with_prices(mut self, prices: Arc<[PricePoint]>) -> Self {
        self.prices = prices;
        self
    }

    /// Sets the company name.
    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Attaches first-round opinions for the debate round.
    #[must_use]
    pub fn with_prior_opinions(mut self, opinions: Vec<AgentOpinion>) -> Self {
        self.prior_opinions = opinions;
        self
    }

    /// Most recent close in the window.
    #[must_use]
    pub fn latest_close(&self) -> Option<rust_decimal::Decimal> {
        self.prices.last().map(|p| p.close)
    }

    /// Percentage change across the whole window, as a fraction.
    ///
    /// Returns None with fewer than two points or a zero first close.
    #[must_use]
    pub fn window_change(&self) -> Option<f64> {
        let first = self.prices.first()?.close;
        let last = self.prices.last()?.close;
        if self.prices.len() < 2 || first.is_zero() {
            return None;
        }
        let ratio = (last - first) / first;
        ratio.to_string().parse::<f64>().ok()
    }
}

/// An analyst role in the council.
///
/// Implementations hold whatever they need (an LLM client handle, a
/// configured weight) but must not share mutable state with other agents.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Role name, unique within a roster.
    fn role(&self) -> &str;

    /// Voting weight applied to this agent's opinions. Default is 1.0.
    fn weight(&self) -> f64 {
        1.0
    }

    /// Forms an opinion for the given context.
    ///
    /// # Errors
    /// Returns error if the agent cannot produce an opinion; the caller
    /// decides whether the failure is transient (retry) or permanent
    /// (degrade to abstain).
    async fn evaluate(&self, ctx: &AgentContext) -> Result<AgentOpinion>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Verdict;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn window(ticker: &str) -> Arc<[PricePoint]> {
        Arc::from(vec![
            PricePoint::new(ticker, day(1), dec!(100)),
            PricePoint::new(ticker, day(2), dec!(104)),
            PricePoint::new(ticker, day(3), dec!(110)),
        ])
    }

    #[test]
    fn context_classifies_market_from_ticker() {
        let ctx = AgentContext::new("600519", day(3));
        assert_eq!(ctx.market, Market::ChinaA);
    }

    #[test]
    fn latest_close_is_last_window_point() {
        let ctx = AgentContext::new("AAPL", day(3)).with_prices(window("AAPL"));
        assert_eq!(ctx.latest_close(), Some(dec!(110)));
    }

    #[test]
    fn window_change_is_fractional() {
        let ctx = AgentContext::new("AAPL", day(3)).with_prices(window("AAPL"));
        let change = ctx.window_change().unwrap();
        assert!((change - 0.10).abs() < 1e-9);
    }

    #[test]
    fn window_change_empty_window_is_none() {
        let ctx = AgentContext::new("AAPL", day(3));
        assert!(ctx.window_change().is_none());
        assert!(ctx.latest_close().is_none());
    }

    struct AlwaysBuy;

    #[async_trait]
    impl Agent for AlwaysBuy {
        fn role(&self) -> &str {
            "always-buy"
        }

        async fn evaluate(&self, _ctx: &AgentContext) -> Result<AgentOpinion> {
            AgentOpinion::new(self.role(), Verdict::Buy, 1.0, self.weight())
        }
    }

    #[tokio::test]
    async fn trait_object_evaluates() {
        let agent: Arc<dyn Agent> = Arc::new(AlwaysBuy);
        let ctx = AgentContext::new("AAPL", day(1));
        let op = agent.evaluate(&ctx).await.unwrap();
        assert_eq!(op.verdict, Verdict::Buy);
        assert!((op.weight - 1.0).abs() < f64::EPSILON);
    }
}
