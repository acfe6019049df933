//! The LLM-backed analyst agent.
//!
//! One struct covers every council role; the role string selects the
//! system prompt and, for the technical analyst, a locally computed
//! indicator section. Heterogeneous agents stay possible because the
//! roster only deals in [`Agent`] trait objects.

use crate::indicators;
use crate::parse;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use stock_council_core::{Agent, AgentContext, AgentOpinion};
use stock_council_llm::{CompletionRequest, LlmClient, PromptLibrary};
use tracing::debug;

/// An analyst role backed by a chat model.
pub struct LlmAgent {
    role: String,
    weight: f64,
    client: Arc<dyn LlmClient>,
}

impl LlmAgent {
    /// Creates an agent for `role` voting at `weight`. Negative weights
    /// are clamped to zero.
    #[must_use]
    pub fn new(role: impl Into<String>, weight: f64, client: Arc<dyn LlmClient>) -> Self {
        Self {
            role: role.into(),
            weight: weight.max(0.0),
            client,
        }
    }

    fn user_prompt(&self, ctx: &AgentContext) -> String {
        let mut prompt = PromptLibrary::context_block(ctx);
        if self.role == "technical" {
            let block = indicators::indicator_block(&ctx.prices);
            if !block.is_empty() {
                prompt.push('\n');
                prompt.push_str(&block);
            }
        }
        prompt
    }
}

impl fmt::Debug for LlmAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmAgent")
            .field("role", &self.role)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn role(&self) -> &str {
        &self.role
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    async fn evaluate(&self, ctx: &AgentContext) -> Result<AgentOpinion> {
        let request = CompletionRequest::new(
            PromptLibrary::system(&self.role, ctx.market),
            self.user_prompt(ctx),
        );
        let reply = self.client.complete(&request).await?;
        debug!(role = %self.role, reply_chars = reply.len(), "agent reply received");
        let opinion = parse::parse_opinion(&self.role, self.weight, &reply)?;
        Ok(opinion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use stock_council_core::{PricePoint, Verdict};
    use stock_council_llm::LlmError;

    struct CannedClient {
        reply: String,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    impl CannedClient {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn complete(&self, request: &CompletionRequest) -> stock_council_llm::Result<String> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(self.reply.clone())
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    fn ctx_with_window(days: u32) -> AgentContext {
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let prices: Vec<PricePoint> = (1..=days)
            .map(|d| PricePoint::new("AAPL", day(d), dec!(100) + rust_decimal::Decimal::from(d)))
            .collect();
        AgentContext::new("AAPL", day(days)).with_prices(Arc::from(prices))
    }

    #[tokio::test]
    async fn reply_becomes_a_weighted_opinion() {
        let client = CannedClient::new("Earnings look strong.\nVERDICT: BUY\nCONFIDENCE: 0.8");
        let agent = LlmAgent::new("fundamental", 1.5, client);
        let op = agent.evaluate(&ctx_with_window(5)).await.unwrap();
        assert_eq!(op.role, "fundamental");
        assert_eq!(op.verdict, Verdict::Buy);
        assert!((op.weight - 1.5).abs() < f64::EPSILON);
        assert!((op.score() - 1.2).abs() < 1e-12);
    }

    #[tokio::test]
    async fn technical_role_gets_indicator_section() {
        let client = CannedClient::new("VERDICT: HOLD\nCONFIDENCE: 0.5");
        let agent = LlmAgent::new("technical", 1.0, Arc::clone(&client) as Arc<dyn LlmClient>);
        agent.evaluate(&ctx_with_window(20)).await.unwrap();
        let request = client.last_request.lock().unwrap().clone().unwrap();
        assert!(request.user.contains("Technical indicators:"));
        assert!(request.user.contains("SMA-20"));
    }

    #[tokio::test]
    async fn other_roles_skip_indicators() {
        let client = CannedClient::new("VERDICT: HOLD\nCONFIDENCE: 0.5");
        let agent = LlmAgent::new("sentiment", 1.0, Arc::clone(&client) as Arc<dyn LlmClient>);
        agent.evaluate(&ctx_with_window(20)).await.unwrap();
        let request = client.last_request.lock().unwrap().clone().unwrap();
        assert!(!request.user.contains("Technical indicators:"));
    }

    #[tokio::test]
    async fn gibberish_reply_is_a_permanent_failure() {
        let client = CannedClient::new("The stars are inconclusive today.");
        let agent = LlmAgent::new("fundamental", 1.0, client);
        let err = agent.evaluate(&ctx_with_window(3)).await.unwrap_err();
        let llm_err = err.downcast_ref::<LlmError>().unwrap();
        assert!(matches!(llm_err, LlmError::MalformedResponse(_)));
        assert!(!llm_err.is_transient());
    }

    #[test]
    fn negative_weight_clamps_to_zero() {
        let agent = LlmAgent::new("risk", -2.0, CannedClient::new("VERDICT: HOLD"));
        assert!((agent.weight() - 0.0).abs() < f64::EPSILON);
    }
}
