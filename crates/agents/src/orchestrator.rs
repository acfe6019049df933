//! Council orchestration.
//!
//! `evaluate` runs every registered agent concurrently under a bounded
//! pool, retries transient failures with backoff, degrades persistent
//! failures to abstentions, optionally runs the bull/bear/judge debate
//! round, tallies the weighted vote, and appends the outcome to the
//! ledger as its final step. Dropping the returned future cancels all
//! in-flight agent work and leaves the ledger untouched.

use crate::error::{AnalysisError, Result};
use crate::parse;
use crate::roster::{build_debate_panel, build_roster, AgentRoster, DebatePanel};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use stock_council_core::{
    Agent, AgentContext, AgentOpinion, AnalysisConfig, Recommendation, Verdict, VoteScores,
};
use stock_council_data::PriceCache;
use stock_council_ledger::RecommendationStore;
use stock_council_llm::{LlmClient, LlmError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Retry behaviour for a single agent evaluation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Base backoff delay, doubled on each successive retry.
    pub base_delay: Duration,
    /// Wall-clock limit per attempt; a timed-out attempt is cancelled.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt + 1`. A rate-limited call
    /// waits out the server's hint instead of the exponential schedule.
    fn backoff(&self, attempt: u32, error: &anyhow::Error) -> Duration {
        if let Some(LlmError::RateLimit { retry_after_secs }) = error.downcast_ref::<LlmError>() {
            return Duration::from_secs(*retry_after_secs);
        }
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Runs the analyst council for one ticker and date.
pub struct Orchestrator {
    roster: AgentRoster,
    debate: Option<DebatePanel>,
    policy: RetryPolicy,
    max_concurrent: usize,
    window_days: i64,
    data: Arc<PriceCache>,
    ledger: Arc<dyn RecommendationStore>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        roster: AgentRoster,
        data: Arc<PriceCache>,
        ledger: Arc<dyn RecommendationStore>,
    ) -> Self {
        Self {
            roster,
            debate: None,
            policy: RetryPolicy::default(),
            max_concurrent: 4,
            window_days: 60,
            data,
            ledger,
        }
    }

    /// Builds the orchestrator, roster, and debate panel from config.
    #[must_use]
    pub fn from_config(
        cfg: &AnalysisConfig,
        client: &Arc<dyn LlmClient>,
        data: Arc<PriceCache>,
        ledger: Arc<dyn RecommendationStore>,
    ) -> Self {
        let mut orchestrator = Self::new(build_roster(cfg, client), data, ledger)
            .with_policy(RetryPolicy {
                max_retries: cfg.max_retries,
                base_delay: Duration::from_millis(cfg.retry_base_delay_ms),
                timeout: Duration::from_secs(cfg.agent_timeout_secs),
            })
            .with_max_concurrent(cfg.max_concurrent)
            .with_window_days(cfg.price_window_days);
        if cfg.debate.enabled {
            orchestrator = orchestrator.with_debate(build_debate_panel(&cfg.debate, client));
        }
        orchestrator
    }

    /// Enables the debate round.
    #[must_use]
    pub fn with_debate(mut self, panel: DebatePanel) -> Self {
        self.debate = Some(panel);
        self
    }

    /// Sets the retry policy applied to every agent.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Caps how many agents evaluate at once. Minimum 1.
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Sets the look-back window quoted to agents. Minimum 1 day.
    #[must_use]
    pub fn with_window_days(mut self, window_days: i64) -> Self {
        self.window_days = window_days.max(1);
        self
    }

    #[must_use]
    pub fn roster(&self) -> &AgentRoster {
        &self.roster
    }

    /// Analyses `ticker` as of `date` and appends the recommendation.
    ///
    /// The price window never reaches past `date`, so agents cannot see
    /// the future. The ledger append happens last; a future dropped
    /// before completion records nothing.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Data`] when the price window cannot be
    /// loaded, [`AnalysisError::AllAgentsAbstained`] when no agent cast
    /// a vote, and [`AnalysisError::Ledger`] when the append fails.
    pub async fn evaluate(&self, ticker: &str, date: NaiveDate) -> Result<Recommendation> {
        let start = date - chrono::Duration::days(self.window_days);
        let prices = self.data.get(ticker, start, date).await?;
        info!(
            ticker,
            %date,
            window = prices.len(),
            agents = self.roster.len(),
            "starting council analysis"
        );

        let ctx = AgentContext::new(ticker, date).with_prices(prices);
        let mut opinions = self.run_round(&ctx, self.roster.agents().to_vec()).await;

        let (method, scores) = match &self.debate {
            Some(panel) => {
                let debate_ctx = ctx.clone().with_prior_opinions(opinions.clone());
                let researchers = vec![Arc::clone(&panel.bull), Arc::clone(&panel.bear)];
                opinions.extend(self.run_round(&debate_ctx, researchers).await);

                let judge_ctx = ctx.clone().with_prior_opinions(opinions.clone());
                let judge_opinion =
                    evaluate_with_retry(Arc::clone(&panel.judge), &judge_ctx, self.policy).await;
                let adjustments = parse::parse_adjustments(&judge_opinion.rationale);
                if !adjustments.is_empty() {
                    debug!(?adjustments, "judge reweighted roles");
                }
                opinions.push(judge_opinion);
                ("debate", adjusted_tally(&opinions, &adjustments))
            }
            None => ("weighted-vote", VoteScores::tally(&opinions)),
        };

        if opinions.iter().all(|op| op.verdict == Verdict::Abstain) {
            warn!(ticker, %date, "no agent cast a vote");
            return Err(AnalysisError::AllAgentsAbstained {
                ticker: ticker.to_string(),
                date,
            });
        }

        let rec = Recommendation::from_scores(ticker, date, method, scores, opinions);
        let outcome = self.ledger.append(rec.clone()).await?;
        info!(
            ticker,
            %date,
            verdict = %rec.verdict,
            confidence = rec.confidence,
            version = outcome.version(),
            inserted = outcome.is_inserted(),
            "council analysis complete"
        );
        Ok(rec)
    }

    /// Evaluates `agents` concurrently under the pool limit.
    ///
    /// Returns one opinion per agent, in the given order regardless of
    /// completion order. Failures inside a task degrade to abstentions;
    /// an aborted task leaves an abstention in its slot.
    async fn run_round(
        &self,
        ctx: &AgentContext,
        agents: Vec<Arc<dyn Agent>>,
    ) -> Vec<AgentOpinion> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        for (index, agent) in agents.iter().enumerate() {
            let agent = Arc::clone(agent);
            let ctx = ctx.clone();
            let semaphore = Arc::clone(&semaphore);
            let policy = self.policy;
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_closed) => {
                        return (
                            index,
                            AgentOpinion::abstain(agent.role(), "evaluation cancelled"),
                        )
                    }
                };
                (index, evaluate_with_retry(agent, &ctx, policy).await)
            });
        }

        let mut slots: Vec<Option<AgentOpinion>> = vec![None; agents.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, opinion)) => slots[index] = Some(opinion),
                Err(join_error) => warn!(error = %join_error, "agent task aborted"),
            }
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    AgentOpinion::abstain(agents[index].role(), "agent task aborted")
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("roster", &self.roster)
            .field("debate", &self.debate.is_some())
            .field("policy", &self.policy)
            .field("max_concurrent", &self.max_concurrent)
            .field("window_days", &self.window_days)
            .finish_non_exhaustive()
    }
}

/// Runs one agent with per-attempt timeout and transient-error retry.
///
/// Never fails: an exhausted or permanent failure becomes an abstaining
/// opinion whose rationale records the last error.
async fn evaluate_with_retry(
    agent: Arc<dyn Agent>,
    ctx: &AgentContext,
    policy: RetryPolicy,
) -> AgentOpinion {
    let role = agent.role().to_string();
    let mut attempt = 0u32;
    loop {
        let error = match tokio::time::timeout(policy.timeout, agent.evaluate(ctx)).await {
            Ok(Ok(opinion)) => {
                if attempt > 0 {
                    debug!(%role, attempt, "agent recovered after retry");
                }
                return opinion;
            }
            Ok(Err(error)) => error,
            Err(_elapsed) => anyhow::Error::new(LlmError::Timeout(format!(
                "no opinion within {:?}",
                policy.timeout
            ))),
        };

        let transient = error
            .downcast_ref::<LlmError>()
            .is_some_and(LlmError::is_transient);
        if !transient || attempt >= policy.max_retries {
            warn!(%role, attempt, error = %error, "agent abstains");
            return AgentOpinion::abstain(role, format!("{error:#}"));
        }

        let delay = policy.backoff(attempt, &error);
        debug!(
            %role,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "retrying agent after transient failure"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Tallies opinions with the judge's reweight factors applied.
///
/// Stored opinions keep their produced weight and confidence; the
/// factors scale scores only at decision time.
#[must_use]
pub fn adjusted_tally(opinions: &[AgentOpinion], adjustments: &HashMap<String, f64>) -> VoteScores {
    let mut scores = VoteScores::default();
    for op in opinions {
        // Adjustment keys are lowercased at parse time, so the role
        // must be folded the same way here.
        let factor = adjustments
            .get(op.role.to_lowercase().as_str())
            .copied()
            .unwrap_or(1.0);
        scores.add(op.verdict, op.score() * factor);
    }
    scores
}
